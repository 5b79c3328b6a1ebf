//! The [RFC 6902][rfc6902] patch operations produced by the mutation rules.
//!
//! Operations carry a typed [`PatchValue`] instead of raw JSON. The value is
//! only turned into JSON when the operations are converted into a
//! [`json_patch::Patch`].
//!
//! [rfc6902]: https://datatracker.ietf.org/doc/html/rfc6902

use std::collections::BTreeMap;

use json_patch::{
    AddOperation, ReplaceOperation,
    jsonptr::{Pointer, PointerBuf},
};
use k8s_openapi::{
    api::core::v1::{
        Affinity, Container, ContainerPort, EnvFromSource, EnvVar, Lifecycle, PodDNSConfig,
        PodSecurityContext, ResourceRequirements, SecurityContext, Toleration, Volume,
        VolumeMount,
    },
    apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::OwnerReference},
};
use serde::Serialize;
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to serialize the value to add at {path}"))]
    SerializeValue {
        source: serde_json::Error,
        path: PointerBuf,
    },
}

/// The kind of a [`PatchOperation`]. Only the two kinds the mutation rules
/// need are supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
}

/// A single patch operation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatchOperation {
    op: PatchOp,
    path: PointerBuf,
    value: PatchValue,
}

impl PatchOperation {
    pub fn add(path: PointerBuf, value: impl Into<PatchValue>) -> Self {
        Self {
            op: PatchOp::Add,
            path,
            value: value.into(),
        }
    }

    pub fn replace(path: PointerBuf, value: impl Into<PatchValue>) -> Self {
        Self {
            op: PatchOp::Replace,
            path,
            value: value.into(),
        }
    }

    pub fn op(&self) -> PatchOp {
        self.op
    }

    pub fn path(&self) -> &Pointer {
        &self.path
    }

    pub fn value(&self) -> &PatchValue {
        &self.value
    }

    pub fn to_json_patch_operation(&self) -> Result<json_patch::PatchOperation, Error> {
        let path = self.path.clone();
        let value = serde_json::to_value(&self.value)
            .with_context(|_| SerializeValueSnafu { path: path.clone() })?;

        Ok(match self.op {
            PatchOp::Add => json_patch::PatchOperation::Add(AddOperation { path, value }),
            PatchOp::Replace => {
                json_patch::PatchOperation::Replace(ReplaceOperation { path, value })
            }
        })
    }
}

/// The value of a [`PatchOperation`].
///
/// Scalars, maps and lists are modelled directly, Kubernetes objects are
/// carried as their `k8s-openapi` types. Lists of objects are a [`PatchValue::List`]
/// of the respective object variant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatchValue {
    Bool(bool),
    Integer(i64),
    String(String),
    StringMap(BTreeMap<String, String>),
    Quantity(Quantity),
    ResourceList(BTreeMap<String, Quantity>),
    List(Vec<PatchValue>),

    Affinity(Box<Affinity>),
    Container(Box<Container>),
    ContainerPort(ContainerPort),
    EnvFromSource(EnvFromSource),
    EnvVar(EnvVar),
    Lifecycle(Box<Lifecycle>),
    OwnerReference(OwnerReference),
    PodDnsConfig(PodDNSConfig),
    PodSecurityContext(Box<PodSecurityContext>),
    ResourceRequirements(ResourceRequirements),
    SecurityContext(Box<SecurityContext>),
    Toleration(Toleration),
    Volume(Box<Volume>),
    VolumeMount(VolumeMount),
}

impl PatchValue {
    /// Returns the number of elements if this is a [`PatchValue::List`].
    pub fn list_len(&self) -> Option<usize> {
        match self {
            Self::List(items) => Some(items.len()),
            _ => None,
        }
    }
}

macro_rules! patch_value_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for PatchValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

macro_rules! patch_value_from_boxed {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for PatchValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(Box::new(value))
                }
            }
        )+
    };
}

patch_value_from!(
    Bool(bool),
    Integer(i64),
    String(String),
    StringMap(BTreeMap<String, String>),
    Quantity(Quantity),
    ResourceList(BTreeMap<String, Quantity>),
    ContainerPort(ContainerPort),
    EnvFromSource(EnvFromSource),
    EnvVar(EnvVar),
    OwnerReference(OwnerReference),
    PodDnsConfig(PodDNSConfig),
    ResourceRequirements(ResourceRequirements),
    Toleration(Toleration),
    VolumeMount(VolumeMount),
);

patch_value_from_boxed!(
    Affinity(Affinity),
    Container(Container),
    Lifecycle(Lifecycle),
    PodSecurityContext(PodSecurityContext),
    SecurityContext(SecurityContext),
    Volume(Volume),
);

impl From<&str> for PatchValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl<T> From<Vec<T>> for PatchValue
where
    T: Into<PatchValue>,
{
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Converts the operations into a [`json_patch::Patch`], e.g. to be embedded
/// into an admission response.
pub fn to_json_patch(operations: &[PatchOperation]) -> Result<json_patch::Patch, Error> {
    operations
        .iter()
        .map(PatchOperation::to_json_patch_operation)
        .collect::<Result<_, _>>()
        .map(json_patch::Patch)
}
