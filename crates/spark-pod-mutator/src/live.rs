//! The working copy of the pod which is mutated.
//!
//! Every mutating method of [`LivePod`] changes the working copy and returns
//! the [`PatchOperation`] which performs the same change on the original
//! object. As long as all changes go through these methods, replaying the
//! returned operations against the original pod yields the working copy.

use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{
        Affinity, Container, ContainerPort, EnvFromSource, EnvVar, Lifecycle, Pod, PodDNSConfig,
        PodSecurityContext, PodSpec, ResourceRequirements, SecurityContext, Toleration, Volume,
        VolumeMount,
    },
    apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::OwnerReference},
};
use json_patch::jsonptr::{Pointer, PointerBuf};
use kube::ResourceExt;

use crate::{
    patch::{PatchOperation, PatchValue},
    pointer::{self, ArrayAppend},
};

/// Refers to a container in [`PodSpec::containers`] of a [`LivePod`] by
/// index.
///
/// Containers are only ever appended, so a reference stays valid for the
/// whole mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerRef(usize);

impl ContainerRef {
    pub fn index(&self) -> usize {
        self.0
    }

    fn path(&self, field: &str) -> PointerBuf {
        pointer::container_field(self.0, field)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LivePod {
    pod: Pod,
}

impl LivePod {
    pub fn new(pod: Pod) -> Self {
        Self { pod }
    }

    pub fn pod(&self) -> &Pod {
        &self.pod
    }

    pub fn into_pod(self) -> Pod {
        self.pod
    }

    pub fn name(&self) -> String {
        self.pod.name_any()
    }

    pub fn containers(&self) -> &[Container] {
        self.pod
            .spec
            .as_ref()
            .map(|spec| spec.containers.as_slice())
            .unwrap_or_default()
    }

    pub fn init_containers(&self) -> &[Container] {
        self.pod
            .spec
            .as_ref()
            .and_then(|spec| spec.init_containers.as_deref())
            .unwrap_or_default()
    }

    pub fn has_affinity(&self) -> bool {
        self.pod
            .spec
            .as_ref()
            .is_some_and(|spec| spec.affinity.is_some())
    }

    /// Returns the first container (in pod order) whose name is one of
    /// `names`.
    pub fn find_container(&self, names: &[&str]) -> Option<ContainerRef> {
        self.containers()
            .iter()
            .position(|container| names.contains(&container.name.as_str()))
            .map(ContainerRef)
    }

    pub fn container(&self, container: ContainerRef) -> &Container {
        &self.containers()[container.0]
    }

    /// Whether a container with the same name and image is already part of
    /// the pod.
    pub fn has_container(&self, container: &Container) -> bool {
        contains_same(self.containers(), container)
    }

    /// Whether an init container with the same name and image is already
    /// part of the pod.
    pub fn has_init_container(&self, container: &Container) -> bool {
        contains_same(self.init_containers(), container)
    }

    /// The first mount of the volume `volume_name` within the container,
    /// together with its index.
    pub fn find_volume_mount(
        &self,
        container: ContainerRef,
        volume_name: &str,
    ) -> Option<(usize, &VolumeMount)> {
        self.container(container)
            .volume_mounts
            .iter()
            .flatten()
            .enumerate()
            .find(|(_, mount)| mount.name == volume_name)
    }

    pub fn add_owner_reference(&mut self, owner_reference: OwnerReference) -> PatchOperation {
        append_opt(
            &mut self.pod.metadata.owner_references,
            pointer::OWNER_REFERENCES,
            owner_reference,
        )
    }

    pub fn add_volume(&mut self, volume: Volume) -> PatchOperation {
        append_opt(&mut self.spec_mut().volumes, pointer::VOLUMES, volume)
    }

    pub fn add_container(&mut self, container: Container) -> PatchOperation {
        append(
            &mut self.spec_mut().containers,
            pointer::CONTAINERS,
            container,
        )
    }

    pub fn add_init_container(&mut self, container: Container) -> PatchOperation {
        append_opt(
            &mut self.spec_mut().init_containers,
            pointer::INIT_CONTAINERS,
            container,
        )
    }

    pub fn add_toleration(&mut self, toleration: Toleration) -> PatchOperation {
        append_opt(
            &mut self.spec_mut().tolerations,
            pointer::TOLERATIONS,
            toleration,
        )
    }

    pub fn add_volume_mount(
        &mut self,
        container: ContainerRef,
        volume_mount: VolumeMount,
    ) -> PatchOperation {
        let path = container.path("volumeMounts");
        append_opt(
            &mut self.container_mut(container).volume_mounts,
            &path,
            volume_mount,
        )
    }

    /// Replaces the mount at `index` (see [`Self::find_volume_mount`]).
    pub fn replace_volume_mount(
        &mut self,
        container: ContainerRef,
        index: usize,
        volume_mount: VolumeMount,
    ) -> PatchOperation {
        let mut path = container.path("volumeMounts");
        path.push_back(index);
        let mounts = self
            .container_mut(container)
            .volume_mounts
            .get_or_insert_with(Vec::new);

        match mounts.get_mut(index) {
            Some(mount) => *mount = volume_mount.clone(),
            None => mounts.push(volume_mount.clone()),
        }

        PatchOperation::replace(path, volume_mount)
    }

    pub fn add_env_var(&mut self, container: ContainerRef, env_var: EnvVar) -> PatchOperation {
        let path = container.path("env");
        append_opt(&mut self.container_mut(container).env, &path, env_var)
    }

    pub fn add_env_from(
        &mut self,
        container: ContainerRef,
        env_from: EnvFromSource,
    ) -> PatchOperation {
        let path = container.path("envFrom");
        append_opt(&mut self.container_mut(container).env_from, &path, env_from)
    }

    pub fn add_container_port(
        &mut self,
        container: ContainerRef,
        port: ContainerPort,
    ) -> PatchOperation {
        let path = container.path("ports");
        append_opt(&mut self.container_mut(container).ports, &path, port)
    }

    /// Adds a single resource limit.
    ///
    /// Depending on what already exists, either the whole `resources`
    /// object, the whole `limits` map or only the entry is added.
    pub fn add_resource_limit(
        &mut self,
        container: ContainerRef,
        resource: &str,
        quantity: Quantity,
    ) -> PatchOperation {
        let resources_path = container.path("resources");
        let resources = &mut self.container_mut(container).resources;

        match resources {
            None => {
                let requirements = ResourceRequirements {
                    limits: Some(BTreeMap::from([(resource.to_owned(), quantity)])),
                    ..ResourceRequirements::default()
                };
                *resources = Some(requirements.clone());
                PatchOperation::add(resources_path, requirements)
            }
            Some(resources) => {
                let limits_path = resources_path.with_trailing_token("limits");
                let limits = resources.limits.get_or_insert_with(BTreeMap::new);

                if limits.is_empty() {
                    limits.insert(resource.to_owned(), quantity);
                    PatchOperation::add(limits_path, limits.clone())
                } else {
                    limits.insert(resource.to_owned(), quantity.clone());
                    PatchOperation::add(limits_path.with_trailing_token(resource), quantity)
                }
            }
        }
    }

    pub fn set_container_security_context(
        &mut self,
        container: ContainerRef,
        security_context: SecurityContext,
    ) -> PatchOperation {
        let path = container.path("securityContext");
        set(
            &mut self.container_mut(container).security_context,
            &path,
            security_context,
        )
    }

    pub fn set_container_lifecycle(
        &mut self,
        container: ContainerRef,
        lifecycle: Lifecycle,
    ) -> PatchOperation {
        let path = container.path("lifecycle");
        set(
            &mut self.container_mut(container).lifecycle,
            &path,
            lifecycle,
        )
    }

    pub fn set_host_network(&mut self, host_network: bool) -> PatchOperation {
        set(
            &mut self.spec_mut().host_network,
            pointer::HOST_NETWORK,
            host_network,
        )
    }

    pub fn set_dns_policy(&mut self, dns_policy: &str) -> PatchOperation {
        set(
            &mut self.spec_mut().dns_policy,
            pointer::DNS_POLICY,
            dns_policy.to_owned(),
        )
    }

    pub fn set_dns_config(&mut self, dns_config: PodDNSConfig) -> PatchOperation {
        set(
            &mut self.spec_mut().dns_config,
            pointer::DNS_CONFIG,
            dns_config,
        )
    }

    pub fn set_node_selector(&mut self, node_selector: BTreeMap<String, String>) -> PatchOperation {
        set(
            &mut self.spec_mut().node_selector,
            pointer::NODE_SELECTOR,
            node_selector,
        )
    }

    pub fn set_scheduler_name(&mut self, scheduler_name: &str) -> PatchOperation {
        set(
            &mut self.spec_mut().scheduler_name,
            pointer::SCHEDULER_NAME,
            scheduler_name.to_owned(),
        )
    }

    pub fn set_priority_class_name(&mut self, priority_class_name: &str) -> PatchOperation {
        set(
            &mut self.spec_mut().priority_class_name,
            pointer::PRIORITY_CLASS_NAME,
            priority_class_name.to_owned(),
        )
    }

    pub fn set_affinity(&mut self, affinity: Affinity) -> PatchOperation {
        set(&mut self.spec_mut().affinity, pointer::AFFINITY, affinity)
    }

    pub fn set_security_context(&mut self, security_context: PodSecurityContext) -> PatchOperation {
        set(
            &mut self.spec_mut().security_context,
            pointer::SECURITY_CONTEXT,
            security_context,
        )
    }

    pub fn set_termination_grace_period_seconds(&mut self, seconds: i64) -> PatchOperation {
        set(
            &mut self.spec_mut().termination_grace_period_seconds,
            pointer::TERMINATION_GRACE_PERIOD_SECONDS,
            seconds,
        )
    }

    fn spec_mut(&mut self) -> &mut PodSpec {
        self.pod.spec.get_or_insert_with(PodSpec::default)
    }

    fn container_mut(&mut self, container: ContainerRef) -> &mut Container {
        &mut self.spec_mut().containers[container.0]
    }
}

impl From<Pod> for LivePod {
    fn from(pod: Pod) -> Self {
        Self::new(pod)
    }
}

fn contains_same(containers: &[Container], container: &Container) -> bool {
    containers
        .iter()
        .any(|existing| existing.name == container.name && existing.image == container.image)
}

/// Appends `item` to `items` and returns the matching operation, see
/// [`pointer::array_append_path`].
fn append<T>(items: &mut Vec<T>, base_path: &Pointer, item: T) -> PatchOperation
where
    T: Clone + Into<PatchValue>,
{
    let operation = match pointer::array_append_path(base_path, items.is_empty()) {
        ArrayAppend::WholeArray(path) => PatchOperation::add(path, vec![item.clone()]),
        ArrayAppend::Element(path) => PatchOperation::add(path, item.clone()),
    };
    items.push(item);
    operation
}

fn append_opt<T>(items: &mut Option<Vec<T>>, base_path: &Pointer, item: T) -> PatchOperation
where
    T: Clone + Into<PatchValue>,
{
    append(items.get_or_insert_with(Vec::new), base_path, item)
}

/// Sets a field. JSON patch `add` replaces existing members, so this works
/// regardless of whether the field is already set.
fn set<T>(field: &mut Option<T>, path: &Pointer, value: T) -> PatchOperation
where
    T: Clone + Into<PatchValue>,
{
    *field = Some(value.clone());
    PatchOperation::add(path.to_buf(), value)
}
