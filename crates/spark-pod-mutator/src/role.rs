//! Classifies pods into Spark roles and resolves the role specific settings
//! of a [`SparkApplication`].

use std::ops::Deref;

use k8s_openapi::api::core::v1::{Lifecycle, Pod};
use kube::ResourceExt;

use crate::{
    constants::{
        SPARK3_DEFAULT_EXECUTOR_CONTAINER_NAME, SPARK_DRIVER_CONTAINER_NAME, SPARK_DRIVER_ROLE,
        SPARK_EXECUTOR_CONTAINER_NAME, SPARK_EXECUTOR_ROLE, SPARK_ROLE_LABEL,
    },
    crd::{SparkApplication, SparkPodSpec},
};

/// The role a pod plays within a Spark application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SparkRole {
    Driver,
    Executor,
}

impl SparkRole {
    /// Determines the role from the `spark-role` label. Returns [`None`] for
    /// pods which are not part of a Spark application.
    pub fn from_pod(pod: &Pod) -> Option<Self> {
        match pod.labels().get(SPARK_ROLE_LABEL).map(String::as_str) {
            Some(SPARK_DRIVER_ROLE) => Some(Self::Driver),
            Some(SPARK_EXECUTOR_ROLE) => Some(Self::Executor),
            _ => None,
        }
    }

    /// The names the main Spark container of this role can have, in the
    /// order they are looked up.
    ///
    /// Spark 3 renamed the executor container, so both names are accepted.
    pub fn container_names(&self) -> &'static [&'static str] {
        match self {
            Self::Driver => &[SPARK_DRIVER_CONTAINER_NAME],
            Self::Executor => &[
                SPARK_EXECUTOR_CONTAINER_NAME,
                SPARK3_DEFAULT_EXECUTOR_CONTAINER_NAME,
            ],
        }
    }
}

/// The settings of a [`SparkApplication`] that apply to a single role.
///
/// Dereferences to the [`SparkPodSpec`] of the role, the accessors resolve
/// settings which combine role specific and application wide fields.
#[derive(Clone, Copy, Debug)]
pub struct RoleSpec<'a> {
    role: SparkRole,
    application: &'a SparkApplication,
    pod: &'a SparkPodSpec,
}

impl<'a> RoleSpec<'a> {
    pub fn new(application: &'a SparkApplication, role: SparkRole) -> Self {
        Self {
            role,
            application,
            pod: application.pod_spec(role),
        }
    }

    pub fn role(&self) -> SparkRole {
        self.role
    }

    pub fn application(&self) -> &'a SparkApplication {
        self.application
    }

    /// Lifecycle hooks are only supported for the driver.
    pub fn lifecycle(&self) -> Option<&'a Lifecycle> {
        match self.role {
            SparkRole::Driver => self.application.spec.driver.lifecycle.as_ref(),
            SparkRole::Executor => None,
        }
    }

    /// The batch scheduler of the application takes precedence over the
    /// scheduler name of the role. Empty names count as unset.
    pub fn scheduler_name(&self) -> Option<&'a str> {
        non_empty(self.application.spec.batch_scheduler.as_deref())
            .or_else(|| non_empty(self.pod.scheduler_name.as_deref()))
    }

    pub fn priority_class_name(&self) -> Option<&'a str> {
        non_empty(
            self.application
                .spec
                .batch_scheduler_options
                .as_ref()
                .and_then(|options| options.priority_class_name.as_deref()),
        )
    }

    pub fn expose_metrics(&self) -> bool {
        self.application.expose_metrics(self.role)
    }
}

impl Deref for RoleSpec<'_> {
    type Target = SparkPodSpec;

    fn deref(&self) -> &Self::Target {
        self.pod
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
