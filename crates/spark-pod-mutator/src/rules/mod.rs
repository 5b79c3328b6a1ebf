//! The mutation rules.
//!
//! Every rule owns one concern of the pod. It reads the role specific
//! settings from the [`RuleContext`], mutates the [`LivePod`] and returns the
//! operations that perform the same mutation on the original pod. A rule
//! which returns an error is rolled back by the
//! [`PatchSynthesizer`](crate::PatchSynthesizer), so rules can bail out in
//! the middle of a multi step mutation.

use k8s_openapi::api::core::v1::{ConfigMapVolumeSource, Volume, VolumeMount};
use snafu::{OptionExt, Snafu};

use crate::{
    live::{ContainerRef, LivePod},
    options::MutationOptions,
    patch::PatchOperation,
    role::{RoleSpec, SparkRole},
};

mod containers;
mod metadata;
mod monitoring;
mod pod;
mod scheduling;
mod volumes;

pub(crate) use containers::{
    container_security_context, env_from, env_vars, gpu, init_containers, lifecycle, sidecars,
};
pub(crate) use metadata::owner_reference;
pub(crate) use monitoring::prometheus;
pub(crate) use pod::{dns_config, host_network, pod_security_context, termination_grace_period};
pub(crate) use scheduling::{
    affinity, node_selector, priority_class_name, scheduler_name, tolerations,
};
pub(crate) use volumes::{general_config_maps, hadoop_config_map, spark_config_map, volumes};

pub type Result<T = Vec<PatchOperation>, E = RuleError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum RuleError {
    #[snafu(display("the Spark {role} container was not found in pod {pod:?}"))]
    ContainerNotFound { role: SparkRole, pod: String },

    #[snafu(display(
        "failed to build an owner reference for SparkApplication {application:?}, \
         it has no name or uid"
    ))]
    OwnerReference { application: String },
}

/// Everything a rule needs to know besides the pod itself.
#[derive(Clone, Copy, Debug)]
pub struct RuleContext<'a> {
    spec: RoleSpec<'a>,
    options: &'a MutationOptions,
}

impl<'a> RuleContext<'a> {
    pub fn new(spec: RoleSpec<'a>, options: &'a MutationOptions) -> Self {
        Self { spec, options }
    }

    pub fn spec(&self) -> &RoleSpec<'a> {
        &self.spec
    }

    pub fn role(&self) -> SparkRole {
        self.spec.role()
    }

    pub fn options(&self) -> &'a MutationOptions {
        self.options
    }

    /// Resolves the main Spark container of the role.
    pub fn spark_container(&self, pod: &LivePod) -> Result<ContainerRef> {
        pod.find_container(self.role().container_names())
            .with_context(|| ContainerNotFoundSnafu {
                role: self.role(),
                pod: pod.name(),
            })
    }
}

/// A volume backed by the ConfigMap `config_map`.
pub(crate) fn config_map_volume(config_map: &str, volume_name: &str) -> Volume {
    Volume {
        name: volume_name.to_owned(),
        config_map: Some(ConfigMapVolumeSource {
            name: config_map.to_owned(),
            ..ConfigMapVolumeSource::default()
        }),
        ..Volume::default()
    }
}

pub(crate) fn read_only_mount(
    volume_name: &str,
    mount_path: impl Into<String>,
    sub_path: Option<&str>,
) -> VolumeMount {
    VolumeMount {
        name: volume_name.to_owned(),
        mount_path: mount_path.into(),
        read_only: Some(true),
        sub_path: sub_path.map(ToOwned::to_owned),
        ..VolumeMount::default()
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use k8s_openapi::api::core::v1::Pod;

    use super::*;
    use crate::{crd::SparkApplication, patch};

    pub fn pod(yaml: &str) -> Pod {
        serde_yaml::from_str(yaml).expect("test pod is valid YAML")
    }

    pub fn application(yaml: &str) -> SparkApplication {
        serde_yaml::from_str(yaml).expect("test SparkApplication is valid YAML")
    }

    /// A driver pod as generated by Spark, with a single driver container.
    pub fn driver_pod() -> Pod {
        pod(indoc::indoc! {"
            apiVersion: v1
            kind: Pod
            metadata:
              name: spark-pi-driver
              namespace: default
              labels:
                spark-role: driver
            spec:
              containers:
                - name: spark-kubernetes-driver
                  image: spark:3.5.0
        "})
    }

    /// An executor pod with the Spark 3 container name.
    pub fn executor_pod() -> Pod {
        pod(indoc::indoc! {"
            apiVersion: v1
            kind: Pod
            metadata:
              name: spark-pi-exec-1
              namespace: default
              labels:
                spark-role: executor
            spec:
              containers:
                - name: spark-kubernetes-executor
                  image: spark:3.5.0
        "})
    }

    /// Runs a rule and asserts that replaying its operations against the
    /// original pod reproduces the mutated pod.
    pub fn run(
        rule: impl FnOnce(&RuleContext<'_>, &mut LivePod) -> Result,
        application: &SparkApplication,
        pod: &Pod,
    ) -> Result<(Vec<PatchOperation>, Pod)> {
        let role = SparkRole::from_pod(pod).expect("test pod has a Spark role");
        let options = MutationOptions::default();
        let context = RuleContext::new(RoleSpec::new(application, role), &options);

        let mut live = LivePod::new(pod.clone());
        let operations = rule(&context, &mut live)?;
        assert_replays(pod, &operations, live.pod());

        Ok((operations, live.into_pod()))
    }

    pub fn assert_replays(original: &Pod, operations: &[PatchOperation], expected: &Pod) {
        let mut document = serde_json::to_value(original).expect("pod serializes");
        let json_patch =
            patch::to_json_patch(operations).expect("operations are a valid JSON patch");
        json_patch::patch(&mut document, &json_patch).expect("operations apply to the pod");

        assert_eq!(
            document,
            serde_json::to_value(expected).expect("pod serializes")
        );
    }

    pub fn paths(operations: &[PatchOperation]) -> Vec<&str> {
        operations
            .iter()
            .map(|operation| operation.path().as_str())
            .collect()
    }
}
