//! The parts of the SparkApplication custom resource the mutation rules read.
//!
//! Only the fields which cannot be expressed through the pod template Spark
//! itself generates are modelled here. The resource is never validated by
//! this crate.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, Container, EnvFromSource, EnvVar, Lifecycle, PodDNSConfig, PodSecurityContext,
    SecurityContext, Toleration, Volume, VolumeMount,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{constants::PROMETHEUS_CONFIG_MAP_NAME_SUFFIX, role::SparkRole};

/// A Spark application, run by the Spark operator through `spark-submit`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[kube(
    group = "sparkoperator.k8s.io",
    version = "v1beta2",
    kind = "SparkApplication",
    plural = "sparkapplications",
    shortname = "sparkapp",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SparkApplicationSpec {
    /// Volumes which can be mounted by the driver and executors through
    /// their `volumeMounts`.
    #[serde(default)]
    pub volumes: Vec<Volume>,

    #[serde(default)]
    pub driver: DriverSpec,

    #[serde(default)]
    pub executor: ExecutorSpec,

    /// Name of a ConfigMap carrying additional Spark configuration files.
    /// Every key is mounted as an individual file into the Spark conf
    /// directory.
    pub spark_config_map: Option<String>,

    /// Name of a ConfigMap carrying Hadoop configuration files.
    pub hadoop_config_map: Option<String>,

    /// Cluster-wide batch scheduler, takes precedence over the role specific
    /// `schedulerName`.
    pub batch_scheduler: Option<String>,

    pub batch_scheduler_options: Option<BatchSchedulerConfiguration>,

    pub monitoring: Option<MonitoringSpec>,
}

/// Settings shared by the driver and the executors.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SparkPodSpec {
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,

    #[serde(default)]
    pub env: Vec<EnvVar>,

    #[serde(default)]
    pub env_from: Vec<EnvFromSource>,

    /// ConfigMaps mounted as a whole at the given path.
    #[serde(default)]
    pub config_maps: Vec<NamePath>,

    pub affinity: Option<Affinity>,

    #[serde(default)]
    pub tolerations: Vec<Toleration>,

    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,

    pub dns_config: Option<PodDNSConfig>,

    pub scheduler_name: Option<String>,

    pub pod_security_context: Option<PodSecurityContext>,

    /// Security context of the main Spark container.
    pub security_context: Option<SecurityContext>,

    #[serde(default)]
    pub sidecars: Vec<Container>,

    #[serde(default)]
    pub init_containers: Vec<Container>,

    pub gpu: Option<GpuSpec>,

    pub host_network: Option<bool>,

    pub termination_grace_period_seconds: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSpec {
    #[serde(flatten)]
    pub pod: SparkPodSpec,

    /// Lifecycle hooks of the driver container.
    pub lifecycle: Option<Lifecycle>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorSpec {
    #[serde(flatten)]
    pub pod: SparkPodSpec,
}

/// A ConfigMap and the path it is mounted at.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamePath {
    pub name: String,
    pub path: String,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuSpec {
    /// The resource name of the GPU, e.g. `nvidia.com/gpu`.
    #[serde(default)]
    pub name: String,

    /// The number of GPUs to request.
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSchedulerConfiguration {
    pub queue: Option<String>,
    pub priority_class_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSpec {
    #[serde(default)]
    pub expose_driver_metrics: bool,

    #[serde(default)]
    pub expose_executor_metrics: bool,

    /// Content of a `metrics.properties` file, put into the generated
    /// ConfigMap.
    pub metrics_properties: Option<String>,

    /// Path to a `metrics.properties` file baked into the image.
    pub metrics_properties_file: Option<String>,

    pub prometheus: Option<PrometheusSpec>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusSpec {
    #[serde(default)]
    pub jmx_exporter_jar: String,

    /// Port the JMX exporter listens on. Defaults to 8090.
    pub port: Option<i32>,

    /// Name of the container port the metrics are exposed through.
    pub port_name: Option<String>,

    /// Path to a Prometheus configuration file baked into the image.
    pub config_file: Option<String>,

    /// Content of the Prometheus configuration, put into the generated
    /// ConfigMap.
    pub configuration: Option<String>,
}

impl SparkApplication {
    /// Selects the settings of the given role.
    pub fn pod_spec(&self, role: SparkRole) -> &SparkPodSpec {
        match role {
            SparkRole::Driver => &self.spec.driver.pod,
            SparkRole::Executor => &self.spec.executor.pod,
        }
    }

    pub fn prometheus_monitoring_enabled(&self) -> bool {
        self.prometheus().is_some()
    }

    pub fn has_prometheus_config_file(&self) -> bool {
        self.prometheus()
            .and_then(|prometheus| prometheus.config_file.as_deref())
            .is_some_and(|file| !file.is_empty())
    }

    pub fn has_metrics_properties_file(&self) -> bool {
        self.prometheus_monitoring_enabled()
            && self
                .spec
                .monitoring
                .as_ref()
                .and_then(|monitoring| monitoring.metrics_properties_file.as_deref())
                .is_some_and(|file| !file.is_empty())
    }

    pub fn expose_driver_metrics(&self) -> bool {
        self.spec
            .monitoring
            .as_ref()
            .is_some_and(|monitoring| monitoring.expose_driver_metrics)
    }

    pub fn expose_executor_metrics(&self) -> bool {
        self.spec
            .monitoring
            .as_ref()
            .is_some_and(|monitoring| monitoring.expose_executor_metrics)
    }

    pub fn expose_metrics(&self, role: SparkRole) -> bool {
        match role {
            SparkRole::Driver => self.expose_driver_metrics(),
            SparkRole::Executor => self.expose_executor_metrics(),
        }
    }

    /// The name of the ConfigMap the Spark operator generates to hold the
    /// Prometheus configuration.
    pub fn prometheus_config_map_name(&self) -> String {
        format!(
            "{name}-{PROMETHEUS_CONFIG_MAP_NAME_SUFFIX}",
            name = self.metadata.name.as_deref().unwrap_or_default()
        )
    }

    pub fn prometheus(&self) -> Option<&PrometheusSpec> {
        self.spec
            .monitoring
            .as_ref()
            .and_then(|monitoring| monitoring.prometheus.as_ref())
    }
}
