//! Well-known names shared between the Spark operator, Spark itself and the
//! mutation rules.

use const_format::concatcp;

/// The namespace objects without an explicit namespace live in.
pub const DEFAULT_NAMESPACE: &str = "default";

/// The label Spark puts on every pod it creates to mark the pod's role.
pub const SPARK_ROLE_LABEL: &str = "spark-role";

/// The [`SPARK_ROLE_LABEL`] value of driver pods.
pub const SPARK_DRIVER_ROLE: &str = "driver";

/// The [`SPARK_ROLE_LABEL`] value of executor pods.
pub const SPARK_EXECUTOR_ROLE: &str = "executor";

/// Name of the main container in driver pods.
pub const SPARK_DRIVER_CONTAINER_NAME: &str = "spark-kubernetes-driver";

/// Name of the main container in executor pods (Spark 2.x).
pub const SPARK_EXECUTOR_CONTAINER_NAME: &str = "executor";

/// Name of the main container in executor pods starting with Spark 3.0.
pub const SPARK3_DEFAULT_EXECUTOR_CONTAINER_NAME: &str = "spark-kubernetes-executor";

/// Volumes with this prefix are scratch space managed by Spark itself.
pub const SPARK_LOCAL_DIR_VOLUME_PREFIX: &str = "spark-local-dir-";

/// The volume Spark creates to ship its own generated configuration.
pub const SPARK_CONF_VOLUME_NAME: &str = "spark-conf-volume";

/// The file Spark expects its generated properties in.
pub const SPARK_PROPERTIES_FILE: &str = "spark.properties";

/// Appended to the mount path of the [`SPARK_CONF_VOLUME_NAME`] volume when
/// only [`SPARK_PROPERTIES_FILE`] is mounted from it.
pub const SPARK_PROPERTIES_MOUNT_SUFFIX: &str = concatcp!("/", SPARK_PROPERTIES_FILE);

pub const SPARK_CONFIG_MAP_VOLUME_NAME: &str = "spark-configmap-volume";
pub const HADOOP_CONFIG_MAP_VOLUME_NAME: &str = "hadoop-configmap-volume";

pub const SPARK_CONF_DIR_ENV_VAR: &str = "SPARK_CONF_DIR";
pub const HADOOP_CONF_DIR_ENV_VAR: &str = "HADOOP_CONF_DIR";

pub const DEFAULT_SPARK_CONF_DIR: &str = "/etc/spark/conf";
pub const DEFAULT_SPARK_CONF_MOUNT_DIR: &str = "/opt/spark/conf";
pub const DEFAULT_HADOOP_CONF_DIR: &str = "/etc/hadoop/conf";

/// Suffix appended to the application name to derive the name of the
/// generated Prometheus ConfigMap.
pub const PROMETHEUS_CONFIG_MAP_NAME_SUFFIX: &str = "prom-conf";
pub const DEFAULT_PROMETHEUS_CONFIG_MAP_MOUNT_PATH: &str = "/etc/metrics/conf";
pub const DEFAULT_PROMETHEUS_JAVA_AGENT_PORT: i32 = 8090;
pub const DEFAULT_PROMETHEUS_PORT_PROTOCOL: &str = "TCP";

/// Suffix appended to a ConfigMap name to derive the volume name it is
/// mounted through.
pub const CONFIG_MAP_VOLUME_NAME_SUFFIX: &str = "-vol";

/// The maximum length of a volume name (a DNS-1123 label).
pub const MAX_VOLUME_NAME_LENGTH: usize = 63;

/// DNS policy pods running in the host network need to keep resolving
/// cluster-internal names.
pub const DNS_CLUSTER_FIRST_WITH_HOST_NET: &str = "ClusterFirstWithHostNet";
