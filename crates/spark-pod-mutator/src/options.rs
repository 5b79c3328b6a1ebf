use clap::Args;

use crate::constants::{
    DEFAULT_HADOOP_CONF_DIR, DEFAULT_PROMETHEUS_CONFIG_MAP_MOUNT_PATH,
    DEFAULT_PROMETHEUS_JAVA_AGENT_PORT, DEFAULT_PROMETHEUS_PORT_PROTOCOL, DEFAULT_SPARK_CONF_DIR,
    DEFAULT_SPARK_CONF_MOUNT_DIR,
};

/// Paths and defaults the mutation rules use, which depend on how the Spark
/// images are built.
///
/// The [`Default`] implementation matches the default values of the CLI
/// arguments.
#[derive(Clone, Debug, PartialEq, Eq, Args)]
#[command(next_help_heading = "Mutation Options")]
pub struct MutationOptions {
    /// The directory the `SPARK_CONF_DIR` environment variable points to when
    /// a Spark ConfigMap is used.
    #[arg(
        long,
        env = "SPARK_POD_MUTATOR_SPARK_CONF_DIR",
        default_value = DEFAULT_SPARK_CONF_DIR
    )]
    pub spark_conf_dir: String,

    /// The directory every key of the Spark ConfigMap is mounted into.
    #[arg(
        long,
        env = "SPARK_POD_MUTATOR_SPARK_CONF_MOUNT_DIR",
        default_value = DEFAULT_SPARK_CONF_MOUNT_DIR
    )]
    pub spark_conf_mount_dir: String,

    /// The directory the Hadoop ConfigMap is mounted at. `HADOOP_CONF_DIR`
    /// points to it.
    #[arg(
        long,
        env = "SPARK_POD_MUTATOR_HADOOP_CONF_DIR",
        default_value = DEFAULT_HADOOP_CONF_DIR
    )]
    pub hadoop_conf_dir: String,

    /// The directory the generated Prometheus ConfigMap is mounted at.
    #[arg(
        long,
        env = "SPARK_POD_MUTATOR_PROMETHEUS_CONFIG_MAP_MOUNT_PATH",
        default_value = DEFAULT_PROMETHEUS_CONFIG_MAP_MOUNT_PATH
    )]
    pub prometheus_config_map_mount_path: String,

    /// The port the metrics are exposed on, unless the SparkApplication sets
    /// one.
    #[arg(
        long,
        env = "SPARK_POD_MUTATOR_DEFAULT_PROMETHEUS_PORT",
        default_value_t = DEFAULT_PROMETHEUS_JAVA_AGENT_PORT
    )]
    pub default_prometheus_port: i32,

    /// The protocol of the metrics container port.
    #[arg(
        long,
        env = "SPARK_POD_MUTATOR_PROMETHEUS_PORT_PROTOCOL",
        default_value = DEFAULT_PROMETHEUS_PORT_PROTOCOL
    )]
    pub prometheus_port_protocol: String,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            spark_conf_dir: DEFAULT_SPARK_CONF_DIR.to_owned(),
            spark_conf_mount_dir: DEFAULT_SPARK_CONF_MOUNT_DIR.to_owned(),
            hadoop_conf_dir: DEFAULT_HADOOP_CONF_DIR.to_owned(),
            prometheus_config_map_mount_path: DEFAULT_PROMETHEUS_CONFIG_MAP_MOUNT_PATH.to_owned(),
            default_prometheus_port: DEFAULT_PROMETHEUS_JAVA_AGENT_PORT,
            prometheus_port_protocol: DEFAULT_PROMETHEUS_PORT_PROTOCOL.to_owned(),
        }
    }
}
