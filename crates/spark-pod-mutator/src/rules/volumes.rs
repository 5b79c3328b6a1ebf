use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::EnvVar;
use kube::ResourceExt;

use super::{Result, RuleContext, config_map_volume, read_only_mount};
use crate::{
    config_map::ConfigMapReader,
    constants::{
        CONFIG_MAP_VOLUME_NAME_SUFFIX, DEFAULT_NAMESPACE, HADOOP_CONF_DIR_ENV_VAR,
        HADOOP_CONFIG_MAP_VOLUME_NAME, MAX_VOLUME_NAME_LENGTH, SPARK_CONF_DIR_ENV_VAR,
        SPARK_CONF_VOLUME_NAME, SPARK_CONFIG_MAP_VOLUME_NAME, SPARK_LOCAL_DIR_VOLUME_PREFIX,
        SPARK_PROPERTIES_FILE, SPARK_PROPERTIES_MOUNT_SUFFIX,
    },
    live::LivePod,
};

/// Adds the application volumes the role mounts, together with the mounts.
///
/// Local dir volumes are skipped, Spark creates them itself. Mounts of
/// undeclared volumes are ignored.
pub(crate) fn volumes(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let declared = &context.spec().application().spec.volumes;
    let mut added = BTreeSet::new();
    let mut operations = Vec::new();

    for mount in &context.spec().volume_mounts {
        if mount.name.starts_with(SPARK_LOCAL_DIR_VOLUME_PREFIX) {
            continue;
        }

        let Some(volume) = declared.iter().find(|volume| volume.name == mount.name) else {
            continue;
        };

        if added.insert(volume.name.as_str()) {
            operations.push(pod.add_volume(volume.clone()));
        }

        let container = context.spark_container(pod)?;
        operations.push(pod.add_volume_mount(container, mount.clone()));
    }

    Ok(operations)
}

/// Mounts every ConfigMap listed in `configMaps` read-only at its path.
pub(crate) fn general_config_maps(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let mut operations = Vec::new();

    for config_map in &context.spec().config_maps {
        let volume_name = config_map_volume_name(&config_map.name);

        operations.push(pod.add_volume(config_map_volume(&config_map.name, &volume_name)));

        let container = context.spark_container(pod)?;
        operations.push(pod.add_volume_mount(
            container,
            read_only_mount(&volume_name, config_map.path.as_str(), None),
        ));
    }

    Ok(operations)
}

/// Mounts the Spark ConfigMap of the application.
///
/// Spark mounts its generated configuration as `spark-conf-volume`. That
/// mount is narrowed down to the `spark.properties` file, so every key of the
/// Spark ConfigMap can be mounted as an individual file next to it. If the
/// ConfigMap cannot be read, the keys are not mounted but the rest of the
/// mutation still happens.
pub(crate) async fn spark_config_map<R>(
    context: &RuleContext<'_>,
    pod: &mut LivePod,
    reader: &R,
) -> Result
where
    R: ConfigMapReader + ?Sized,
{
    let application = context.spec().application();
    let Some(config_map_name) = application.spec.spark_config_map.as_deref() else {
        return Ok(Vec::new());
    };

    let container = context.spark_container(pod)?;
    let mut operations = Vec::new();

    if let Some((index, mount)) = pod.find_volume_mount(container, SPARK_CONF_VOLUME_NAME) {
        let mut mount = mount.clone();
        mount.mount_path.push_str(SPARK_PROPERTIES_MOUNT_SUFFIX);
        mount.sub_path = Some(SPARK_PROPERTIES_FILE.to_owned());

        tracing::debug!(
            mount_path = %mount.mount_path,
            index,
            "narrowing Spark conf mount down to the properties file"
        );
        operations.push(pod.replace_volume_mount(container, index, mount));
    }

    operations.push(pod.add_volume(config_map_volume(
        config_map_name,
        SPARK_CONFIG_MAP_VOLUME_NAME,
    )));

    // Pods are created in the namespace of their application, both may
    // come without one when rendered from files.
    let namespace = application
        .namespace()
        .or_else(|| pod.pod().namespace())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
    match reader.get(&namespace, config_map_name).await {
        Ok(data) => {
            for key in data.keys() {
                let mount_path = format!("{}/{key}", context.options().spark_conf_mount_dir);
                operations.push(pod.add_volume_mount(
                    container,
                    read_only_mount(SPARK_CONFIG_MAP_VOLUME_NAME, mount_path, Some(key.as_str())),
                ));
            }
        }
        Err(error) => tracing::warn!(
            error = &error as &dyn std::error::Error,
            config_map = config_map_name,
            %namespace,
            "failed to read the Spark ConfigMap, not mounting its keys"
        ),
    }

    operations.push(pod.add_env_var(
        container,
        env_var(SPARK_CONF_DIR_ENV_VAR, &context.options().spark_conf_dir),
    ));

    Ok(operations)
}

/// Mounts the Hadoop ConfigMap of the application and points
/// `HADOOP_CONF_DIR` to it.
pub(crate) fn hadoop_config_map(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let Some(config_map_name) = context
        .spec()
        .application()
        .spec
        .hadoop_config_map
        .as_deref()
    else {
        return Ok(Vec::new());
    };

    let hadoop_conf_dir = &context.options().hadoop_conf_dir;
    let mut operations = vec![pod.add_volume(config_map_volume(
        config_map_name,
        HADOOP_CONFIG_MAP_VOLUME_NAME,
    ))];

    let container = context.spark_container(pod)?;
    operations.push(pod.add_volume_mount(
        container,
        read_only_mount(HADOOP_CONFIG_MAP_VOLUME_NAME, hadoop_conf_dir.as_str(), None),
    ));
    operations.push(pod.add_env_var(
        container,
        env_var(HADOOP_CONF_DIR_ENV_VAR, hadoop_conf_dir),
    ));

    Ok(operations)
}

/// The name of the volume a ConfigMap is mounted through, which has to be a
/// valid DNS label.
fn config_map_volume_name(config_map_name: &str) -> String {
    let mut volume_name = format!("{config_map_name}{CONFIG_MAP_VOLUME_NAME_SUFFIX}");

    if volume_name.len() > MAX_VOLUME_NAME_LENGTH {
        let mut end = MAX_VOLUME_NAME_LENGTH;
        while !volume_name.is_char_boundary(end) {
            end -= 1;
        }
        volume_name.truncate(end);

        tracing::debug!(
            %volume_name,
            max_length = MAX_VOLUME_NAME_LENGTH,
            "truncated ConfigMap volume name"
        );
    }

    volume_name
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: Some(value.to_owned()),
        ..EnvVar::default()
    }
}
