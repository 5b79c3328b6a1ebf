use k8s_openapi::api::core::v1::ContainerPort;

use super::{Result, RuleContext, config_map_volume, read_only_mount};
use crate::{constants::CONFIG_MAP_VOLUME_NAME_SUFFIX, live::LivePod};

/// Mounts the Prometheus ConfigMap generated by the Spark operator and
/// exposes the port of the JMX exporter.
///
/// Nothing happens if no ConfigMap is generated, which is the case when both
/// the metrics properties and the Prometheus configuration are files inside
/// the image.
pub(crate) fn prometheus(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let application = context.spec().application();
    let Some(prometheus) = application.prometheus() else {
        return Ok(Vec::new());
    };

    if application.has_metrics_properties_file() && application.has_prometheus_config_file() {
        return Ok(Vec::new());
    }

    if !context.spec().expose_metrics() {
        return Ok(Vec::new());
    }

    let options = context.options();
    let config_map_name = application.prometheus_config_map_name();
    let volume_name = format!("{config_map_name}{CONFIG_MAP_VOLUME_NAME_SUFFIX}");

    let mut operations = vec![pod.add_volume(config_map_volume(&config_map_name, &volume_name))];

    let container = context.spark_container(pod)?;
    operations.push(pod.add_volume_mount(
        container,
        read_only_mount(
            &volume_name,
            options.prometheus_config_map_mount_path.as_str(),
            None,
        ),
    ));

    let port = ContainerPort {
        container_port: prometheus.port.unwrap_or(options.default_prometheus_port),
        protocol: Some(options.prometheus_port_protocol.clone()),
        name: prometheus.port_name.clone().filter(|name| !name.is_empty()),
        ..ContainerPort::default()
    };
    operations.push(pod.add_container_port(container, port));

    Ok(operations)
}

#[cfg(test)]
mod tests {
    use indoc::formatdoc;
    use rstest::rstest;

    use super::*;
    use crate::rules::test_utils::{application, driver_pod, executor_pod, paths, run};

    fn monitored_application(monitoring: &str) -> crate::crd::SparkApplication {
        application(&formatdoc! {"
            apiVersion: sparkoperator.k8s.io/v1beta2
            kind: SparkApplication
            metadata:
              name: spark-pi
            spec:
              monitoring: {monitoring}
        "})
    }

    #[test]
    fn expose_driver_metrics() {
        let application = monitored_application(
            "{exposeDriverMetrics: true, prometheus: {jmxExporterJar: /prometheus/jmx.jar}}",
        );

        let (operations, pod) = run(prometheus, &application, &driver_pod()).expect("rule applies");

        assert_eq!(
            paths(&operations),
            [
                "/spec/volumes",
                "/spec/containers/0/volumeMounts",
                "/spec/containers/0/ports",
            ]
        );

        let spec = pod.spec.expect("pod has a spec");
        let volume = &spec.volumes.expect("volume was added")[0];
        assert_eq!(volume.name, "spark-pi-prom-conf-vol");
        assert_eq!(
            volume.config_map.as_ref().map(|source| source.name.as_str()),
            Some("spark-pi-prom-conf")
        );

        let container = &spec.containers[0];
        assert_eq!(
            container.volume_mounts.as_ref().expect("mount was added")[0].mount_path,
            "/etc/metrics/conf"
        );
        let port = &container.ports.as_ref().expect("port was added")[0];
        assert_eq!(port.container_port, 8090);
        assert_eq!(port.protocol.as_deref(), Some("TCP"));
        assert_eq!(port.name, None);
    }

    #[test]
    fn configured_port() {
        let application = monitored_application(
            "{exposeExecutorMetrics: true, prometheus: {port: 9100, portName: jmx-exporter}}",
        );

        let (_, pod) = run(prometheus, &application, &executor_pod()).expect("rule applies");

        let container = &pod.spec.expect("pod has a spec").containers[0];
        let port = &container.ports.as_ref().expect("port was added")[0];
        assert_eq!(port.container_port, 9100);
        assert_eq!(port.name.as_deref(), Some("jmx-exporter"));
    }

    #[rstest]
    #[case::monitoring_disabled("{exposeDriverMetrics: true}")]
    #[case::metrics_not_exposed("{exposeExecutorMetrics: true, prometheus: {}}")]
    #[case::config_files_in_image(
        "{exposeDriverMetrics: true, metricsPropertiesFile: /m.properties, \
          prometheus: {configFile: /p.yaml}}"
    )]
    fn skipped(#[case] monitoring: &str) {
        let (operations, _) = run(prometheus, &monitored_application(monitoring), &driver_pod())
            .expect("rule applies");

        assert!(operations.is_empty());
    }

    #[test]
    fn only_one_config_file_in_image() {
        let application = monitored_application(
            "{exposeDriverMetrics: true, prometheus: {configFile: /p.yaml}}",
        );

        let (operations, _) = run(prometheus, &application, &driver_pod()).expect("rule applies");
        assert_eq!(operations.len(), 3);
    }
}
