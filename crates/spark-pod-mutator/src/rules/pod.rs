use super::{Result, RuleContext};
use crate::{constants::DNS_CLUSTER_FIRST_WITH_HOST_NET, live::LivePod};

/// Pods on the host network need the `ClusterFirstWithHostNet` DNS policy to
/// still resolve cluster services, so both are always set together.
pub(crate) fn host_network(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    if context.spec().host_network != Some(true) {
        return Ok(Vec::new());
    }

    Ok(vec![
        pod.set_host_network(true),
        pod.set_dns_policy(DNS_CLUSTER_FIRST_WITH_HOST_NET),
    ])
}

pub(crate) fn dns_config(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    Ok(context
        .spec()
        .dns_config
        .clone()
        .map(|dns_config| pod.set_dns_config(dns_config))
        .into_iter()
        .collect())
}

pub(crate) fn pod_security_context(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    Ok(context
        .spec()
        .pod_security_context
        .clone()
        .map(|security_context| pod.set_security_context(security_context))
        .into_iter()
        .collect())
}

pub(crate) fn termination_grace_period(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    Ok(context
        .spec()
        .termination_grace_period_seconds
        .map(|seconds| pod.set_termination_grace_period_seconds(seconds))
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use indoc::formatdoc;
    use rstest::rstest;

    use super::*;
    use crate::{
        crd::SparkApplication,
        rules::test_utils::{application, driver_pod, executor_pod, paths, run},
    };

    fn application_with_spec(spec: &str) -> SparkApplication {
        application(&formatdoc! {"
            apiVersion: sparkoperator.k8s.io/v1beta2
            kind: SparkApplication
            metadata:
              name: spark-pi
            spec: {spec}
        "})
    }

    #[rstest]
    #[case("{executor: {hostNetwork: true}}", 2)]
    #[case("{executor: {hostNetwork: false}}", 0)]
    #[case("{executor: {}}", 0)]
    #[case("{driver: {hostNetwork: true}}", 0)]
    fn host_network_sets_dns_policy(#[case] spec: &str, #[case] expected: usize) {
        let (operations, pod) = run(host_network, &application_with_spec(spec), &executor_pod())
            .expect("rule applies");

        assert_eq!(operations.len(), expected);
        if expected > 0 {
            assert_eq!(paths(&operations), ["/spec/hostNetwork", "/spec/dnsPolicy"]);

            let spec = pod.spec.expect("pod has a spec");
            assert_eq!(spec.host_network, Some(true));
            assert_eq!(spec.dns_policy.as_deref(), Some("ClusterFirstWithHostNet"));
        }
    }

    #[test]
    fn set_dns_config() {
        let application = application_with_spec(
            "{driver: {dnsConfig: {nameservers: [10.0.0.10], \
              searches: [spark.svc.cluster.local]}}}",
        );

        let (operations, pod) = run(dns_config, &application, &driver_pod()).expect("rule applies");

        assert_eq!(paths(&operations), ["/spec/dnsConfig"]);
        assert_eq!(
            pod.spec
                .and_then(|spec| spec.dns_config)
                .and_then(|dns_config| dns_config.nameservers),
            Some(vec!["10.0.0.10".to_owned()])
        );
    }

    #[test]
    fn set_pod_security_context() {
        let application = application_with_spec(
            "{executor: {podSecurityContext: {runAsUser: 185, fsGroup: 185}}}",
        );

        let (operations, pod) =
            run(pod_security_context, &application, &executor_pod()).expect("rule applies");

        assert_eq!(paths(&operations), ["/spec/securityContext"]);
        assert_eq!(
            pod.spec
                .and_then(|spec| spec.security_context)
                .and_then(|security_context| security_context.run_as_user),
            Some(185)
        );
    }

    #[rstest]
    #[case("{driver: {terminationGracePeriodSeconds: 60}}", Some(60))]
    #[case("{driver: {}}", None)]
    fn set_termination_grace_period(#[case] spec: &str, #[case] expected: Option<i64>) {
        let (operations, pod) =
            run(termination_grace_period, &application_with_spec(spec), &driver_pod())
                .expect("rule applies");

        assert_eq!(operations.len(), usize::from(expected.is_some()));
        assert_eq!(
            pod.spec.and_then(|spec| spec.termination_grace_period_seconds),
            expected
        );
    }
}
