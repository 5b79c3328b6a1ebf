use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::instrument;

use crate::{
    config_map::ConfigMapReader,
    crd::SparkApplication,
    live::LivePod,
    options::MutationOptions,
    patch::{self, PatchOperation},
    role::{RoleSpec, SparkRole},
    rules::{self, RuleContext, RuleError},
};

/// Computes the patch which adapts a Spark pod to its [`SparkApplication`].
///
/// ```ignore
/// let synthesizer = PatchSynthesizer::new(client, MutationOptions::default());
/// let patch = synthesizer.synthesize(&pod, &application).await;
/// let json_patch = patch.into_json_patch()?;
/// ```
#[derive(Clone, Debug)]
pub struct PatchSynthesizer<R> {
    reader: R,
    options: MutationOptions,
}

impl<R> PatchSynthesizer<R>
where
    R: ConfigMapReader,
{
    pub fn new(reader: R, options: MutationOptions) -> Self {
        Self { reader, options }
    }

    pub fn options(&self) -> &MutationOptions {
        &self.options
    }

    /// Runs all mutation rules against `pod`.
    ///
    /// Pods which do not belong to a Spark application yield an empty patch.
    /// Rules which fail are skipped (and logged), the other rules still
    /// apply.
    #[instrument(
        skip_all,
        fields(
            pod = %pod.name_any(),
            application = %application.name_any(),
            role = tracing::field::Empty,
        )
    )]
    pub async fn synthesize(&self, pod: &Pod, application: &SparkApplication) -> PodPatch {
        let mut patch = PodPatch::new(pod.clone());

        let Some(role) = SparkRole::from_pod(pod) else {
            tracing::debug!("pod has no Spark role, not mutating it");
            return patch;
        };
        tracing::Span::current().record("role", tracing::field::display(role));

        if pod.spec.is_none() {
            tracing::warn!("pod has no spec, not mutating it");
            return patch;
        }

        let context = RuleContext::new(RoleSpec::new(application, role), &self.options);

        patch.apply("owner-reference", &context, rules::owner_reference);
        patch.apply("volumes", &context, rules::volumes);
        patch.apply("general-config-maps", &context, rules::general_config_maps);

        let mut scratch = patch.live.clone();
        let result = rules::spark_config_map(&context, &mut scratch, &self.reader).await;
        patch.commit("spark-config-map", scratch, result);

        patch.apply("hadoop-config-map", &context, rules::hadoop_config_map);
        patch.apply("prometheus", &context, rules::prometheus);
        patch.apply("tolerations", &context, rules::tolerations);
        patch.apply("sidecars", &context, rules::sidecars);
        patch.apply("init-containers", &context, rules::init_containers);
        patch.apply("host-network", &context, rules::host_network);
        patch.apply("node-selector", &context, rules::node_selector);
        patch.apply("dns-config", &context, rules::dns_config);
        patch.apply("env", &context, rules::env_vars);
        patch.apply("env-from", &context, rules::env_from);
        patch.apply("scheduler-name", &context, rules::scheduler_name);
        patch.apply("priority-class-name", &context, rules::priority_class_name);
        patch.apply("affinity", &context, rules::affinity);
        patch.apply("pod-security-context", &context, rules::pod_security_context);
        patch.apply(
            "container-security-context",
            &context,
            rules::container_security_context,
        );
        patch.apply("gpu", &context, rules::gpu);
        patch.apply(
            "termination-grace-period",
            &context,
            rules::termination_grace_period,
        );
        patch.apply("lifecycle", &context, rules::lifecycle);

        tracing::debug!(operations = patch.len(), "synthesized pod patch");
        patch
    }
}

/// The result of [`PatchSynthesizer::synthesize`]: the ordered patch
/// operations together with the pod they produce.
#[derive(Clone, Debug, PartialEq)]
pub struct PodPatch {
    live: LivePod,
    operations: Vec<PatchOperation>,
}

impl PodPatch {
    fn new(pod: Pod) -> Self {
        Self {
            live: LivePod::new(pod),
            operations: Vec::new(),
        }
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    /// The pod as it looks after the patch has been applied.
    pub fn patched_pod(&self) -> &Pod {
        self.live.pod()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn into_operations(self) -> Vec<PatchOperation> {
        self.operations
    }

    pub fn into_json_patch(self) -> Result<json_patch::Patch, patch::Error> {
        patch::to_json_patch(&self.operations)
    }

    /// Runs `rule` against a copy of the live pod, which replaces the live pod
    /// only if the rule succeeds.
    fn apply<F>(&mut self, rule: &'static str, context: &RuleContext<'_>, f: F)
    where
        F: FnOnce(&RuleContext<'_>, &mut LivePod) -> rules::Result,
    {
        let mut scratch = self.live.clone();
        let result = f(context, &mut scratch);
        self.commit(rule, scratch, result);
    }

    fn commit(
        &mut self,
        rule: &'static str,
        scratch: LivePod,
        result: Result<Vec<PatchOperation>, RuleError>,
    ) {
        match result {
            Ok(operations) => {
                if !operations.is_empty() {
                    tracing::trace!(rule, operations = operations.len(), "applied mutation rule");
                }
                self.live = scratch;
                self.operations.extend(operations);
            }
            Err(error) => tracing::warn!(
                rule,
                error = &error as &dyn std::error::Error,
                "skipping mutation rule"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::config_map::StaticConfigMaps;

    fn synthesizer() -> PatchSynthesizer<StaticConfigMaps> {
        PatchSynthesizer::new(StaticConfigMaps::new(), MutationOptions::default())
    }

    fn application(yaml: &str) -> SparkApplication {
        serde_yaml::from_str(yaml).expect("test SparkApplication is valid YAML")
    }

    fn pod(yaml: &str) -> Pod {
        serde_yaml::from_str(yaml).expect("test pod is valid YAML")
    }

    #[tokio::test]
    async fn pod_without_role_is_untouched() {
        let pod = pod(indoc! {"
            apiVersion: v1
            kind: Pod
            metadata:
              name: nginx
            spec:
              containers:
                - name: nginx
        "});
        let application = application(indoc! {"
            apiVersion: sparkoperator.k8s.io/v1beta2
            kind: SparkApplication
            metadata:
              name: spark-pi
            spec:
              driver:
                hostNetwork: true
              executor:
                hostNetwork: true
        "});

        let patch = synthesizer().synthesize(&pod, &application).await;

        assert!(patch.is_empty());
        assert_eq!(patch.patched_pod(), &pod);
    }

    #[tokio::test]
    async fn failing_rule_is_rolled_back() {
        // The volume is added before the mount fails, which must not leak
        // into the patch.
        let pod = pod(indoc! {"
            apiVersion: v1
            kind: Pod
            metadata:
              name: spark-pi-exec-1
              labels:
                spark-role: executor
            spec:
              containers:
                - name: not-spark
        "});
        let application = application(indoc! {"
            apiVersion: sparkoperator.k8s.io/v1beta2
            kind: SparkApplication
            metadata:
              name: spark-pi
            spec:
              volumes:
                - name: data
                  emptyDir: {}
              executor:
                volumeMounts:
                  - name: data
                    mountPath: /data
                terminationGracePeriodSeconds: 30
        "});

        let patch = synthesizer().synthesize(&pod, &application).await;

        let paths: Vec<_> = patch
            .operations()
            .iter()
            .map(|operation| operation.path().as_str())
            .collect();
        assert_eq!(paths, ["/spec/terminationGracePeriodSeconds"]);
        assert_eq!(
            patch.patched_pod().spec.as_ref().and_then(|spec| spec.volumes.as_ref()),
            None
        );
    }

    #[tokio::test]
    async fn rules_run_in_order() {
        let pod = pod(indoc! {"
            apiVersion: v1
            kind: Pod
            metadata:
              name: spark-pi-driver
              labels:
                spark-role: driver
            spec:
              containers:
                - name: spark-kubernetes-driver
        "});
        let application = application(indoc! {"
            apiVersion: sparkoperator.k8s.io/v1beta2
            kind: SparkApplication
            metadata:
              name: spark-pi
              uid: 1b2e3d4c-0000-4000-8000-000000000000
            spec:
              batchScheduler: volcano
              driver:
                env:
                  - name: A
                    value: a
                hostNetwork: true
                lifecycle:
                  postStart:
                    exec:
                      command: [/bin/true]
        "});

        let patch = synthesizer().synthesize(&pod, &application).await;

        let paths: Vec<_> = patch
            .operations()
            .iter()
            .map(|operation| operation.path().as_str())
            .collect();
        assert_eq!(
            paths,
            [
                "/metadata/ownerReferences",
                "/spec/hostNetwork",
                "/spec/dnsPolicy",
                "/spec/containers/0/env",
                "/spec/schedulerName",
                "/spec/containers/0/lifecycle",
            ]
        );
        assert_eq!(patch.len(), 6);
        assert_eq!(
            patch
                .into_json_patch()
                .expect("operations form a JSON patch")
                .0
                .len(),
            6
        );
    }
}
