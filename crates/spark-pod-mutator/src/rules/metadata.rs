use kube::{Resource, ResourceExt};
use snafu::OptionExt;

use super::{OwnerReferenceSnafu, Result, RuleContext};
use crate::{live::LivePod, role::SparkRole};

/// Makes the SparkApplication the controller of the driver pod, so the driver
/// is garbage collected together with the application.
pub(crate) fn owner_reference(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    if context.role() != SparkRole::Driver {
        return Ok(Vec::new());
    }

    let application = context.spec().application();
    let owner_reference =
        application
            .controller_owner_ref(&())
            .with_context(|| OwnerReferenceSnafu {
                application: application.name_any(),
            })?;

    Ok(vec![pod.add_owner_reference(owner_reference)])
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::rules::{
        RuleError,
        test_utils::{application, driver_pod, executor_pod, paths, run},
    };

    const APPLICATION: &str = indoc! {"
        apiVersion: sparkoperator.k8s.io/v1beta2
        kind: SparkApplication
        metadata:
          name: spark-pi
          namespace: default
          uid: 9a4a4bd2-8b1e-4b57-a4e3-5c8f3c4a1f42
        spec: {}
    "};

    #[test]
    fn driver_gets_controller_reference() {
        let (operations, pod) =
            run(owner_reference, &application(APPLICATION), &driver_pod()).expect("rule applies");

        assert_eq!(paths(&operations), ["/metadata/ownerReferences"]);

        let owner_references = pod.owner_references();
        assert_eq!(owner_references.len(), 1);
        assert_eq!(owner_references[0].kind, "SparkApplication");
        assert_eq!(owner_references[0].name, "spark-pi");
        assert_eq!(owner_references[0].controller, Some(true));
    }

    #[test]
    fn appends_to_existing_references() {
        let mut pod = driver_pod();
        pod.metadata.owner_references = Some(vec![Default::default()]);

        let (operations, _) =
            run(owner_reference, &application(APPLICATION), &pod).expect("rule applies");

        assert_eq!(paths(&operations), ["/metadata/ownerReferences/-"]);
    }

    #[test]
    fn executor_is_untouched() {
        let (operations, _) =
            run(owner_reference, &application(APPLICATION), &executor_pod()).expect("rule applies");

        assert!(operations.is_empty());
    }

    #[test]
    fn application_without_uid_fails() {
        let application = application(indoc! {"
            apiVersion: sparkoperator.k8s.io/v1beta2
            kind: SparkApplication
            metadata:
              name: spark-pi
            spec: {}
        "});

        assert!(matches!(
            run(owner_reference, &application, &driver_pod()),
            Err(RuleError::OwnerReference { .. })
        ));
    }
}
