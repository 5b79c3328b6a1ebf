use super::{Result, RuleContext};
use crate::live::LivePod;

pub(crate) fn tolerations(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    Ok(context
        .spec()
        .tolerations
        .iter()
        .map(|toleration| pod.add_toleration(toleration.clone()))
        .collect())
}

pub(crate) fn node_selector(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let node_selector = &context.spec().node_selector;
    if node_selector.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![pod.set_node_selector(node_selector.clone())])
}

pub(crate) fn scheduler_name(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    Ok(context
        .spec()
        .scheduler_name()
        .map(|scheduler_name| pod.set_scheduler_name(scheduler_name))
        .into_iter()
        .collect())
}

pub(crate) fn priority_class_name(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    Ok(context
        .spec()
        .priority_class_name()
        .map(|priority_class_name| pod.set_priority_class_name(priority_class_name))
        .into_iter()
        .collect())
}

/// Affinities already present on the pod (e.g. from a pod template) win.
pub(crate) fn affinity(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    match &context.spec().affinity {
        Some(affinity) if !pod.has_affinity() => Ok(vec![pod.set_affinity(affinity.clone())]),
        _ => Ok(Vec::new()),
    }
}
