use snafu::OptionExt;

use super::{ContainerNotFoundSnafu, Result, RuleContext};
use crate::{
    constants::{SPARK_DRIVER_CONTAINER_NAME, SPARK_EXECUTOR_CONTAINER_NAME},
    live::LivePod,
    quantity,
};

/// Adds the sidecars of the role. Sidecars which are already part of the pod
/// (same name and image) are skipped.
pub(crate) fn sidecars(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let mut operations = Vec::new();

    for sidecar in &context.spec().sidecars {
        if !pod.has_container(sidecar) {
            operations.push(pod.add_container(sidecar.clone()));
        }
    }

    Ok(operations)
}

pub(crate) fn init_containers(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let mut operations = Vec::new();

    for init_container in &context.spec().init_containers {
        if !pod.has_init_container(init_container) {
            operations.push(pod.add_init_container(init_container.clone()));
        }
    }

    Ok(operations)
}

pub(crate) fn env_vars(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let env = &context.spec().env;
    if env.is_empty() {
        return Ok(Vec::new());
    }

    let container = context.spark_container(pod)?;
    Ok(env
        .iter()
        .map(|env_var| pod.add_env_var(container, env_var.clone()))
        .collect())
}

pub(crate) fn env_from(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let env_from = &context.spec().env_from;
    if env_from.is_empty() {
        return Ok(Vec::new());
    }

    let container = context.spark_container(pod)?;
    Ok(env_from
        .iter()
        .map(|source| pod.add_env_from(container, source.clone()))
        .collect())
}

/// Sets the security context of the Spark container. Besides the names of
/// the role, the default driver and executor container names are accepted.
pub(crate) fn container_security_context(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let Some(security_context) = &context.spec().security_context else {
        return Ok(Vec::new());
    };

    let mut candidates = context.role().container_names().to_vec();
    candidates.extend([SPARK_DRIVER_CONTAINER_NAME, SPARK_EXECUTOR_CONTAINER_NAME]);

    let container = pod
        .find_container(&candidates)
        .with_context(|| ContainerNotFoundSnafu {
            role: context.role(),
            pod: pod.name(),
        })?;

    Ok(vec![pod.set_container_security_context(
        container,
        security_context.clone(),
    )])
}

/// Requests GPUs as a resource limit of the Spark container.
pub(crate) fn gpu(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let Some(gpu) = &context.spec().gpu else {
        return Ok(Vec::new());
    };

    if gpu.name.is_empty() {
        tracing::debug!(
            ?gpu,
            "no GPU resource name (e.g. nvidia.com/gpu) given, not requesting GPUs"
        );
        return Ok(Vec::new());
    }
    if gpu.quantity <= 0 {
        tracing::debug!(?gpu, "GPU quantity is not positive, not requesting GPUs");
        return Ok(Vec::new());
    }

    let container = context.spark_container(pod)?;
    Ok(vec![pod.add_resource_limit(
        container,
        &gpu.name,
        quantity::decimal_si(gpu.quantity),
    )])
}

/// Lifecycle hooks are only supported for the driver container.
pub(crate) fn lifecycle(context: &RuleContext<'_>, pod: &mut LivePod) -> Result {
    let Some(lifecycle) = context.spec().lifecycle() else {
        return Ok(Vec::new());
    };

    let container = context.spark_container(pod)?;
    Ok(vec![pod.set_container_lifecycle(container, lifecycle.clone())])
}
