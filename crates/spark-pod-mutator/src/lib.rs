//! Computes the JSON patch which adapts Spark driver and executor pods to
//! their SparkApplication.
//!
//! The Spark operator runs this as part of a mutating admission webhook: the
//! pods Spark creates through `spark-submit` cannot express everything a
//! SparkApplication declares (e.g. sidecars, GPU limits or ConfigMap mounts),
//! so these settings are patched into the pods on admission.
//!
//! The entrypoint is [`PatchSynthesizer::synthesize`], which runs every
//! mutation rule against the pod and returns a [`PodPatch`].

pub mod config_map;
pub mod constants;
pub mod crd;
pub mod live;
pub mod options;
pub mod patch;
pub mod pointer;
pub mod quantity;
pub mod role;
pub mod rules;

mod synthesizer;

pub use synthesizer::{PatchSynthesizer, PodPatch};

// External re-exports
pub use json_patch;
pub use k8s_openapi;
pub use kube;
