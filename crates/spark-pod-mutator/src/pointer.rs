//! Helpers to build [JSON Pointer][rfc6901] paths for patch operations.
//!
//! [rfc6901]: https://datatracker.ietf.org/doc/html/rfc6901

use json_patch::jsonptr::{Pointer, PointerBuf, Token};

pub const OWNER_REFERENCES: &Pointer = Pointer::from_static("/metadata/ownerReferences");

pub const VOLUMES: &Pointer = Pointer::from_static("/spec/volumes");
pub const CONTAINERS: &Pointer = Pointer::from_static("/spec/containers");
pub const INIT_CONTAINERS: &Pointer = Pointer::from_static("/spec/initContainers");
pub const TOLERATIONS: &Pointer = Pointer::from_static("/spec/tolerations");
pub const HOST_NETWORK: &Pointer = Pointer::from_static("/spec/hostNetwork");
pub const DNS_POLICY: &Pointer = Pointer::from_static("/spec/dnsPolicy");
pub const DNS_CONFIG: &Pointer = Pointer::from_static("/spec/dnsConfig");
pub const NODE_SELECTOR: &Pointer = Pointer::from_static("/spec/nodeSelector");
pub const SCHEDULER_NAME: &Pointer = Pointer::from_static("/spec/schedulerName");
pub const PRIORITY_CLASS_NAME: &Pointer = Pointer::from_static("/spec/priorityClassName");
pub const AFFINITY: &Pointer = Pointer::from_static("/spec/affinity");
pub const SECURITY_CONTEXT: &Pointer = Pointer::from_static("/spec/securityContext");
pub const TERMINATION_GRACE_PERIOD_SECONDS: &Pointer =
    Pointer::from_static("/spec/terminationGracePeriodSeconds");

/// Escapes a single reference token, so that it can be used as one segment
/// of a JSON Pointer. `~` becomes `~0` and `/` becomes `~1`.
///
/// Tokens passed to [`PointerBuf::push_back`] are escaped already, this is
/// only needed where a pointer is rendered by hand.
pub fn escape(token: &str) -> String {
    Token::new(token).encoded().to_owned()
}

/// The pointer to a field of the container at `index`, e.g.
/// `/spec/containers/1/env`.
pub fn container_field(index: usize, field: &str) -> PointerBuf {
    let mut path = CONTAINERS.to_buf();
    path.push_back(index);
    path.push_back(field);
    path
}

/// Where an element is appended to an array.
///
/// A JSON Patch `add` to `.../-` requires the array to exist. So if the array
/// is currently empty (or missing), the whole array (containing only the new
/// element) needs to be added instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayAppend {
    /// Add the whole array at the contained path.
    WholeArray(PointerBuf),

    /// Add the single element at the contained path, which ends with `/-`.
    Element(PointerBuf),
}

impl ArrayAppend {
    pub fn path(&self) -> &Pointer {
        match self {
            Self::WholeArray(path) | Self::Element(path) => path,
        }
    }

    pub fn is_whole_array(&self) -> bool {
        matches!(self, Self::WholeArray(_))
    }
}

/// Decides how to append to the array located at `base_path`.
pub fn array_append_path(base_path: &Pointer, is_empty: bool) -> ArrayAppend {
    if is_empty {
        ArrayAppend::WholeArray(base_path.to_buf())
    } else {
        ArrayAppend::Element(base_path.with_trailing_token("-"))
    }
}
