use std::collections::BTreeSet;

use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::api::core::v1::Toleration;
use serde::Deserialize;
use serde::Serialize;

use super::PolicyError;

/// JSON Pointer of the only location this webhook ever patches.
pub const TOLERATIONS_PATH: &str = "/spec/tolerations";

/// One RFC 6902 operation against `/spec/tolerations`.
///
/// `add` carries the full synthesized list when the pod has no toleration
/// list yet; `replace` carries the original list with the synthesized
/// tolerations appended. Tagging on `op` keeps the two payload shapes
/// exhaustively matched at compile time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Vec<Toleration> },
    Replace { path: String, value: Vec<Toleration> },
}

/// The toleration synthesized for a target resource: `Exists` regardless of
/// value, `NoExecute` so the pod survives the most restrictive taint effect.
fn synthesized_toleration(key: &str) -> Toleration {
    Toleration {
        key: Some(key.to_string()),
        operator: Some("Exists".to_string()),
        effect: Some("NoExecute".to_string()),
        ..Default::default()
    }
}

/// Serialize the JSON Patch that appends one synthesized toleration per
/// member of `delta`. The `BTreeSet` makes the appended order lexicographic,
/// keeping responses reproducible.
///
/// # Errors
///
/// - [`PolicyError::PatchEncode`] if the patch document cannot be serialized
pub fn build_tolerations_patch(
    pod: &Pod,
    delta: &BTreeSet<String>,
) -> Result<Vec<u8>, Report<PolicyError>> {
    let synthesized = delta.iter().map(|key| synthesized_toleration(key));

    let operation = match pod.spec.as_ref().and_then(|spec| spec.tolerations.as_ref()) {
        None => PatchOperation::Add {
            path: TOLERATIONS_PATH.to_string(),
            value: synthesized.collect(),
        },
        Some(existing) => {
            let mut value = existing.clone();
            value.extend(synthesized);
            PatchOperation::Replace {
                path: TOLERATIONS_PATH.to_string(),
                value,
            }
        }
    };

    serde_json::to_vec(&[operation]).change_context(PolicyError::PatchEncode)
}
