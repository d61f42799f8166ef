//! The decision engine: derives the extended resources a pod demands,
//! the tolerations it already carries and the JSON Patch closing the gap.

pub mod extract;
pub mod patch;

pub use extract::demanded_resources;
pub use extract::existing_toleration_keys;
pub use extract::tolerations_to_add;
pub use patch::build_tolerations_patch;

/// Policy evaluation errors
#[derive(Debug, derive_more::Display)]
pub enum PolicyError {
    #[display("Failed to encode tolerations patch")]
    PatchEncode,
}

impl core::error::Error for PolicyError {}
