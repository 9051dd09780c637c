use thiserror::Error;

/// Structural precondition failures raised before any traversal starts.
///
/// These are deterministic checks on the inputs; a failed merge produces no
/// partial result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    #[error("transforms of the input grids do not match")]
    TransformMismatch,

    #[error("tree level configurations of the input grids do not match")]
    ConfigMismatch,
}
