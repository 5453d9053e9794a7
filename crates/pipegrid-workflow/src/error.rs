//! Conversion error types.

use pipegrid_pipeline::PipelineError;
use pipegrid_pipeline::pipeline::UnitPath;
use thiserror::Error;

/// Result type for workflow conversion.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that can occur while converting a pipeline into a workflow.
///
/// Configuration gaps and propagation dead ends are not errors; they
/// degrade to no-ops inside the conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A structural node cannot be resolved to a job or group handle.
    #[error("structural mismatch at node {node}: {message}")]
    StructuralMismatch {
        /// Name of the offending structural node.
        node: String,
        /// What went wrong.
        message: String,
    },

    /// The structural graph contains a cycle.
    #[error("cycle detected in structural graph")]
    CycleDetected,

    /// A path-typed parameter cannot be classified as file or directory
    /// during temporary-path allocation.
    #[error("parameter {name} of unit {unit} cannot be classified as file or directory")]
    UnclassifiedParameter {
        /// Address of the owning unit.
        unit: UnitPath,
        /// Parameter name.
        name: String,
    },

    /// Pipeline addressing failed.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}
