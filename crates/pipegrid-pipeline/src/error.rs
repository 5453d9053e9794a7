//! Pipeline model error types.

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while building or addressing a pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A node name does not exist at the addressed level.
    #[error("unknown node: {name}")]
    UnknownNode {
        /// Name of the missing node.
        name: String,
    },

    /// A node with the same name already exists.
    #[error("duplicate node: {name}")]
    DuplicateNode {
        /// Name of the conflicting node.
        name: String,
    },

    /// A parameter name does not exist on the addressed unit.
    #[error("unknown parameter: {name}")]
    UnknownParameter {
        /// Name of the missing parameter.
        name: String,
    },

    /// A plug name does not exist on the addressed node.
    #[error("unknown plug {plug} on node {node}")]
    UnknownPlug {
        /// Node owning the plugs.
        node: String,
        /// Name of the missing plug.
        plug: String,
    },

    /// The addressed node does not wrap a leaf process.
    #[error("node {name} is not a process")]
    NotAProcess {
        /// Name of the addressed node.
        name: String,
    },
}
