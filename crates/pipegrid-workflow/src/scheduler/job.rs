//! Schedulable job descriptors.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::path::{FileTransfer, SharedResourcePath, TemporaryPath};

/// One substituted command-line argument of a job.
///
/// Temporary paths, shared references, and transfers stay tagged so the
/// scheduler can resolve them at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobArg {
    /// Plain textual argument.
    Literal(String),
    /// A concrete path used as-is on the execution host.
    Path(PathBuf),
    /// A scheduler-managed temporary path.
    Temporary(TemporaryPath),
    /// A resource-relative symbolic reference.
    Shared(Arc<SharedResourcePath>),
    /// A transferred file or directory.
    Transfer(Arc<FileTransfer>),
    /// Nested argument list.
    List(Vec<JobArg>),
}

/// A file reference a job depends on or produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobRef {
    /// A scheduler-managed temporary path.
    Temporary(TemporaryPath),
    /// A transferred file or directory.
    Transfer(Arc<FileTransfer>),
}

/// A single schedulable job.
///
/// Immutable once built by the converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job name.
    pub name: String,
    /// Ordered, substituted command-line arguments.
    pub command: Vec<JobArg>,
    /// Files the job consumes that the scheduler must provide.
    pub referenced_inputs: Vec<JobRef>,
    /// Files the job produces that the scheduler must collect.
    pub referenced_outputs: Vec<JobRef>,
}

impl Job {
    /// Creates a job descriptor.
    pub fn new(
        name: impl Into<String>,
        command: Vec<JobArg>,
        referenced_inputs: Vec<JobRef>,
        referenced_outputs: Vec<JobRef>,
    ) -> Self {
        Self {
            name: name.into(),
            command,
            referenced_inputs,
            referenced_outputs,
        }
    }
}
