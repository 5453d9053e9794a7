//! Scheduler-side path representations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A scheduler-managed temporary path, assigned a concrete location at run
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporaryPath {
    /// Identifier, unique within one workflow.
    pub id: u32,
    /// Whether the path names a directory rather than a file.
    pub is_directory: bool,
    /// Preferred file-name suffix, empty when none applies.
    pub suffix: String,
}

impl TemporaryPath {
    /// Creates a temporary path descriptor.
    pub fn new(id: u32, is_directory: bool, suffix: impl Into<String>) -> Self {
        Self {
            id,
            is_directory,
            suffix: suffix.into(),
        }
    }
}

/// A resource-relative symbolic path reference, usable across heterogeneous
/// execution hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedResourcePath {
    /// Path relative to the namespace base directory.
    pub relative_path: PathBuf,
    /// Namespace the reference is rooted in.
    pub namespace: String,
    /// Stable identity of the reference; the originating absolute path.
    pub uuid: String,
}

impl SharedResourcePath {
    /// Creates a symbolic reference.
    pub fn new(
        relative_path: impl Into<PathBuf>,
        namespace: impl Into<String>,
        uuid: impl Into<String>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            namespace: namespace.into(),
            uuid: uuid.into(),
        }
    }
}

/// Direction of a data transfer relative to the unit owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    /// The path is consumed by the unit and must be shipped to the
    /// execution resource first.
    Input,
    /// The path is produced by the unit and must be shipped back.
    Output,
}

impl TransferDirection {
    /// Returns the direction for a parameter's output flag.
    pub const fn from_output(output: bool) -> Self {
        if output {
            TransferDirection::Output
        } else {
            TransferDirection::Input
        }
    }

    /// Returns whether this is an output transfer.
    pub const fn is_output(&self) -> bool {
        matches!(self, TransferDirection::Output)
    }
}

/// A file or directory that must be explicitly moved to or from a remote
/// execution resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileTransfer {
    /// Transfer direction.
    pub direction: TransferDirection,
    /// Absolute path on the submitting host.
    pub path: PathBuf,
    /// All paths moved together with this transfer.
    pub paths_group: Vec<PathBuf>,
}

impl FileTransfer {
    /// Creates a transfer for a single path.
    // TODO: expand paths_group for multi-file formats (header + data pairs).
    pub fn new(direction: TransferDirection, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            direction,
            paths_group: vec![path.clone()],
            path,
        }
    }

    /// Returns the transferred path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
