//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use pipegrid_workflow::prelude::*;
//! ```

pub use crate::config::{PathTranslation, ResourceConfig, WorkflowConfig};
pub use crate::convert::{
    ConvertContext, LevelConversion, SharedPathMap, TempEntry, TempMap, TempScope, TransferMaps,
    build_job, compute_transfers, convert_graph, translate_path, workflow_from_pipeline,
};
pub use crate::error::{ConvertError, ConvertResult};
pub use crate::scheduler::{
    Dependency, Element, FileTransfer, Group, GroupId, Job, JobArg, JobId, JobRef,
    SchedulerClient, SharedResourcePath, TemporaryPath, TransferDirection, Workflow,
    WorkflowHandle, run_workflow,
};
