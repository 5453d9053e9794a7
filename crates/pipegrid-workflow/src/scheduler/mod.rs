//! Scheduler-facing workflow value types.
//!
//! These are the shapes the external job scheduler consumes:
//! - [`Workflow`]: the flattened job/group/dependency graph
//! - [`Job`] / [`Group`] / [`Element`] / [`Dependency`]: its building blocks
//! - [`TemporaryPath`] / [`SharedResourcePath`] / [`FileTransfer`]:
//!   run-time path representations substituted into job command lines
//! - [`SchedulerClient`]: the seam a live scheduler transport plugs into

pub mod client;
pub mod job;
pub mod path;
pub mod workflow;

pub use client::{SchedulerClient, WorkflowHandle, run_workflow};
pub use job::{Job, JobArg, JobRef};
pub use path::{FileTransfer, SharedResourcePath, TemporaryPath, TransferDirection};
pub use workflow::{Dependency, Element, Group, GroupId, JobId, Workflow};
