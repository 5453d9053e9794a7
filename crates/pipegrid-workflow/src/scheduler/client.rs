//! Seam to a live job-scheduler endpoint.
//!
//! The converter itself never talks to a scheduler; this trait is the
//! boundary a transport implementation plugs into.

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::workflow::Workflow;
use crate::TRACING_TARGET;

/// Handle of a submitted workflow.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct WorkflowHandle(Uuid);

impl WorkflowHandle {
    /// Creates a new random handle.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for WorkflowHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A client capable of submitting workflows to a scheduler endpoint.
pub trait SchedulerClient {
    /// Transport-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submits a workflow and returns its handle.
    fn submit(&mut self, workflow: &Workflow) -> Result<WorkflowHandle, Self::Error>;

    /// Blocks until the submitted workflow completes.
    fn wait(&mut self, handle: WorkflowHandle) -> Result<(), Self::Error>;
}

/// Submits a workflow and blocks until it completes.
pub fn run_workflow<C: SchedulerClient>(
    client: &mut C,
    workflow: &Workflow,
) -> Result<WorkflowHandle, C::Error> {
    let handle = client.submit(workflow)?;
    debug!(
        target: TRACING_TARGET,
        workflow = %workflow.name,
        %handle,
        "workflow submitted, waiting for completion"
    );
    client.wait(handle)?;
    Ok(handle)
}
