//! Flattened workflow: jobs, groups, and dependency edges.

use std::collections::HashSet;

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};

use super::job::Job;

/// Identifier of a job within one workflow.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("job#{_0}")]
#[display("job#{_0}")]
#[serde(transparent)]
pub struct JobId(u32);

impl JobId {
    /// Creates a job id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the index of the job in the workflow's job list.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a group within one workflow.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("group#{_0}")]
#[display("group#{_0}")]
#[serde(transparent)]
pub struct GroupId(u32);

impl GroupId {
    /// Creates a group id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the index of the group in the workflow's group list.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A job or group handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Element {
    /// A job handle.
    Job(JobId),
    /// A group handle.
    Group(GroupId),
}

/// An ordering constraint: `source` must complete before `target` starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Element that must complete first.
    pub source: Element,
    /// Element that waits for the source.
    pub target: Element,
}

impl Dependency {
    /// Creates a dependency edge.
    pub const fn new(source: Element, target: Element) -> Self {
        Self { source, target }
    }
}

/// A named, ordered grouping of jobs and nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group name.
    pub name: String,
    /// Members in nesting order.
    pub members: Vec<Element>,
}

impl Group {
    /// Creates a group.
    pub fn new(name: impl Into<String>, members: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// The flattened job/group/dependency graph handed to the external
/// scheduler.
///
/// Dependencies are a partial order, not a schedule; execution ordering
/// beyond them belongs to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow name, taken from the pipeline.
    pub name: String,
    /// All jobs, indexed by [`JobId`].
    pub jobs: Vec<Job>,
    /// All groups, indexed by [`GroupId`].
    pub groups: Vec<Group>,
    /// Ordering constraints between jobs and groups.
    pub dependencies: HashSet<Dependency>,
    /// Top-level elements, dependency-ordered.
    pub roots: Vec<Element>,
}

impl Workflow {
    /// Returns a job by id.
    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(id.index())
    }

    /// Returns a group by id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.index())
    }

    /// Returns all jobs transitively contained in a group.
    pub fn flatten_group(&self, id: GroupId) -> Vec<JobId> {
        let mut queue: Vec<Element> = self
            .group(id)
            .map(|group| group.members.clone())
            .unwrap_or_default();
        let mut jobs = Vec::new();
        while !queue.is_empty() {
            match queue.remove(0) {
                Element::Job(job) => jobs.push(job),
                Element::Group(nested) => {
                    if let Some(group) = self.group(nested) {
                        queue.extend(group.members.iter().copied());
                    }
                }
            }
        }
        jobs
    }
}
