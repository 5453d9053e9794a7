//! Recursive conversion of the structural graph into jobs, groups, and
//! dependencies.

use std::collections::{HashMap, HashSet};

use pipegrid_pipeline::graph::{StructuralGraph, StructuralMeta};
use pipegrid_pipeline::pipeline::{Pipeline, UnitPath};
use tracing::trace;

use crate::TRACING_TARGET;
use crate::config::PathTranslation;
use crate::convert::job::build_job;
use crate::convert::shared::SharedPathMap;
use crate::convert::temp::TempMap;
use crate::convert::transfer::TransferMaps;
use crate::error::{ConvertError, ConvertResult};
use crate::scheduler::{Dependency, Element, Group, GroupId, Job, JobId};

/// Shared state threaded through one conversion.
///
/// Jobs and groups live in flat arenas; ids are indices into them, handed
/// to the workflow unchanged at the end.
pub struct ConvertContext<'a> {
    pub pipeline: &'a Pipeline,
    pub temp_map: &'a TempMap,
    pub translations: &'a [PathTranslation],
    pub transfers: &'a TransferMaps,
    pub shared_map: SharedPathMap,
    pub jobs: Vec<Job>,
    pub groups: Vec<Group>,
}

impl<'a> ConvertContext<'a> {
    /// Creates a context over one pipeline and its conversion inputs.
    pub fn new(
        pipeline: &'a Pipeline,
        temp_map: &'a TempMap,
        translations: &'a [PathTranslation],
        transfers: &'a TransferMaps,
    ) -> Self {
        Self {
            pipeline,
            temp_map,
            translations,
            transfers,
            shared_map: SharedPathMap::new(),
            jobs: Vec::new(),
            groups: Vec::new(),
        }
    }

    fn push_job(&mut self, job: Job) -> JobId {
        let id = JobId::new(self.jobs.len() as u32);
        self.jobs.push(job);
        id
    }

    fn push_group(&mut self, group: Group) -> GroupId {
        let id = GroupId::new(self.groups.len() as u32);
        self.groups.push(group);
        id
    }
}

/// What one structural level converted to.
#[derive(Debug, Default)]
pub struct LevelConversion {
    /// Jobs by leaf unit, including every nested level.
    pub jobs: HashMap<UnitPath, JobId>,
    /// Dependency edges, including every nested level.
    pub dependencies: HashSet<Dependency>,
    /// Groups created directly at this level.
    pub root_groups: Vec<GroupId>,
    /// Jobs created directly at this level.
    pub root_jobs: Vec<JobId>,
}

/// Converts one structural level.
///
/// Two passes: the first creates a job per leaf unit and recurses into
/// groups, the second resolves the level's edges into dependency
/// constraints. A group's members are the elements its nested level
/// created directly; nested jobs and dependencies merge upward.
pub fn convert_graph(
    ctx: &mut ConvertContext<'_>,
    graph: &StructuralGraph,
) -> ConvertResult<LevelConversion> {
    if graph.is_cyclic() {
        return Err(ConvertError::CycleDetected);
    }

    let mut level = LevelConversion::default();
    let mut handles: HashMap<String, Element> = HashMap::new();

    for node in graph.nodes() {
        match &node.meta {
            StructuralMeta::Leaf(units) => {
                for unit in units {
                    let process = ctx.pipeline.process_at(unit)?;
                    let job = build_job(
                        unit,
                        process,
                        ctx.temp_map,
                        ctx.translations,
                        &mut ctx.shared_map,
                        ctx.transfers,
                    )?;
                    let id = ctx.push_job(job);
                    level.jobs.insert(unit.clone(), id);
                    level.root_jobs.push(id);
                    handles
                        .entry(node.name.clone())
                        .or_insert(Element::Job(id));
                }
            }
            StructuralMeta::Group(nested) => {
                let sub = convert_graph(ctx, nested)?;
                let members: Vec<Element> = sub
                    .root_groups
                    .iter()
                    .map(|id| Element::Group(*id))
                    .chain(sub.root_jobs.iter().map(|id| Element::Job(*id)))
                    .collect();
                let id = ctx.push_group(Group::new(node.name.clone(), members));
                level.root_groups.push(id);
                handles.insert(node.name.clone(), Element::Group(id));
                level.jobs.extend(sub.jobs);
                level.dependencies.extend(sub.dependencies);
            }
        }
    }

    for node in graph.nodes() {
        let source = resolve_handle(&handles, &node.name)?;
        for target_name in graph.links_to(&node.name) {
            let target = resolve_handle(&handles, target_name)?;
            level.dependencies.insert(Dependency::new(source, target));
        }
    }

    trace!(
        target: TRACING_TARGET,
        jobs = level.root_jobs.len(),
        groups = level.root_groups.len(),
        dependencies = level.dependencies.len(),
        "converted structural level"
    );
    Ok(level)
}

fn resolve_handle(handles: &HashMap<String, Element>, name: &str) -> ConvertResult<Element> {
    handles
        .get(name)
        .copied()
        .ok_or_else(|| ConvertError::StructuralMismatch {
            node: name.to_owned(),
            message: "no job or group was created for this node".to_owned(),
        })
}
