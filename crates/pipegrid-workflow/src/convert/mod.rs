//! Pipeline-to-workflow conversion.
//!
//! [`workflow_from_pipeline`] drives the whole conversion: temporary paths
//! are allocated over the pipeline, transfers are discovered and propagated
//! from the boundary, the structural graph is derived and converted level
//! by level into jobs and groups, and the flattened [`Workflow`] is
//! assembled. The pipeline's parameter state is restored before the call
//! returns, whether the conversion succeeded or failed.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::DiGraph;
use pipegrid_pipeline::pipeline::Pipeline;
use tracing::debug;

use crate::TRACING_TARGET;
use crate::config::WorkflowConfig;
use crate::error::ConvertResult;
use crate::scheduler::{Dependency, Element, Workflow};

pub mod graph;
pub mod job;
pub mod shared;
pub mod temp;
pub mod transfer;

pub use graph::{ConvertContext, LevelConversion, convert_graph};
pub use job::build_job;
pub use shared::{SharedPathMap, translate_path};
pub use temp::{TempEntry, TempMap, TempScope};
pub use transfer::{TransferMaps, compute_transfers};

/// Converts a pipeline into a flattened workflow for the external
/// scheduler.
///
/// The pipeline is borrowed mutably for the duration of the call: unset
/// path parameters carry temporary tokens while jobs are built, and are
/// restored to their unset state on every exit path.
pub fn workflow_from_pipeline(
    pipeline: &mut Pipeline,
    config: &WorkflowConfig,
) -> ConvertResult<Workflow> {
    let name = pipeline.name.clone();
    let (transfer_roots, translations) = config.resource_paths();

    let scope = TempScope::allocate(pipeline)?;
    let transfers = compute_transfers(scope.pipeline(), &transfer_roots);
    let structural = scope.pipeline().structural_graph()?;

    let mut ctx = ConvertContext::new(
        scope.pipeline(),
        scope.temp_map(),
        &translations,
        &transfers,
    );
    let level = convert_graph(&mut ctx, &structural)?;

    let roots: Vec<Element> = level
        .root_groups
        .iter()
        .map(|id| Element::Group(*id))
        .chain(level.root_jobs.iter().map(|id| Element::Job(*id)))
        .collect();
    let roots = order_roots(roots, &level.dependencies);

    let workflow = Workflow {
        name,
        jobs: ctx.jobs,
        groups: ctx.groups,
        dependencies: level.dependencies,
        roots,
    };
    debug!(
        target: TRACING_TARGET,
        workflow = %workflow.name,
        jobs = workflow.jobs.len(),
        groups = workflow.groups.len(),
        dependencies = workflow.dependencies.len(),
        "converted pipeline to workflow"
    );
    Ok(workflow)
}

/// Topologically orders the top-level elements by the dependency edges
/// connecting them.
///
/// The scan is stable: at every step the earliest unplaced element with no
/// remaining predecessors is emitted, so elements the edges do not
/// constrain keep their discovery order. Edges with an endpoint below the
/// top level do not constrain the order. Should the constraints be cyclic
/// the remaining elements are appended in discovery order.
fn order_roots(roots: Vec<Element>, dependencies: &HashSet<Dependency>) -> Vec<Element> {
    let mut graph: DiGraph<Element, ()> = DiGraph::new();
    let mut indices = HashMap::new();
    for root in &roots {
        indices.insert(*root, graph.add_node(*root));
    }
    for dep in dependencies {
        if let (Some(&source), Some(&target)) =
            (indices.get(&dep.source), indices.get(&dep.target))
        {
            graph.add_edge(source, target, ());
        }
    }

    let mut indegree: Vec<usize> = graph
        .node_indices()
        .map(|index| graph.edges_directed(index, Direction::Incoming).count())
        .collect();
    let mut placed = vec![false; graph.node_count()];
    let mut ordered = Vec::with_capacity(graph.node_count());
    while ordered.len() < graph.node_count() {
        let next = graph
            .node_indices()
            .find(|index| !placed[index.index()] && indegree[index.index()] == 0);
        let Some(next) = next else {
            ordered.extend(
                graph
                    .node_indices()
                    .filter(|index| !placed[index.index()])
                    .map(|index| graph[index]),
            );
            break;
        };
        placed[next.index()] = true;
        for successor in graph.neighbors_directed(next, Direction::Outgoing) {
            indegree[successor.index()] -= 1;
        }
        ordered.push(graph[next]);
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipegrid_pipeline::param::{ParamKind, ParamSpec, ParamValue};
    use pipegrid_pipeline::pipeline::UnitPath;
    use pipegrid_pipeline::process::{CommandToken, Process};

    use crate::config::{PathTranslation, ResourceConfig};
    use crate::error::ConvertError;
    use crate::scheduler::{JobArg, JobRef};

    fn process(name: &str) -> Process {
        Process::new(name)
            .with_param(ParamSpec::input("in_file", ParamKind::File))
            .with_param(ParamSpec::output("out_file", ParamKind::File).with_suffixes([".nii"]))
            .with_command(vec![
                CommandToken::lit(name),
                CommandToken::param("in_file"),
                CommandToken::param("out_file"),
            ])
    }

    fn set(pipeline: &mut Pipeline, unit: &str, param: &str, path: &str) {
        pipeline
            .set_value_at(&UnitPath::from(unit), param, ParamValue::Path(path.into()))
            .unwrap();
    }

    fn resource_config(transfer_paths: &[&str], translations: &[(&str, &str)]) -> WorkflowConfig {
        let mut config = WorkflowConfig::new();
        config.computing_resource = Some("cluster".to_owned());
        config.resources.insert(
            "cluster".to_owned(),
            ResourceConfig {
                transfer_paths: transfer_paths.iter().map(Into::into).collect(),
                path_translations: translations
                    .iter()
                    .map(|(namespace, base)| PathTranslation::new(*namespace, *base))
                    .collect(),
            },
        );
        config
    }

    #[test]
    fn test_sequential_units_with_one_minted_token() {
        let mut pipeline = Pipeline::new("chain");
        pipeline.add_process(process("a")).unwrap();
        pipeline.add_process(process("b")).unwrap();
        pipeline.link("a", "out_file", "b", "in_file").unwrap();
        set(&mut pipeline, "a", "in_file", "/in/t1.nii");
        set(&mut pipeline, "a", "out_file", "/work/a.nii");
        set(&mut pipeline, "b", "in_file", "/work/a.nii");
        // b's out_file stays unset and gets a minted temporary.

        let workflow = workflow_from_pipeline(&mut pipeline, &WorkflowConfig::new()).unwrap();

        assert_eq!(workflow.name, "chain");
        assert_eq!(workflow.jobs.len(), 2);
        let job_b = workflow.jobs.iter().find(|job| job.name == "b").unwrap();
        let temp = job_b
            .command
            .iter()
            .find_map(|arg| match arg {
                JobArg::Temporary(path) => Some(path),
                _ => None,
            })
            .expect("temp substitution in b's command");
        assert_eq!(temp.suffix, ".nii");
        assert!(matches!(
            &job_b.referenced_outputs[..],
            [JobRef::Temporary(path)] if path == temp
        ));
        // The token was consumed by exactly one job.
        let job_a = workflow.jobs.iter().find(|job| job.name == "a").unwrap();
        assert!(job_a.referenced_outputs.is_empty());

        let a = workflow
            .roots
            .iter()
            .position(|e| matches!(e, Element::Job(id) if workflow.jobs[id.index()].name == "a"));
        assert!(a.is_some());
        assert_eq!(workflow.dependencies.len(), 1);
        let dep = workflow.dependencies.iter().next().unwrap();
        assert!(matches!(
            (dep.source, dep.target),
            (Element::Job(s), Element::Job(t))
                if workflow.jobs[s.index()].name == "a" && workflow.jobs[t.index()].name == "b"
        ));

        // Restoration: the unset parameter is unset again.
        assert!(
            pipeline
                .value_at(&UnitPath::from("b"), "out_file")
                .unwrap()
                .is_undefined()
        );
    }

    #[test]
    fn test_nested_group_bridges_outer_dependencies() {
        let mut mid = Pipeline::new("mid");
        for stage in ["s1", "s2", "s3"] {
            mid.add_process(process(stage)).unwrap();
        }
        mid.link("s1", "out_file", "s2", "in_file").unwrap();
        mid.link("s2", "out_file", "s3", "in_file").unwrap();
        mid.export_param(ParamSpec::input("head", ParamKind::File), "s1", "in_file")
            .unwrap();
        mid.export_param(ParamSpec::output("tail", ParamKind::File), "s3", "out_file")
            .unwrap();

        let mut outer = Pipeline::new("outer");
        outer.add_process(process("pre")).unwrap();
        outer.add_process(process("post")).unwrap();
        outer.add_subpipeline("mid", mid).unwrap();
        outer.link("pre", "out_file", "mid", "head").unwrap();
        outer.link("mid", "tail", "post", "in_file").unwrap();
        for unit in ["pre", "post", "mid/s1", "mid/s2", "mid/s3"] {
            set(&mut outer, unit, "in_file", "/in/x.nii");
            set(&mut outer, unit, "out_file", "/out/x.nii");
        }

        let workflow = workflow_from_pipeline(&mut outer, &WorkflowConfig::new()).unwrap();

        assert_eq!(workflow.jobs.len(), 5);
        assert_eq!(workflow.groups.len(), 1);
        let group_id = crate::scheduler::GroupId::new(0);
        let group = workflow.group(group_id).unwrap();
        assert_eq!(group.name, "mid");
        assert_eq!(group.members.len(), 3);
        assert!(group.members.iter().all(|m| matches!(m, Element::Job(_))));

        let job_named = |name: &str| {
            Element::Job(crate::scheduler::JobId::new(
                workflow.jobs.iter().position(|j| j.name == name).unwrap() as u32,
            ))
        };
        let group_elem = Element::Group(group_id);
        assert!(
            workflow
                .dependencies
                .contains(&Dependency::new(job_named("pre"), group_elem))
        );
        assert!(
            workflow
                .dependencies
                .contains(&Dependency::new(group_elem, job_named("post")))
        );
        // Outer edges never touch the group's internal jobs.
        for inner in ["s1", "s2", "s3"] {
            let elem = job_named(inner);
            assert!(!workflow.dependencies.contains(&Dependency::new(job_named("pre"), elem)));
            assert!(!workflow.dependencies.contains(&Dependency::new(elem, job_named("post"))));
        }

        // Roots come out dependency-ordered.
        assert_eq!(
            workflow.roots,
            [job_named("pre"), group_elem, job_named("post")]
        );
    }

    #[test]
    fn test_shared_reference_identity_across_jobs() {
        let mut pipeline = Pipeline::new("pair");
        pipeline.add_process(process("u1")).unwrap();
        pipeline.add_process(process("u2")).unwrap();
        for unit in ["u1", "u2"] {
            set(&mut pipeline, unit, "in_file", "/data/study/t1.nii");
            set(&mut pipeline, unit, "out_file", "/out/x.nii");
        }

        let config = resource_config(&[], &[("study", "/data/study")]);
        let workflow = workflow_from_pipeline(&mut pipeline, &config).unwrap();

        let shared: Vec<_> = workflow
            .jobs
            .iter()
            .filter_map(|job| {
                job.command.iter().find_map(|arg| match arg {
                    JobArg::Shared(shared) => Some(shared),
                    _ => None,
                })
            })
            .collect();
        assert_eq!(shared.len(), 2);
        assert!(std::sync::Arc::ptr_eq(shared[0], shared[1]));
    }

    #[test]
    fn test_transfer_reaches_consuming_job() {
        let mut pipeline = Pipeline::new("xfer");
        pipeline.add_process(process("u")).unwrap();
        pipeline
            .export_param(ParamSpec::input("src", ParamKind::File), "u", "in_file")
            .unwrap();
        pipeline
            .set_param_value("src", ParamValue::Path("/data/study/img.nii".into()))
            .unwrap();
        set(&mut pipeline, "u", "in_file", "/data/study/img.nii");
        set(&mut pipeline, "u", "out_file", "/out/x.nii");

        let config = resource_config(&["/data/study"], &[]);
        let workflow = workflow_from_pipeline(&mut pipeline, &config).unwrap();

        let job = &workflow.jobs[0];
        assert!(matches!(
            &job.referenced_inputs[..],
            [JobRef::Transfer(item)] if item.path() == std::path::Path::new("/data/study/img.nii")
        ));
    }

    #[test]
    fn test_order_roots_keeps_discovery_order() {
        use crate::scheduler::JobId;

        let roots: Vec<Element> = (0..4u32).map(|id| Element::Job(JobId::new(id))).collect();
        let ordered = order_roots(roots.clone(), &HashSet::new());
        assert_eq!(ordered, roots);

        // Only the constrained pair moves; the rest stay put.
        let deps = HashSet::from([Dependency::new(roots[3], roots[1])]);
        let ordered = order_roots(roots.clone(), &deps);
        assert_eq!(ordered, [roots[0], roots[2], roots[3], roots[1]]);
    }

    #[test]
    fn test_failed_conversion_still_restores_parameters() {
        let mut pipeline = Pipeline::new("cyclic");
        pipeline.add_process(process("a")).unwrap();
        pipeline.add_process(process("b")).unwrap();
        pipeline.link("a", "out_file", "b", "in_file").unwrap();
        pipeline.link("b", "out_file", "a", "in_file").unwrap();
        // Parameters stay unset so tokens are minted before the cycle is hit.

        let err = workflow_from_pipeline(&mut pipeline, &WorkflowConfig::new());
        assert!(matches!(err, Err(ConvertError::CycleDetected)));
        for unit in ["a", "b"] {
            for param in ["in_file", "out_file"] {
                assert!(
                    pipeline
                        .value_at(&UnitPath::from(unit), param)
                        .unwrap()
                        .is_undefined()
                );
            }
        }
    }
}
