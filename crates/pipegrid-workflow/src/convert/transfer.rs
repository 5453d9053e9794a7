//! Transfer discovery and propagation through the link topology.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pipegrid_pipeline::node::{LinkEnd, NodeKind, Plug};
use pipegrid_pipeline::param::{ParamValue, is_reserved_param};
use pipegrid_pipeline::pipeline::{Pipeline, UnitPath};
use tracing::trace;

use crate::TRACING_TARGET;
use crate::scheduler::{FileTransfer, TransferDirection};

/// Transfers keyed by owning unit, then by absolute path.
///
/// All units reached by one propagation share the same `Arc`, so one
/// boundary path maps to one transfer identity across the workflow. The
/// root unit carries every discovered transfer.
#[derive(Debug, Clone, Default)]
pub struct TransferMaps {
    inputs: HashMap<UnitPath, HashMap<PathBuf, Arc<FileTransfer>>>,
    outputs: HashMap<UnitPath, HashMap<PathBuf, Arc<FileTransfer>>>,
}

impl TransferMaps {
    fn side(&self, direction: TransferDirection) -> &HashMap<UnitPath, HashMap<PathBuf, Arc<FileTransfer>>> {
        if direction.is_output() {
            &self.outputs
        } else {
            &self.inputs
        }
    }

    pub(crate) fn record(&mut self, unit: UnitPath, item: &Arc<FileTransfer>) {
        let side = if item.direction.is_output() {
            &mut self.outputs
        } else {
            &mut self.inputs
        };
        side.entry(unit)
            .or_default()
            .insert(item.path.clone(), Arc::clone(item));
    }

    /// Returns the transfer recorded for a unit and path in one direction.
    pub fn get(
        &self,
        direction: TransferDirection,
        unit: &UnitPath,
        path: &Path,
    ) -> Option<&Arc<FileTransfer>> {
        self.side(direction).get(unit)?.get(path)
    }

    /// Returns every transfer recorded for a unit in one direction.
    pub fn for_unit(
        &self,
        direction: TransferDirection,
        unit: &UnitPath,
    ) -> impl Iterator<Item = &Arc<FileTransfer>> {
        self.side(direction)
            .get(unit)
            .into_iter()
            .flat_map(|entries| entries.values())
    }

    /// Returns a unit's transfers with both directions merged.
    pub fn merged_for_unit(&self, unit: &UnitPath) -> HashMap<PathBuf, Arc<FileTransfer>> {
        let mut merged = HashMap::new();
        for side in [&self.inputs, &self.outputs] {
            if let Some(entries) = side.get(unit) {
                for (path, item) in entries {
                    merged.insert(path.clone(), Arc::clone(item));
                }
            }
        }
        merged
    }

    /// Returns whether no transfers were discovered.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}

/// Discovers the transfers a pipeline needs on a remote resource.
///
/// Every exported path parameter whose value falls under one of the
/// transfer roots becomes a transfer, recorded on the root unit and
/// propagated through the link topology to every leaf unit that touches
/// the path.
pub fn compute_transfers(pipeline: &Pipeline, transfer_roots: &[PathBuf]) -> TransferMaps {
    let mut maps = TransferMaps::default();
    if transfer_roots.is_empty() {
        return maps;
    }
    for (spec, value) in pipeline.params().iter() {
        if is_reserved_param(&spec.name) || !spec.is_path() {
            continue;
        }
        for path in value_paths(value) {
            if !transfer_roots.iter().any(|root| is_under_root(path, root)) {
                continue;
            }
            let direction = TransferDirection::from_output(spec.output);
            let item = Arc::new(FileTransfer::new(direction, path));
            trace!(
                target: TRACING_TARGET,
                pipeline = %pipeline.name,
                param = %spec.name,
                path = %item.path.display(),
                "discovered transfer"
            );
            maps.record(UnitPath::root(), &item);
            propagate(pipeline, &UnitPath::root(), None, &spec.name, &item, &mut maps);
        }
    }
    maps
}

/// A path lies under a root only with a non-empty remainder; the root
/// itself is not transferable.
fn is_under_root(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .is_ok_and(|rest| !rest.as_os_str().is_empty())
}

fn value_paths(value: &ParamValue) -> Vec<&Path> {
    match value {
        ParamValue::Path(path) => vec![path.as_path()],
        ParamValue::List(items) => items.iter().flat_map(value_paths).collect(),
        _ => Vec::new(),
    }
}

/// Links followed from a plug for one transfer direction.
///
/// Input transfers chase consumers downstream, output transfers chase the
/// producer upstream.
fn next_ends(plug: &Plug, direction: TransferDirection) -> &[LinkEnd] {
    if direction.is_output() {
        &plug.links_from
    } else {
        &plug.links_to
    }
}

/// Walks one transfer through the link topology of a pipeline scope.
///
/// `node = None` addresses the scope's own entry boundary. Leaf units
/// terminate a walk and record the transfer; sub-pipelines recurse into
/// their own scope; switches pass the walk along the active branch only.
fn propagate(
    scope: &Pipeline,
    prefix: &UnitPath,
    node: Option<&str>,
    plug_name: &str,
    item: &Arc<FileTransfer>,
    maps: &mut TransferMaps,
) {
    let direction = item.direction;
    match node {
        None => {
            let Some(plug) = scope.entry_plug(plug_name) else {
                return;
            };
            if !plug.is_active() {
                return;
            }
            for end in next_ends(plug, direction) {
                follow(scope, prefix, end, item, maps);
            }
        }
        Some(name) => {
            let Some(found) = scope.node(name) else {
                return;
            };
            if !found.is_active() {
                return;
            }
            match &found.kind {
                NodeKind::Process(_) => {
                    maps.record(prefix.child(name), item);
                }
                NodeKind::SubPipeline(sub) => {
                    propagate(sub, &prefix.child(name), None, plug_name, item, maps);
                }
                NodeKind::Switch(switch) => {
                    let other = if direction.is_output() {
                        Some(switch.active_input_plug(plug_name))
                    } else {
                        switch.active_output_param(plug_name).map(str::to_owned)
                    };
                    let Some(other) = other else {
                        return;
                    };
                    let Some(plug) = found.plug(&other) else {
                        return;
                    };
                    if !plug.is_active() {
                        return;
                    }
                    for end in next_ends(plug, direction) {
                        follow(scope, prefix, end, item, maps);
                    }
                }
            }
        }
    }
}

fn follow(
    scope: &Pipeline,
    prefix: &UnitPath,
    end: &LinkEnd,
    item: &Arc<FileTransfer>,
    maps: &mut TransferMaps,
) {
    // A walk that comes back to the scope boundary stops there; the
    // enclosing scope already recorded the transfer.
    if let Some(target) = &end.node {
        propagate(scope, prefix, Some(target), &end.plug, item, maps);
    }
}
