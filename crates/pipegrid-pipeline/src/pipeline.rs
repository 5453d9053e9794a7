//! Hierarchical pipeline: nodes, link topology, and addressed parameter
//! access.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::TRACING_TARGET;
use crate::error::{PipelineError, PipelineResult};
use crate::graph::StructuralGraph;
use crate::node::{LinkEnd, NodeKind, PipelineNode, Plug};
use crate::param::{ParamSet, ParamSpec, ParamValue, is_reserved_param};
use crate::process::Process;
use crate::switch::Switch;

/// Address of a node from the top pipeline, as a sequence of node names.
///
/// The empty path addresses the top pipeline itself.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitPath(Vec<String>);

impl UnitPath {
    /// Returns the path of the top pipeline itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns whether this path addresses the top pipeline.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path extended by one node name.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_owned());
        Self(segments)
    }

    /// Returns the node names from the top pipeline down.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Splits off the first segment.
    pub fn split_first(&self) -> Option<(&str, &[String])> {
        self.0
            .split_first()
            .map(|(first, rest)| (first.as_str(), rest))
    }

    /// Returns the innermost node name.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for UnitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<pipeline>")
        } else {
            f.write_str(&self.0.join("/"))
        }
    }
}

impl fmt::Debug for UnitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl From<&str> for UnitPath {
    fn from(path: &str) -> Self {
        if path.is_empty() {
            Self::root()
        } else {
            Self(path.split('/').map(str::to_owned).collect())
        }
    }
}

/// An unset path-typed parameter found on a reachable leaf unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyParam {
    /// Address of the owning unit.
    pub path: UnitPath,
    /// Parameter name.
    pub name: String,
    /// Whether the parameter may be left unset.
    pub optional: bool,
}

/// A hierarchical pipeline of processes, switches, and nested sub-pipelines.
///
/// Nodes are stored name-ordered so scans and graph derivation are
/// reproducible across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name, also used as the workflow name.
    pub name: String,
    params: ParamSet,
    entry_plugs: BTreeMap<String, Plug>,
    nodes: BTreeMap<String, PipelineNode>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ParamSet::new(),
            entry_plugs: BTreeMap::new(),
            nodes: BTreeMap::new(),
        }
    }

    /// Returns the exported pipeline-level parameters.
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    /// Sets the value of an exported pipeline-level parameter.
    pub fn set_param_value(&mut self, name: &str, value: ParamValue) -> PipelineResult<()> {
        self.params.set_value(name, value)
    }

    /// Returns the entry-boundary plug for an exported parameter.
    pub fn entry_plug(&self, name: &str) -> Option<&Plug> {
        self.entry_plugs.get(name)
    }

    /// Returns a node by name.
    pub fn node(&self, name: &str) -> Option<&PipelineNode> {
        self.nodes.get(name)
    }

    /// Returns a mutable node by name.
    pub fn node_mut(&mut self, name: &str) -> Option<&mut PipelineNode> {
        self.nodes.get_mut(name)
    }

    /// Returns all nodes in name order.
    pub fn nodes(&self) -> impl Iterator<Item = &PipelineNode> {
        self.nodes.values()
    }

    /// Adds a leaf process node; plugs are created from its parameters.
    pub fn add_process(&mut self, process: Process) -> PipelineResult<()> {
        let plugs: Vec<Plug> = process
            .params()
            .specs()
            .filter(|spec| !is_reserved_param(&spec.name))
            .map(|spec| Plug::new(&spec.name, spec.output))
            .collect();
        let name = process.name.clone();
        let mut node = PipelineNode::new(name, NodeKind::Process(process));
        for plug in plugs {
            node.plugs.insert(plug.name.clone(), plug);
        }
        self.insert_node(node)
    }

    /// Adds a nested sub-pipeline node; plugs mirror its exported
    /// parameters.
    pub fn add_subpipeline(&mut self, name: impl Into<String>, sub: Pipeline) -> PipelineResult<()> {
        let plugs: Vec<Plug> = sub
            .params
            .specs()
            .map(|spec| Plug::new(&spec.name, spec.output))
            .collect();
        let mut node = PipelineNode::new(name.into(), NodeKind::SubPipeline(sub));
        for plug in plugs {
            node.plugs.insert(plug.name.clone(), plug);
        }
        self.insert_node(node)
    }

    /// Adds a conditional branch node.
    ///
    /// Input plugs of branches other than the active one are deactivated.
    pub fn add_switch(&mut self, name: impl Into<String>, switch: Switch) -> PipelineResult<()> {
        let name = name.into();
        let mut node = PipelineNode::new(&name, NodeKind::Switch(switch.clone()));
        for branch in &switch.branches {
            for param in &switch.params {
                let mut plug = Plug::new(Switch::input_plug(branch, param), false);
                plug.activated = *branch == switch.active;
                node.plugs.insert(plug.name.clone(), plug);
            }
        }
        for param in &switch.params {
            let plug = Plug::new(param, true);
            node.plugs.insert(plug.name.clone(), plug);
        }
        self.insert_node(node)
    }

    fn insert_node(&mut self, node: PipelineNode) -> PipelineResult<()> {
        if self.nodes.contains_key(&node.name) {
            return Err(PipelineError::DuplicateNode {
                name: node.name.clone(),
            });
        }
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Links a source plug to a destination plug between two nodes.
    pub fn link(
        &mut self,
        from_node: &str,
        from_plug: &str,
        to_node: &str,
        to_plug: &str,
    ) -> PipelineResult<()> {
        self.require_plug(from_node, from_plug)?;
        self.require_plug(to_node, to_plug)?;

        let source = self.plug_mut(from_node, from_plug)?;
        source.links_to.push(LinkEnd::node(to_node, to_plug));
        let dest = self.plug_mut(to_node, to_plug)?;
        dest.links_from.push(LinkEnd::node(from_node, from_plug));
        Ok(())
    }

    /// Exports a node plug as a pipeline-level parameter.
    ///
    /// The entry-boundary plug is wired to the node plug in the direction
    /// given by the spec's output flag.
    pub fn export_param(
        &mut self,
        spec: ParamSpec,
        node: &str,
        plug: &str,
    ) -> PipelineResult<()> {
        self.require_plug(node, plug)?;

        let mut entry = Plug::new(&spec.name, spec.output);
        if spec.output {
            entry.links_from.push(LinkEnd::node(node, plug));
            self.plug_mut(node, plug)?
                .links_to
                .push(LinkEnd::entry(&spec.name));
        } else {
            entry.links_to.push(LinkEnd::node(node, plug));
            self.plug_mut(node, plug)?
                .links_from
                .push(LinkEnd::entry(&spec.name));
        }
        self.entry_plugs.insert(spec.name.clone(), entry);
        self.params.add(spec);
        Ok(())
    }

    fn require_plug(&self, node: &str, plug: &str) -> PipelineResult<()> {
        let found = self
            .nodes
            .get(node)
            .ok_or_else(|| PipelineError::UnknownNode { name: node.into() })?;
        if found.plug(plug).is_none() {
            return Err(PipelineError::UnknownPlug {
                node: node.into(),
                plug: plug.into(),
            });
        }
        Ok(())
    }

    fn plug_mut(&mut self, node: &str, plug: &str) -> PipelineResult<&mut Plug> {
        self.nodes
            .get_mut(node)
            .ok_or_else(|| PipelineError::UnknownNode { name: node.into() })?
            .plugs
            .get_mut(plug)
            .ok_or_else(|| PipelineError::UnknownPlug {
                node: node.into(),
                plug: plug.into(),
            })
    }

    /// Returns the node addressed by a path.
    pub fn node_at(&self, path: &UnitPath) -> PipelineResult<&PipelineNode> {
        let (first, rest) = path.split_first().ok_or_else(|| PipelineError::UnknownNode {
            name: path.to_string(),
        })?;
        let mut node = self
            .nodes
            .get(first)
            .ok_or_else(|| PipelineError::UnknownNode { name: first.into() })?;
        for segment in rest {
            let sub = node
                .kind
                .as_subpipeline()
                .ok_or_else(|| PipelineError::UnknownNode {
                    name: segment.clone(),
                })?;
            node = sub
                .nodes
                .get(segment)
                .ok_or_else(|| PipelineError::UnknownNode {
                    name: segment.clone(),
                })?;
        }
        Ok(node)
    }

    fn node_at_mut(&mut self, path: &UnitPath) -> PipelineResult<&mut PipelineNode> {
        let (first, rest) = path.split_first().ok_or_else(|| PipelineError::UnknownNode {
            name: path.to_string(),
        })?;
        let first = first.to_owned();
        let rest = rest.to_vec();
        let mut node = self
            .nodes
            .get_mut(&first)
            .ok_or_else(|| PipelineError::UnknownNode { name: first })?;
        for segment in rest {
            let sub = match &mut node.kind {
                NodeKind::SubPipeline(sub) => sub,
                _ => {
                    return Err(PipelineError::UnknownNode { name: segment });
                }
            };
            node = sub
                .nodes
                .get_mut(&segment)
                .ok_or_else(|| PipelineError::UnknownNode { name: segment.clone() })?;
        }
        Ok(node)
    }

    /// Returns the process addressed by a path.
    pub fn process_at(&self, path: &UnitPath) -> PipelineResult<&Process> {
        self.node_at(path)?
            .kind
            .as_process()
            .ok_or_else(|| PipelineError::NotAProcess {
                name: path.to_string(),
            })
    }

    /// Returns the declaration of a parameter on an addressed process.
    pub fn spec_at(&self, path: &UnitPath, name: &str) -> PipelineResult<&ParamSpec> {
        self.process_at(path)?
            .params()
            .spec(name)
            .ok_or_else(|| PipelineError::UnknownParameter { name: name.into() })
    }

    /// Returns the value of a parameter on an addressed process.
    pub fn value_at(&self, path: &UnitPath, name: &str) -> PipelineResult<&ParamValue> {
        self.process_at(path)?.params().value(name)
    }

    /// Sets the value of a parameter on an addressed process.
    pub fn set_value_at(
        &mut self,
        path: &UnitPath,
        name: &str,
        value: ParamValue,
    ) -> PipelineResult<()> {
        let node = self.node_at_mut(path)?;
        match &mut node.kind {
            NodeKind::Process(process) => process.params_mut().set_value(name, value),
            _ => Err(PipelineError::NotAProcess {
                name: path.to_string(),
            }),
        }
    }

    /// Finds every unset path-typed parameter on reachable leaf units.
    ///
    /// Disabled or deactivated nodes are skipped; bookkeeping parameters are
    /// never reported.
    pub fn find_empty_parameters(&self) -> Vec<EmptyParam> {
        let mut found = Vec::new();
        self.collect_empty(&UnitPath::root(), &mut found);
        trace!(
            target: TRACING_TARGET,
            pipeline = %self.name,
            count = found.len(),
            "scanned for empty path parameters"
        );
        found
    }

    fn collect_empty(&self, prefix: &UnitPath, found: &mut Vec<EmptyParam>) {
        for (name, node) in &self.nodes {
            if !node.is_active() {
                continue;
            }
            match &node.kind {
                NodeKind::Process(process) => {
                    for (spec, value) in process.params().iter() {
                        if is_reserved_param(&spec.name) || !spec.is_path() {
                            continue;
                        }
                        if value.is_undefined() {
                            found.push(EmptyParam {
                                path: prefix.child(name),
                                name: spec.name.clone(),
                                optional: spec.optional,
                            });
                        }
                    }
                }
                NodeKind::SubPipeline(sub) => sub.collect_empty(&prefix.child(name), found),
                NodeKind::Switch(_) => {}
            }
        }
    }

    /// Derives the structural graph of this pipeline.
    ///
    /// Process nodes become leaf nodes, sub-pipelines become group nodes
    /// with their own recursively derived graph; switch nodes are not
    /// structural, an edge is derived through a switch only along its
    /// currently active branch.
    pub fn structural_graph(&self) -> PipelineResult<StructuralGraph> {
        let graph = self.structural_graph_at(&UnitPath::root())?;
        trace!(
            target: TRACING_TARGET,
            pipeline = %self.name,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "derived structural graph"
        );
        Ok(graph)
    }

    fn structural_graph_at(&self, prefix: &UnitPath) -> PipelineResult<StructuralGraph> {
        let mut graph = StructuralGraph::new();
        for (name, node) in &self.nodes {
            if !node.is_active() {
                continue;
            }
            match &node.kind {
                NodeKind::Process(_) => {
                    graph.add_leaf(name.clone(), vec![prefix.child(name)]);
                }
                NodeKind::SubPipeline(sub) => {
                    graph.add_group(name.clone(), sub.structural_graph_at(&prefix.child(name))?);
                }
                NodeKind::Switch(_) => {}
            }
        }

        for (name, node) in &self.nodes {
            if !node.is_active() || node.kind.is_switch() {
                continue;
            }
            let mut targets = BTreeSet::new();
            for plug in node.plugs.values() {
                if !plug.output || !plug.is_active() {
                    continue;
                }
                for end in &plug.links_to {
                    self.downstream_units(end, &mut targets);
                }
            }
            for target in targets {
                if target != *name && graph.contains(&target) {
                    graph.connect(name, &target)?;
                }
            }
        }
        Ok(graph)
    }

    /// Collects the structural nodes reachable from a link endpoint,
    /// passing through switches along their active branch only.
    fn downstream_units(&self, end: &LinkEnd, acc: &mut BTreeSet<String>) {
        let Some(node_name) = &end.node else {
            return;
        };
        let Some(node) = self.nodes.get(node_name) else {
            return;
        };
        if !node.is_active() {
            return;
        }
        match &node.kind {
            NodeKind::Switch(switch) => {
                let Some(param) = switch.active_output_param(&end.plug) else {
                    return;
                };
                let Some(out_plug) = node.plug(param) else {
                    return;
                };
                if !out_plug.is_active() {
                    return;
                }
                for next in &out_plug.links_to {
                    self.downstream_units(next, acc);
                }
            }
            _ => {
                acc.insert(node_name.clone());
            }
        }
    }
}
