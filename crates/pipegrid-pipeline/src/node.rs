//! Pipeline nodes, plugs, and link endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::process::Process;
use crate::switch::Switch;

/// One endpoint of a link between plugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEnd {
    /// Target node name; `None` addresses the enclosing pipeline's own
    /// entry boundary.
    pub node: Option<String>,
    /// Target plug name.
    pub plug: String,
}

impl LinkEnd {
    /// Creates an endpoint on a named node.
    pub fn node(node: impl Into<String>, plug: impl Into<String>) -> Self {
        Self {
            node: Some(node.into()),
            plug: plug.into(),
        }
    }

    /// Creates an endpoint on the enclosing pipeline's entry boundary.
    pub fn entry(plug: impl Into<String>) -> Self {
        Self {
            node: None,
            plug: plug.into(),
        }
    }
}

/// A connection point on a node, carrying the link topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plug {
    /// Plug name.
    pub name: String,
    /// Whether data flows out of the node through this plug.
    pub output: bool,
    /// Whether the plug is enabled.
    pub enabled: bool,
    /// Whether the plug is activated by the current pipeline configuration.
    pub activated: bool,
    /// Endpoints this plug feeds into.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links_to: Vec<LinkEnd>,
    /// Endpoints feeding into this plug.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links_from: Vec<LinkEnd>,
}

impl Plug {
    /// Creates an enabled, activated plug with no links.
    pub fn new(name: impl Into<String>, output: bool) -> Self {
        Self {
            name: name.into(),
            output,
            enabled: true,
            activated: true,
            links_to: Vec::new(),
            links_from: Vec::new(),
        }
    }

    /// Returns whether links through this plug are followed.
    pub const fn is_active(&self) -> bool {
        self.enabled && self.activated
    }
}

/// The payload of a pipeline node.
///
/// An explicit discriminated union; converters match on the variant instead
/// of inspecting runtime shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A leaf computational unit.
    Process(Process),
    /// A nested sub-pipeline.
    SubPipeline(Pipeline),
    /// A conditional branch node.
    Switch(Switch),
}

impl NodeKind {
    /// Returns whether this node wraps a leaf process.
    pub const fn is_process(&self) -> bool {
        matches!(self, NodeKind::Process(_))
    }

    /// Returns whether this node wraps a nested sub-pipeline.
    pub const fn is_subpipeline(&self) -> bool {
        matches!(self, NodeKind::SubPipeline(_))
    }

    /// Returns whether this node is a conditional branch node.
    pub const fn is_switch(&self) -> bool {
        matches!(self, NodeKind::Switch(_))
    }

    /// Returns this node's process, if it wraps one.
    pub fn as_process(&self) -> Option<&Process> {
        match self {
            NodeKind::Process(process) => Some(process),
            _ => None,
        }
    }

    /// Returns this node's sub-pipeline, if it wraps one.
    pub fn as_subpipeline(&self) -> Option<&Pipeline> {
        match self {
            NodeKind::SubPipeline(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    /// Returns this node's switch, if it is one.
    pub fn as_switch(&self) -> Option<&Switch> {
        match self {
            NodeKind::Switch(switch) => Some(switch),
            _ => None,
        }
    }
}

/// A named node in a pipeline with its plugs and activation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineNode {
    /// Node name, unique within the enclosing pipeline.
    pub name: String,
    /// Whether the node is enabled.
    pub enabled: bool,
    /// Whether the node is activated by the current pipeline configuration.
    pub activated: bool,
    /// Node payload.
    pub kind: NodeKind,
    /// Plugs by name.
    pub plugs: BTreeMap<String, Plug>,
}

impl PipelineNode {
    /// Creates an enabled, activated node.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            activated: true,
            kind,
            plugs: BTreeMap::new(),
        }
    }

    /// Returns a plug by name.
    pub fn plug(&self, name: &str) -> Option<&Plug> {
        self.plugs.get(name)
    }

    /// Returns whether the node takes part in the current execution.
    pub const fn is_active(&self) -> bool {
        self.enabled && self.activated
    }
}
