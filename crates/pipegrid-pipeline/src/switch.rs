//! Conditional branch nodes.

use serde::{Deserialize, Serialize};

/// Separator between the branch name and the routed parameter name in an
/// input plug name.
pub const SWITCH_SEPARATOR: &str = "_switch_";

/// A conditional-routing node selecting one of several named branches at
/// pipeline configuration time.
///
/// Input plugs follow the `<branch>_switch_<param>` naming convention;
/// output plugs carry the bare parameter names. Exactly one branch is
/// active per execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    /// Name of the currently active branch.
    pub active: String,
    /// All branch names.
    pub branches: Vec<String>,
    /// Routed parameter names.
    pub params: Vec<String>,
}

impl Switch {
    /// Creates a switch with the first branch active.
    ///
    /// Returns `None` when no branches are given.
    pub fn new<I, J>(branches: I, params: J) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        let branches: Vec<String> = branches.into_iter().collect();
        let active = branches.first()?.clone();
        Some(Self {
            active,
            branches,
            params: params.into_iter().collect(),
        })
    }

    /// Selects the active branch.
    ///
    /// Returns `false` when the branch is unknown; the selection is left
    /// unchanged in that case.
    pub fn select(&mut self, branch: &str) -> bool {
        if self.branches.iter().any(|b| b == branch) {
            self.active = branch.to_owned();
            true
        } else {
            false
        }
    }

    /// Returns the input plug name for a branch/parameter pair.
    pub fn input_plug(branch: &str, param: &str) -> String {
        format!("{branch}{SWITCH_SEPARATOR}{param}")
    }

    /// Returns the input plug name on the active branch for a parameter.
    pub fn active_input_plug(&self, param: &str) -> String {
        Self::input_plug(&self.active, param)
    }

    /// Returns the output parameter name for an input plug name, when the
    /// plug belongs to the currently active branch.
    pub fn active_output_param<'a>(&self, input_plug: &'a str) -> Option<&'a str> {
        let prefix = format!("{}{}", self.active, SWITCH_SEPARATOR);
        input_plug.strip_prefix(prefix.as_str())
    }
}
