//! Leaf computational units and their command lines.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::param::{ParamSet, ParamSpec, ParamValue, TempToken};

/// One token of a process command-line template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandToken {
    /// A fixed argument emitted verbatim.
    Literal(String),
    /// A reference to a parameter, rendered from its current value.
    Param(String),
}

impl CommandToken {
    /// Creates a literal token.
    pub fn lit(text: impl Into<String>) -> Self {
        CommandToken::Literal(text.into())
    }

    /// Creates a parameter reference token.
    pub fn param(name: impl Into<String>) -> Self {
        CommandToken::Param(name.into())
    }
}

/// One rendered command-line argument.
///
/// Rendered values still carry their provenance (paths and temporary tokens
/// stay tagged) so downstream substitution can pattern-match instead of
/// comparing raw strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CmdValue {
    /// Plain textual argument.
    Text(String),
    /// Filesystem path argument.
    Path(PathBuf),
    /// Placeholder for a scheduler-managed temporary path.
    Temp(TempToken),
    /// Nested argument list.
    List(Vec<CmdValue>),
}

/// A single schedulable computational step with a command line and typed
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Process name, also used as the job name.
    pub name: String,
    params: ParamSet,
    command: Vec<CommandToken>,
}

impl Process {
    /// Creates a process with no parameters and an empty command template.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ParamSet::new(),
            command: Vec::new(),
        }
    }

    /// Adds a parameter declaration.
    pub fn with_param(mut self, spec: ParamSpec) -> Self {
        self.params.add(spec);
        self
    }

    /// Sets the command-line template.
    pub fn with_command(mut self, tokens: Vec<CommandToken>) -> Self {
        self.command = tokens;
        self
    }

    /// Returns the parameter set.
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    /// Returns the mutable parameter set.
    pub fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    /// Renders the ordered command-line argument list from the template and
    /// the current parameter values.
    ///
    /// Parameters with undefined values are omitted.
    pub fn command_line(&self) -> Vec<CmdValue> {
        self.command
            .iter()
            .filter_map(|token| match token {
                CommandToken::Literal(text) => Some(CmdValue::Text(text.clone())),
                CommandToken::Param(name) => self
                    .params
                    .value(name)
                    .ok()
                    .and_then(render_value),
            })
            .collect()
    }
}

fn render_value(value: &ParamValue) -> Option<CmdValue> {
    match value {
        ParamValue::Undefined => None,
        ParamValue::Text(text) => Some(CmdValue::Text(text.clone())),
        ParamValue::Path(path) => Some(CmdValue::Path(path.clone())),
        ParamValue::Temp(token) => Some(CmdValue::Temp(*token)),
        ParamValue::List(items) => Some(CmdValue::List(
            items.iter().filter_map(render_value).collect(),
        )),
    }
}
