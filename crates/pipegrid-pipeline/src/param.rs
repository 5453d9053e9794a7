//! Typed process parameters and their values.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};

use crate::error::{PipelineError, PipelineResult};

/// Bookkeeping parameter names that never take part in command lines,
/// temporary-path allocation, or transfer detection.
pub const RESERVED_PARAMS: [&str; 2] = ["nodes_activation", "selection_changed"];

/// Returns whether a parameter name is reserved for bookkeeping.
pub fn is_reserved_param(name: &str) -> bool {
    RESERVED_PARAMS.contains(&name)
}

/// The declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParamKind {
    /// Plain text value.
    Text,
    /// A path naming a regular file.
    File,
    /// A path naming a directory.
    Directory,
    /// A path whose file/directory kind is not declared.
    ///
    /// Path-typed for translation and transfer purposes, but not
    /// classifiable for temporary-path allocation.
    Path,
}

impl ParamKind {
    /// Returns whether values of this kind are filesystem paths.
    pub const fn is_path(&self) -> bool {
        matches!(self, ParamKind::File | ParamKind::Directory | ParamKind::Path)
    }
}

/// Placeholder minted for a parameter whose concrete path is assigned by the
/// scheduler at run time.
///
/// A distinct tagged value rather than a sentinel string, so substitution
/// logic can pattern-match on it unambiguously.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("temp#{_0}")]
#[display("temp#{_0}")]
#[serde(transparent)]
pub struct TempToken(u32);

impl TempToken {
    /// Creates a token with the given identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the token identifier.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }
}

/// The current value of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamValue {
    /// No value assigned.
    Undefined,
    /// Plain text value.
    Text(String),
    /// Filesystem path value.
    Path(PathBuf),
    /// Nested list of values.
    List(Vec<ParamValue>),
    /// Placeholder for a scheduler-managed temporary path.
    Temp(TempToken),
}

impl ParamValue {
    /// Returns whether no value is assigned.
    pub const fn is_undefined(&self) -> bool {
        matches!(self, ParamValue::Undefined)
    }

    /// Returns the value as a path, if it is one.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ParamValue::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Returns the value as a temporary token, if it is one.
    pub fn as_temp(&self) -> Option<TempToken> {
        match self {
            ParamValue::Temp(token) => Some(*token),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<PathBuf> for ParamValue {
    fn from(value: PathBuf) -> Self {
        ParamValue::Path(value)
    }
}

/// Declaration of a single parameter on a process or pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Declared value kind.
    pub kind: ParamKind,
    /// Whether the parameter is produced rather than consumed.
    pub output: bool,
    /// Whether the parameter may be left unset.
    pub optional: bool,
    /// Preferred file-name suffixes, most preferred first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_suffixes: Vec<String>,
}

impl ParamSpec {
    /// Creates an input parameter spec.
    pub fn input(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            output: false,
            optional: false,
            allowed_suffixes: Vec::new(),
        }
    }

    /// Creates an output parameter spec.
    pub fn output(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            output: true,
            ..Self::input(name, kind)
        }
    }

    /// Marks the parameter as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sets the preferred file-name suffixes.
    pub fn with_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Returns whether values of this parameter are filesystem paths.
    pub const fn is_path(&self) -> bool {
        self.kind.is_path()
    }
}

/// An ordered set of parameter declarations with their current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    specs: Vec<ParamSpec>,
    values: HashMap<String, ParamValue>,
}

impl ParamSet {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter declaration with an undefined value.
    pub fn add(&mut self, spec: ParamSpec) {
        self.values
            .insert(spec.name.clone(), ParamValue::Undefined);
        self.specs.push(spec);
    }

    /// Returns the declarations in declaration order.
    pub fn specs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.iter()
    }

    /// Returns the declaration for a parameter.
    pub fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Returns the current value of a parameter.
    pub fn value(&self, name: &str) -> PipelineResult<&ParamValue> {
        self.values
            .get(name)
            .ok_or_else(|| PipelineError::UnknownParameter { name: name.into() })
    }

    /// Sets the current value of a parameter.
    pub fn set_value(&mut self, name: &str, value: ParamValue) -> PipelineResult<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(PipelineError::UnknownParameter { name: name.into() }),
        }
    }

    /// Returns `(spec, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamSpec, &ParamValue)> {
        self.specs.iter().map(|spec| {
            let value = self
                .values
                .get(&spec.name)
                .unwrap_or(&ParamValue::Undefined);
            (spec, value)
        })
    }

    /// Returns the number of declared parameters.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns whether no parameters are declared.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_kind_is_path() {
        assert!(ParamKind::File.is_path());
        assert!(ParamKind::Directory.is_path());
        assert!(ParamKind::Path.is_path());
        assert!(!ParamKind::Text.is_path());
    }

    #[test]
    fn test_reserved_params() {
        assert!(is_reserved_param("nodes_activation"));
        assert!(is_reserved_param("selection_changed"));
        assert!(!is_reserved_param("out_file"));
    }

    #[test]
    fn test_param_set_ordering() {
        let mut params = ParamSet::new();
        params.add(ParamSpec::input("b", ParamKind::Text));
        params.add(ParamSpec::input("a", ParamKind::File));
        let names: Vec<_> = params.specs().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_param_set_values() {
        let mut params = ParamSet::new();
        params.add(ParamSpec::input("in_file", ParamKind::File));
        assert!(params.value("in_file").unwrap().is_undefined());

        params
            .set_value("in_file", ParamValue::Path("/tmp/x".into()))
            .unwrap();
        assert_eq!(
            params.value("in_file").unwrap().as_path(),
            Some(Path::new("/tmp/x"))
        );

        let err = params.set_value("missing", ParamValue::Undefined);
        assert!(matches!(
            err,
            Err(PipelineError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_temp_token_value() {
        let token = TempToken::new(3);
        let value = ParamValue::Temp(token);
        assert_eq!(value.as_temp(), Some(token));
        assert_eq!(token.to_string(), "temp#3");
        assert_eq!(format!("{token:?}"), "temp#3");
    }
}
