//! Temporary-path allocation with scoped restoration.

use std::collections::HashMap;

use pipegrid_pipeline::param::{ParamKind, ParamValue, TempToken};
use pipegrid_pipeline::pipeline::{Pipeline, UnitPath};
use tracing::debug;

use crate::TRACING_TARGET;
use crate::error::{ConvertError, ConvertResult};
use crate::scheduler::TemporaryPath;

/// What one minted token stands for.
#[derive(Debug, Clone)]
pub struct TempEntry {
    /// The scheduler temp-path handle the token resolves to.
    pub path: TemporaryPath,
    /// Address of the owning unit.
    pub unit: UnitPath,
    /// Parameter name on the owning unit.
    pub param: String,
    /// Whether the parameter is optional.
    pub optional: bool,
}

/// Mapping from minted tokens to their temp-path handles.
#[derive(Debug, Clone, Default)]
pub struct TempMap {
    entries: HashMap<TempToken, TempEntry>,
}

impl TempMap {
    /// Returns the entry for a token.
    pub fn get(&self, token: TempToken) -> Option<&TempEntry> {
        self.entries.get(&token)
    }

    /// Returns all entries.
    pub fn iter(&self) -> impl Iterator<Item = (TempToken, &TempEntry)> {
        self.entries.iter().map(|(token, entry)| (*token, entry))
    }

    /// Returns the number of minted tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no tokens were minted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scoped temporary-path allocation over a pipeline.
///
/// Minting overwrites the live parameter values on the pipeline with
/// tokens; dropping the scope restores every touched parameter to
/// `Undefined`, on every exit path of the enclosing conversion.
#[derive(Debug)]
pub struct TempScope<'a> {
    pipeline: &'a mut Pipeline,
    map: TempMap,
}

impl<'a> TempScope<'a> {
    /// Finds every unset path-typed parameter, mints a token per parameter,
    /// and assigns the tokens to the live parameter values.
    ///
    /// Classification runs before any mutation, so a failure leaves the
    /// pipeline untouched.
    pub fn allocate(pipeline: &'a mut Pipeline) -> ConvertResult<Self> {
        let empty = pipeline.find_empty_parameters();
        let mut staged = Vec::with_capacity(empty.len());
        for (id, found) in empty.into_iter().enumerate() {
            let spec = pipeline.spec_at(&found.path, &found.name)?;
            let is_directory = match spec.kind {
                ParamKind::Directory => true,
                ParamKind::File => false,
                ParamKind::Path | ParamKind::Text => {
                    return Err(ConvertError::UnclassifiedParameter {
                        unit: found.path,
                        name: found.name,
                    });
                }
            };
            let suffix = spec.allowed_suffixes.first().cloned().unwrap_or_default();
            let token = TempToken::new(id as u32);
            staged.push((
                token,
                TempEntry {
                    path: TemporaryPath::new(id as u32, is_directory, suffix),
                    unit: found.path,
                    param: found.name,
                    optional: found.optional,
                },
            ));
        }

        let mut map = TempMap::default();
        for (token, entry) in staged {
            pipeline.set_value_at(&entry.unit, &entry.param, ParamValue::Temp(token))?;
            map.entries.insert(token, entry);
        }
        debug!(
            target: TRACING_TARGET,
            pipeline = %pipeline.name,
            tokens = map.len(),
            "assigned temporary path tokens"
        );
        Ok(Self { pipeline, map })
    }

    /// Returns the pipeline, with tokens assigned.
    pub fn pipeline(&self) -> &Pipeline {
        self.pipeline
    }

    /// Returns the token map.
    pub fn temp_map(&self) -> &TempMap {
        &self.map
    }
}

impl Drop for TempScope<'_> {
    fn drop(&mut self) {
        for entry in self.map.entries.values() {
            // Addressing cannot fail here: entries were minted from this
            // pipeline and restoration must not panic mid-unwind.
            let _ = self
                .pipeline
                .set_value_at(&entry.unit, &entry.param, ParamValue::Undefined);
        }
        debug!(
            target: TRACING_TARGET,
            pipeline = %self.pipeline.name,
            tokens = self.map.len(),
            "restored temporary path parameters"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipegrid_pipeline::param::ParamSpec;
    use pipegrid_pipeline::process::Process;

    fn pipeline_with(spec: ParamSpec) -> Pipeline {
        let mut pipeline = Pipeline::new("main");
        pipeline
            .add_process(Process::new("unit").with_param(spec))
            .unwrap();
        pipeline
    }

    #[test]
    fn test_allocate_assigns_tokens_and_restores() {
        let mut pipeline = pipeline_with(
            ParamSpec::output("result", ParamKind::File).with_suffixes([".nii"]),
        );
        let unit = UnitPath::from("unit");

        {
            let scope = TempScope::allocate(&mut pipeline).unwrap();
            assert_eq!(scope.temp_map().len(), 1);
            let (token, entry) = scope.temp_map().iter().next().unwrap();
            assert_eq!(entry.unit, unit);
            assert_eq!(entry.param, "result");
            assert_eq!(entry.path.suffix, ".nii");
            assert!(!entry.path.is_directory);
            assert_eq!(
                scope.pipeline().value_at(&unit, "result").unwrap(),
                &ParamValue::Temp(token)
            );
        }

        // Scope dropped: the parameter is undefined again.
        assert!(pipeline.value_at(&unit, "result").unwrap().is_undefined());
    }

    #[test]
    fn test_allocate_directory_kind() {
        let mut pipeline = pipeline_with(ParamSpec::output("work_dir", ParamKind::Directory));
        let scope = TempScope::allocate(&mut pipeline).unwrap();
        let (_, entry) = scope.temp_map().iter().next().unwrap();
        assert!(entry.path.is_directory);
        assert!(entry.path.suffix.is_empty());
    }

    #[test]
    fn test_allocate_records_optional_flag() {
        let mut pipeline =
            pipeline_with(ParamSpec::output("maybe", ParamKind::File).optional());
        let scope = TempScope::allocate(&mut pipeline).unwrap();
        let (_, entry) = scope.temp_map().iter().next().unwrap();
        assert!(entry.optional);
    }

    #[test]
    fn test_unclassified_parameter_fails_without_mutation() {
        let mut pipeline = pipeline_with(ParamSpec::output("loose", ParamKind::Path));
        {
            let err = TempScope::allocate(&mut pipeline);
            assert!(matches!(
                err,
                Err(ConvertError::UnclassifiedParameter { .. })
            ));
        }
        // Nothing was assigned before the failure.
        assert!(
            pipeline
                .value_at(&UnitPath::from("unit"), "loose")
                .unwrap()
                .is_undefined()
        );
    }

    #[test]
    fn test_defined_values_are_not_touched() {
        let mut pipeline = pipeline_with(ParamSpec::output("result", ParamKind::File));
        pipeline
            .set_value_at(
                &UnitPath::from("unit"),
                "result",
                ParamValue::Path("/out.nii".into()),
            )
            .unwrap();
        let scope = TempScope::allocate(&mut pipeline).unwrap();
        assert!(scope.temp_map().is_empty());
    }
}
