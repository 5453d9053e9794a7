//! Conversion of one leaf unit into a schedulable job.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use pipegrid_pipeline::param::{ParamValue, is_reserved_param};
use pipegrid_pipeline::pipeline::UnitPath;
use pipegrid_pipeline::process::{CmdValue, Process};
use tracing::trace;

use crate::TRACING_TARGET;
use crate::config::PathTranslation;
use crate::convert::shared::{SharedPathMap, translate_path};
use crate::convert::temp::TempMap;
use crate::convert::transfer::TransferMaps;
use crate::error::{ConvertError, ConvertResult};
use crate::scheduler::{FileTransfer, Job, JobArg, JobRef, TransferDirection};

/// Builds the job for one leaf unit.
///
/// The rendered command line is substituted argument by argument: temporary
/// tokens resolve through the token map, concrete paths translate to shared
/// references where a translation base matches, fall back to the unit's
/// transfers, and stay plain paths otherwise. Referenced inputs and outputs
/// are the union of the temporaries the parameters carry and every
/// transfer recorded against the unit, regardless of how the command
/// substitutes the paths.
pub fn build_job(
    unit: &UnitPath,
    process: &Process,
    temp_map: &TempMap,
    translations: &[PathTranslation],
    shared_map: &mut SharedPathMap,
    transfers: &TransferMaps,
) -> ConvertResult<Job> {
    let unit_transfers = transfers.merged_for_unit(unit);

    let mut referenced_inputs = Vec::new();
    let mut referenced_outputs = Vec::new();
    for (spec, value) in process.params().iter() {
        if is_reserved_param(&spec.name) {
            continue;
        }
        let refs = if spec.output {
            &mut referenced_outputs
        } else {
            &mut referenced_inputs
        };
        collect_temp_refs(unit, value, temp_map, refs)?;
    }
    for item in transfers.for_unit(TransferDirection::Input, unit) {
        referenced_inputs.push(JobRef::Transfer(Arc::clone(item)));
    }
    for item in transfers.for_unit(TransferDirection::Output, unit) {
        referenced_outputs.push(JobRef::Transfer(Arc::clone(item)));
    }

    let command = process
        .command_line()
        .into_iter()
        .map(|arg| {
            substitute(
                unit,
                arg,
                temp_map,
                translations,
                shared_map,
                &unit_transfers,
            )
        })
        .collect::<ConvertResult<Vec<_>>>()?;

    trace!(
        target: TRACING_TARGET,
        unit = %unit,
        args = command.len(),
        inputs = referenced_inputs.len(),
        outputs = referenced_outputs.len(),
        "built job"
    );
    Ok(Job::new(
        process.name.clone(),
        command,
        referenced_inputs,
        referenced_outputs,
    ))
}

fn collect_temp_refs(
    unit: &UnitPath,
    value: &ParamValue,
    temp_map: &TempMap,
    refs: &mut Vec<JobRef>,
) -> ConvertResult<()> {
    match value {
        ParamValue::Temp(token) => {
            let entry = temp_map.get(*token).ok_or_else(|| {
                ConvertError::Internal(format!(
                    "token {token} on unit {unit} minted outside this conversion"
                ))
            })?;
            let job_ref = JobRef::Temporary(entry.path.clone());
            if !refs.contains(&job_ref) {
                refs.push(job_ref);
            }
        }
        ParamValue::List(items) => {
            for item in items {
                collect_temp_refs(unit, item, temp_map, refs)?;
            }
        }
        ParamValue::Undefined | ParamValue::Text(_) | ParamValue::Path(_) => {}
    }
    Ok(())
}

fn substitute(
    unit: &UnitPath,
    arg: CmdValue,
    temp_map: &TempMap,
    translations: &[PathTranslation],
    shared_map: &mut SharedPathMap,
    unit_transfers: &HashMap<PathBuf, Arc<FileTransfer>>,
) -> ConvertResult<JobArg> {
    Ok(match arg {
        CmdValue::Text(text) => JobArg::Literal(text),
        CmdValue::Temp(token) => {
            let entry = temp_map.get(token).ok_or_else(|| {
                ConvertError::Internal(format!(
                    "token {token} on unit {unit} minted outside this conversion"
                ))
            })?;
            JobArg::Temporary(entry.path.clone())
        }
        CmdValue::Path(path) => {
            if let Some(shared) = translate_path(&path, translations, shared_map) {
                JobArg::Shared(shared)
            } else if let Some(item) = unit_transfers.get(&path) {
                JobArg::Transfer(Arc::clone(item))
            } else {
                JobArg::Path(path)
            }
        }
        CmdValue::List(items) => JobArg::List(
            items
                .into_iter()
                .map(|item| {
                    substitute(
                        unit,
                        item,
                        temp_map,
                        translations,
                        shared_map,
                        unit_transfers,
                    )
                })
                .collect::<ConvertResult<Vec<_>>>()?,
        ),
    })
}
