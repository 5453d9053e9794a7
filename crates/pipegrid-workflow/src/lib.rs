#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod convert;
mod error;
pub mod scheduler;

#[doc(hidden)]
pub mod prelude;

pub use convert::workflow_from_pipeline;
pub use error::{ConvertError, ConvertResult};

/// Tracing target for workflow conversion operations.
pub const TRACING_TARGET: &str = "pipegrid_workflow";
