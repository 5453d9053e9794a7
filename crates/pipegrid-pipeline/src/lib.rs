#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
pub mod graph;
pub mod node;
pub mod param;
pub mod pipeline;
pub mod process;
pub mod switch;

#[doc(hidden)]
pub mod prelude;

pub use error::{PipelineError, PipelineResult};

/// Tracing target for pipeline model operations.
pub const TRACING_TARGET: &str = "pipegrid_pipeline";
