//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use pipegrid_pipeline::prelude::*;
//! ```

pub use crate::error::{PipelineError, PipelineResult};
pub use crate::graph::{StructuralGraph, StructuralMeta, StructuralNode};
pub use crate::node::{LinkEnd, NodeKind, PipelineNode, Plug};
pub use crate::param::{ParamKind, ParamSet, ParamSpec, ParamValue, TempToken};
pub use crate::pipeline::{EmptyParam, Pipeline, UnitPath};
pub use crate::process::{CmdValue, CommandToken, Process};
pub use crate::switch::Switch;
