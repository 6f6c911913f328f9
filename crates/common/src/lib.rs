//! Common utilities for the pegleg workspace.
//!
//! - [`debug`] - Per-module logging controlled via the `DEBUG` environment
//!   variable
//! - [`source`] - Source locations and source-line extraction for
//!   diagnostics

pub mod debug;
pub mod source;

pub use debug::{create_logger, Logger};
pub use source::{line_containing, SourceLoc};
