//! Run report generation.
//!
//! This module renders run summaries as Markdown or JSON.

pub mod generator;

pub use generator::*;
