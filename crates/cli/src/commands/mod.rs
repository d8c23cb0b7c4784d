//! CLI command implementations

pub mod collect;
pub mod dataset;
pub mod predict;
