//! Subcommand implementations

pub mod batch;
pub mod models;
pub mod predict;
