//! Command implementations for the vesseltrack CLI

pub mod serve;

pub use serve::run_serve;
