//! simfleet library: application logic for the batch simulation runner.

pub mod app;
pub mod config;
pub mod errors;
pub mod version;
