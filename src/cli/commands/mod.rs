//! Command implementations. Each returns the process exit code.

pub mod coverage;
pub mod run;
