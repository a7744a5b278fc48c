//! `suite_runner`: orchestrate a repository's backend, frontend unit and
//! E2E test suites, with per-suite logs, coverage summaries, a final
//! report and resumable runs.
//!
//! The binary's default command runs the suites; `coverage-report` renders
//! the backend coverage table from a coverage JSON report.

pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod resume;
pub mod runner;
pub mod suites;
pub mod util;

pub use error::{Result, RunnerError};
