//! Suite adapters.
//!
//! Each adapter turns run options into a concrete command line for one test
//! runner, hands it to the command runner, and post-processes coverage
//! output. Adapters never turn a non-zero exit code into success.

mod backend;
mod frontend_e2e;
mod frontend_unit;
pub mod summary;

pub use backend::BackendSuite;
pub use frontend_e2e::FrontendE2eSuite;
pub use frontend_unit::FrontendUnitSuite;

use crate::config::RunConfig;
use crate::error::Result;
use crate::model::{SuiteName, SuiteResult};
use crate::output::Palette;
use crate::runner::{self, CommandSpec};
use crate::util::utc_timestamp;
use std::path::PathBuf;

/// Shared per-run inputs for every adapter.
#[derive(Debug, Clone)]
pub struct SuiteContext {
    pub root: PathBuf,
    pub backend_root: PathBuf,
    pub frontend_root: PathBuf,
    pub report_dir: PathBuf,
    pub coverage: bool,
    pub quiet: bool,
    pub append_log: bool,
    pub run_id: Option<String>,
    pub palette: Palette,
}

impl SuiteContext {
    #[must_use]
    pub fn from_config(config: &RunConfig, run_id: &str) -> Self {
        Self {
            root: config.root.clone(),
            backend_root: config.backend_root.clone(),
            frontend_root: config.frontend_root.clone(),
            report_dir: config.report_dir.clone(),
            coverage: config.coverage,
            quiet: config.quiet,
            append_log: config.resume,
            run_id: Some(run_id.to_string()),
            palette: config.palette,
        }
    }

    #[must_use]
    pub fn log_path(&self, name: SuiteName) -> PathBuf {
        self.report_dir.join(name.log_file_name())
    }

    /// Header separating resumed output in an appended log.
    #[must_use]
    pub fn log_header(&self, name: SuiteName, command: &[String]) -> Option<String> {
        if !self.append_log {
            return None;
        }
        self.run_id
            .as_deref()
            .map(|run_id| build_log_header(run_id, name, command))
    }
}

/// A runnable test suite.
pub trait Suite: Send + Sync {
    fn name(&self) -> SuiteName;

    /// Program and arguments.
    fn command(&self, ctx: &SuiteContext) -> Vec<String>;

    fn cwd(&self, ctx: &SuiteContext) -> PathBuf;

    /// Whether to extract the "Coverage summary" block from the stream.
    fn captures_coverage(&self, _ctx: &SuiteContext) -> bool {
        false
    }

    /// Adjust the raw result once the process has exited.
    fn post_process(&self, _ctx: &SuiteContext, result: SuiteResult) -> SuiteResult {
        result
    }

    fn spec(&self, ctx: &SuiteContext) -> CommandSpec {
        let name = self.name();
        let command = self.command(ctx);
        let log_header = ctx.log_header(name, &command);
        CommandSpec {
            name,
            cwd: self.cwd(ctx),
            log_path: Some(ctx.log_path(name)),
            env: Vec::new(),
            capture_coverage: self.captures_coverage(ctx),
            append_log: ctx.append_log,
            log_header,
            quiet: ctx.quiet,
            command,
        }
    }

    /// Run the suite to completion.
    ///
    /// # Errors
    ///
    /// Propagates command runner errors (log file, spawn, wait).
    fn run(&self, ctx: &SuiteContext) -> Result<SuiteResult> {
        let result = runner::run_command(&self.spec(ctx))?;
        Ok(self.post_process(ctx, result))
    }
}

/// Enabled suites in canonical order.
#[must_use]
pub fn suites_from_config(config: &RunConfig) -> Vec<Box<dyn Suite>> {
    let mut suites: Vec<Box<dyn Suite>> = Vec::new();
    if !config.skip_backend {
        suites.push(Box::new(BackendSuite::from_config(config)));
    }
    if !config.skip_unit {
        suites.push(Box::new(FrontendUnitSuite::from_config(config)));
    }
    if !config.skip_e2e {
        suites.push(Box::new(FrontendE2eSuite::from_config(config)));
    }
    suites
}

/// Block written before resumed output in an appended suite log.
#[must_use]
pub fn build_log_header(run_id: &str, name: SuiteName, command: &[String]) -> String {
    let sep = "=".repeat(80);
    format!(
        "\n{sep}\nResume run: {run_id}\nTimestamp: {}\nSuite: {name}\nCommand: {}\n{sep}\n",
        utc_timestamp(),
        command.join(" ")
    )
}
