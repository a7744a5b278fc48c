//! Frontend E2E suite: Playwright through `npx`.
//!
//! The child inherits the full environment of the orchestrator; browsers
//! and base URLs are configured through it.

use super::summary::flow_coverage_lines;
use super::{Suite, SuiteContext};
use crate::config::RunConfig;
use crate::model::{SuiteName, SuiteResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FrontendE2eSuite {
    pub extra_args: Vec<String>,
    /// Playwright `--workers` value.
    pub workers: Option<String>,
}

impl FrontendE2eSuite {
    #[must_use]
    pub const fn new(extra_args: Vec<String>, workers: Option<String>) -> Self {
        Self {
            extra_args,
            workers,
        }
    }

    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.e2e.args.clone(), config.e2e.workers.clone())
    }
}

impl Suite for FrontendE2eSuite {
    fn name(&self) -> SuiteName {
        SuiteName::FrontendE2e
    }

    fn command(&self, _ctx: &SuiteContext) -> Vec<String> {
        let mut cmd = vec!["npx".to_string(), "playwright".to_string(), "test".to_string()];
        if let Some(workers) = self.workers.as_deref().filter(|w| !w.is_empty()) {
            cmd.push(format!("--workers={workers}"));
        }
        cmd.extend(self.extra_args.iter().cloned());
        cmd
    }

    fn cwd(&self, ctx: &SuiteContext) -> PathBuf {
        ctx.frontend_root.clone()
    }

    // Flow coverage is reported whether or not the run passed.
    fn post_process(&self, ctx: &SuiteContext, mut result: SuiteResult) -> SuiteResult {
        result.coverage_lines = flow_coverage_lines(&ctx.frontend_root);
        result
    }
}
