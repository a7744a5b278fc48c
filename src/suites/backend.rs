//! Backend suite: pytest over the application's test namespace.

use super::{Suite, SuiteContext};
use crate::config::RunConfig;
use crate::coverage;
use crate::model::SuiteName;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BackendSuite {
    /// Interpreter used to launch `-m pytest`.
    pub python: String,
    /// Application package measured for coverage.
    pub package: String,
    /// pytest `-m` marker expression; empty means none.
    pub markers: String,
    pub extra_args: Vec<String>,
}

impl BackendSuite {
    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            python: config.backend.python.clone(),
            package: config.backend.package.clone(),
            markers: config.backend.markers.clone(),
            extra_args: config.backend.args.clone(),
        }
    }
}

impl Suite for BackendSuite {
    fn name(&self) -> SuiteName {
        SuiteName::Backend
    }

    fn command(&self, ctx: &SuiteContext) -> Vec<String> {
        let mut cmd = vec![
            self.python.clone(),
            "-m".to_string(),
            "pytest".to_string(),
            "-q".to_string(),
        ];
        if ctx.coverage {
            let source = ctx.backend_root.join(&self.package);
            cmd.push(format!("--cov={}", source.display()));
            cmd.push("--cov-report=term-missing".to_string());
            cmd.push(format!(
                "--cov-report=json:{}",
                coverage::json_report_path(&ctx.backend_root).display()
            ));
            cmd.push("--color=yes".to_string());
        }
        if !self.markers.is_empty() {
            cmd.push("-m".to_string());
            cmd.push(self.markers.clone());
        }
        cmd.extend(self.extra_args.iter().cloned());
        cmd
    }

    fn cwd(&self, ctx: &SuiteContext) -> PathBuf {
        ctx.backend_root.clone()
    }

    fn captures_coverage(&self, ctx: &SuiteContext) -> bool {
        ctx.coverage
    }
}
