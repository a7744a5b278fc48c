//! Frontend unit suite: Jest through `npm run test`.

use super::summary::unit_coverage_lines;
use super::{Suite, SuiteContext};
use crate::config::RunConfig;
use crate::model::{SuiteName, SuiteResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FrontendUnitSuite {
    pub extra_args: Vec<String>,
    /// Jest `--maxWorkers` value.
    pub workers: Option<String>,
}

impl FrontendUnitSuite {
    #[must_use]
    pub const fn new(extra_args: Vec<String>, workers: Option<String>) -> Self {
        Self {
            extra_args,
            workers,
        }
    }

    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.unit.args.clone(), config.unit.workers.clone())
    }
}

impl Suite for FrontendUnitSuite {
    fn name(&self) -> SuiteName {
        SuiteName::FrontendUnit
    }

    fn command(&self, ctx: &SuiteContext) -> Vec<String> {
        let mut cmd: Vec<String> = ["npm", "run", "test", "--", "--silent"]
            .iter()
            .map(ToString::to_string)
            .collect();
        if ctx.coverage {
            cmd.push("--coverage".to_string());
        }
        if let Some(workers) = self.workers.as_deref().filter(|w| !w.is_empty()) {
            cmd.push(format!("--maxWorkers={workers}"));
        }
        cmd.extend(self.extra_args.iter().cloned());
        cmd
    }

    fn cwd(&self, ctx: &SuiteContext) -> PathBuf {
        ctx.frontend_root.clone()
    }

    fn captures_coverage(&self, ctx: &SuiteContext) -> bool {
        ctx.coverage
    }

    fn post_process(&self, ctx: &SuiteContext, mut result: SuiteResult) -> SuiteResult {
        if ctx.coverage && result.status.is_ok() {
            result.coverage_lines = unit_coverage_lines(&ctx.frontend_root, ctx.palette);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SuiteStatus;
    use crate::suites::test_support::context;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_command_flags() {
        let mut ctx = context(std::path::Path::new("/repo"));
        let suite = FrontendUnitSuite::new(vec!["--ci".to_string()], Some("50%".to_string()));
        assert_eq!(
            suite.command(&ctx),
            vec!["npm", "run", "test", "--", "--silent", "--maxWorkers=50%", "--ci"]
        );
        ctx.coverage = true;
        assert_eq!(
            suite.command(&ctx),
            vec!["npm", "run", "test", "--", "--silent", "--coverage", "--maxWorkers=50%", "--ci"]
        );
    }

    fn seeded(temp: &TempDir) -> SuiteContext {
        let mut ctx = context(temp.path());
        ctx.coverage = true;
        let summary = ctx.frontend_root.join("coverage").join("coverage-summary.json");
        fs::create_dir_all(summary.parent().unwrap()).unwrap();
        fs::write(
            summary,
            r#"{"total": {"lines": {"total": 4, "covered": 4, "pct": 100}}}"#,
        )
        .unwrap();
        ctx
    }

    #[test]
    fn test_summary_read_after_success() {
        let temp = TempDir::new().unwrap();
        let ctx = seeded(&temp);
        let mut result = SuiteResult::internal_failure(SuiteName::FrontendUnit, "");
        result.status = SuiteStatus::Ok;
        result.return_code = 0;
        let result = FrontendUnitSuite::new(Vec::new(), None).post_process(&ctx, result);
        assert_eq!(result.coverage_lines, vec!["Lines: 100.00% (4/4)"]);
    }

    #[test]
    fn test_summary_ignored_after_failure() {
        let temp = TempDir::new().unwrap();
        let ctx = seeded(&temp);
        let result = SuiteResult::internal_failure(SuiteName::FrontendUnit, "boom");
        let result = FrontendUnitSuite::new(Vec::new(), None).post_process(&ctx, result);
        assert!(result.coverage_lines.is_empty());
        assert_eq!(result.return_code, 1);
    }
}
