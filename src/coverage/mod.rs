//! Coverage aggregation for the backend application package.
//!
//! Reads a coverage data store, keeps the application's own source files,
//! and combines statement, branch and function coverage into one report.

pub mod functions;
pub mod store;
pub mod table;

pub use functions::{FunctionCoverage, FunctionScanner};
pub use store::{BranchNumbers, CoverageData, FileAnalysis, JsonCoverageData};
pub use table::{render_report, render_summary_block};

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default application package measured by the backend suite.
pub const DEFAULT_PACKAGE: &str = "base_feature_app";

/// Coverage JSON report written by a coverage-enabled backend run.
pub const JSON_REPORT: &str = "coverage.json";

#[must_use]
pub fn json_report_path(backend_root: &Path) -> PathBuf {
    backend_root.join(JSON_REPORT)
}

/// Selects application source among measured files.
#[derive(Debug, Clone)]
pub struct FileFilter {
    pub package: String,
}

impl FileFilter {
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }

    /// Normalized path when `path` belongs to the package and is not a test.
    #[must_use]
    pub fn accept(&self, path: &str) -> Option<String> {
        let normalized = path.replace('\\', "/");
        (normalized.contains(&self.package) && !normalized.contains("/tests/")).then_some(normalized)
    }

    /// Path starting at the package name.
    #[must_use]
    pub fn short_path<'a>(&self, normalized: &'a str) -> &'a str {
        normalized
            .find(&self.package)
            .map_or(normalized, |idx| &normalized[idx..])
    }
}

/// Statement coverage of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCoverage {
    pub path: String,
    pub statements: usize,
    pub missing: usize,
    pub pct: f64,
}

/// Project-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageTotals {
    pub statements: usize,
    pub missing_statements: usize,
    pub branches: usize,
    pub missing_branches: usize,
    pub functions: usize,
    pub covered_functions: usize,
}

/// Percentage, 0 when there is nothing to measure.
#[must_use]
pub fn percent(covered: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64 * 100.0
    }
}

impl CoverageTotals {
    #[must_use]
    pub const fn covered_statements(&self) -> usize {
        self.statements.saturating_sub(self.missing_statements)
    }

    #[must_use]
    pub const fn covered_branches(&self) -> usize {
        self.branches.saturating_sub(self.missing_branches)
    }

    #[must_use]
    pub const fn combined_total(&self) -> usize {
        self.statements + self.branches + self.functions
    }

    #[must_use]
    pub const fn combined_covered(&self) -> usize {
        self.covered_statements() + self.covered_branches() + self.covered_functions
    }

    #[must_use]
    pub const fn combined_missing(&self) -> usize {
        self.combined_total().saturating_sub(self.combined_covered())
    }

    #[must_use]
    pub fn combined_pct(&self) -> f64 {
        percent(self.combined_covered(), self.combined_total())
    }
}

/// Aggregated report, files sorted by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub files: Vec<FileCoverage>,
    pub totals: CoverageTotals,
}

impl CoverageReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Up to `limit` files with missing lines, weakest first.
    #[must_use]
    pub fn focus_files(&self, limit: usize) -> Vec<&FileCoverage> {
        let mut candidates: Vec<&FileCoverage> =
            self.files.iter().filter(|file| file.missing > 0).collect();
        candidates.sort_by(|a, b| {
            a.pct
                .total_cmp(&b.pct)
                .then_with(|| b.missing.cmp(&a.missing))
        });
        candidates.truncate(limit);
        candidates
    }
}

/// Aggregate every accepted file of `data`.
///
/// Files that fail analysis are skipped; unreadable sources only lose
/// their function counts.
///
/// # Errors
///
/// Returns an error if the store cannot list its measured files.
pub fn aggregate(data: &dyn CoverageData, filter: &FileFilter) -> Result<CoverageReport> {
    let mut scanner = FunctionScanner::new()?;
    let mut report = CoverageReport::default();

    for file in data.measured_files()? {
        let Some(normalized) = filter.accept(&file) else {
            continue;
        };
        let analysis = match data.analyze(&file) {
            Ok(analysis) => analysis,
            Err(err) => {
                debug!(file = %file, error = %err, "skipping unanalyzable file");
                continue;
            }
        };
        let statements = analysis.statements.len();
        if statements == 0 {
            continue;
        }
        let missing = analysis.missing.len();
        report.files.push(FileCoverage {
            path: filter.short_path(&normalized).to_string(),
            statements,
            missing,
            pct: percent(statements.saturating_sub(missing), statements),
        });

        let totals = &mut report.totals;
        totals.statements += statements;
        totals.missing_statements += missing;
        if let Some(branches) = analysis.branches {
            totals.branches += branches.total;
            totals.missing_branches += branches.missing;
        }
        match data.read_source(&file) {
            Ok(source) => {
                let functions = scanner.coverage(&source, &analysis.executed_lines());
                totals.functions += functions.total;
                totals.covered_functions += functions.covered;
            }
            Err(err) => debug!(file = %file, error = %err, "source unavailable; functions skipped"),
        }
    }

    report.files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(report)
}
