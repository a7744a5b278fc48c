//! Core data types for `suite_runner`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `SuiteName` - The fixed set of suites, in canonical order
//! - `SuiteStatus` - Outcome of one suite execution
//! - `SuiteResult` - Everything the report and resume store need about a run
//! - `TailBuffer` - Bounded recent-lines cache for failure diagnostics

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

/// Number of trailing output lines kept per suite.
pub const TAIL_LINES: usize = 40;

/// One of the known test suites.
///
/// Declaration order is the canonical suite order used for every report and
/// for the persisted resume summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SuiteName {
    Backend,
    FrontendUnit,
    FrontendE2e,
}

impl SuiteName {
    /// All suites in canonical order.
    pub const ALL: [Self; 3] = [Self::Backend, Self::FrontendUnit, Self::FrontendE2e];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::FrontendUnit => "frontend-unit",
            Self::FrontendE2e => "frontend-e2e",
        }
    }

    /// Position in canonical order.
    #[must_use]
    pub const fn order(self) -> usize {
        match self {
            Self::Backend => 0,
            Self::FrontendUnit => 1,
            Self::FrontendE2e => 2,
        }
    }

    /// File name of the suite's log inside the report directory.
    #[must_use]
    pub fn log_file_name(self) -> String {
        format!("{}.log", self.as_str())
    }
}

impl fmt::Display for SuiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a suite execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteStatus {
    Ok,
    Failed,
}

impl SuiteStatus {
    /// Status derived from a process exit code.
    #[must_use]
    pub const fn from_return_code(code: i32) -> Self {
        if code == 0 { Self::Ok } else { Self::Failed }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for SuiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one suite execution.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteResult {
    pub name: SuiteName,
    pub command: Vec<String>,
    pub return_code: i32,
    /// Wall-clock seconds from spawn to exit.
    pub duration: f64,
    pub status: SuiteStatus,
    pub output_tail: Vec<String>,
    pub coverage_lines: Vec<String>,
    pub log_path: Option<PathBuf>,
}

impl SuiteResult {
    /// A failed result for a suite that crashed before or while running.
    #[must_use]
    pub fn internal_failure(name: SuiteName, message: impl Into<String>) -> Self {
        Self {
            name,
            command: Vec::new(),
            return_code: 1,
            duration: 0.0,
            status: SuiteStatus::Failed,
            output_tail: vec![message.into()],
            coverage_lines: Vec::new(),
            log_path: None,
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, SuiteStatus::Failed)
    }

    /// The tail with repeated lines removed, first occurrence kept.
    #[must_use]
    pub fn deduplicated_tail(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.output_tail
            .iter()
            .map(String::as_str)
            .filter(|line| seen.insert(*line))
            .collect()
    }
}

/// Sort results into canonical suite order.
pub fn sort_canonical(results: &mut [SuiteResult]) {
    results.sort_by_key(|result| result.name.order());
}

/// Fixed-capacity FIFO of the most recent output lines.
#[derive(Debug, Clone)]
pub struct TailBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for TailBuffer {
    fn default() -> Self {
        Self::with_capacity(TAIL_LINES)
    }
}

impl TailBuffer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, evicting the oldest one when full.
    pub fn push(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.lines.into()
    }
}
