//! Coverage data stores.
//!
//! [`CoverageData`] is the narrow view the aggregator needs: the list of
//! measured files and a per-file analysis. [`JsonCoverageData`] reads the
//! report written by `coverage json`.

use crate::error::{Result, RunnerError};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Branch totals of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchNumbers {
    pub total: usize,
    pub missing: usize,
}

/// Line-level analysis of one measured file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAnalysis {
    pub statements: BTreeSet<u32>,
    pub missing: BTreeSet<u32>,
    /// Lines actually executed, when the store records them.
    pub executed: Option<BTreeSet<u32>>,
    pub branches: Option<BranchNumbers>,
}

impl FileAnalysis {
    /// Executed lines, falling back to statements minus missing.
    #[must_use]
    pub fn executed_lines(&self) -> BTreeSet<u32> {
        self.executed.clone().unwrap_or_else(|| {
            self.statements.difference(&self.missing).copied().collect()
        })
    }
}

pub trait CoverageData {
    /// Paths of every measured file, as recorded by the store.
    fn measured_files(&self) -> Result<Vec<String>>;

    fn analyze(&self, file: &str) -> Result<FileAnalysis>;

    /// Source text of a measured file.
    fn read_source(&self, file: &str) -> std::io::Result<String> {
        fs::read_to_string(file)
    }
}

#[derive(Debug, Deserialize)]
struct JsonReport {
    #[serde(default)]
    files: BTreeMap<String, JsonFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonFile {
    #[serde(default)]
    executed_lines: Vec<u32>,
    #[serde(default)]
    missing_lines: Vec<u32>,
    #[serde(default)]
    summary: JsonFileSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct JsonFileSummary {
    num_branches: Option<usize>,
    missing_branches: Option<usize>,
}

/// Store backed by a `coverage json` report.
///
/// Relative file paths are resolved against the report's directory.
#[derive(Debug)]
pub struct JsonCoverageData {
    base_dir: PathBuf,
    files: BTreeMap<String, JsonFile>,
}

impl JsonCoverageData {
    /// Load a report from disk.
    ///
    /// # Errors
    ///
    /// Returns `Coverage` if the file is missing or not a coverage report.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            RunnerError::Coverage(format!("cannot read {}: {err}", path.display()))
        })?;
        let report: JsonReport = serde_json::from_str(&contents).map_err(|err| {
            RunnerError::Coverage(format!("{} is not a coverage report: {err}", path.display()))
        })?;
        let base_dir = path
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);
        Ok(Self {
            base_dir,
            files: report.files,
        })
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl CoverageData for JsonCoverageData {
    fn measured_files(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn analyze(&self, file: &str) -> Result<FileAnalysis> {
        let entry = self
            .files
            .get(file)
            .ok_or_else(|| RunnerError::Coverage(format!("{file} was not measured")))?;
        let executed: BTreeSet<u32> = entry.executed_lines.iter().copied().collect();
        let missing: BTreeSet<u32> = entry.missing_lines.iter().copied().collect();
        let statements = executed.union(&missing).copied().collect();
        let branches = entry.summary.num_branches.map(|total| BranchNumbers {
            total,
            missing: entry.summary.missing_branches.unwrap_or(0),
        });
        Ok(FileAnalysis {
            statements,
            missing,
            executed: Some(executed),
            branches,
        })
    }

    fn read_source(&self, file: &str) -> std::io::Result<String> {
        fs::read_to_string(self.resolve(file))
    }
}
