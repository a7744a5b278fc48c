//! Resume store: the persisted summary of the last orchestration run.
//!
//! The summary lives at `<report-dir>/last-run.json`. It is read once before
//! suites are selected and written once after they finish. Reading never
//! fails: a missing, corrupt or oddly shaped file means "no prior state".

use crate::error::Result;
use crate::model::{SuiteName, SuiteResult};
use crate::util::{display_relative, utc_timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Sort position for suite names missing from the order list.
const UNKNOWN_ORDER: usize = 999;

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// One suite's entry in the resume summary.
///
/// Keys this crate does not know about are kept in `extra` and written back
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteRecord {
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, alias = "return_code", deserialize_with = "lenient")]
    pub returncode: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub command: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub log_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub run_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SuiteRecord {
    /// Record for a fresh result, stamped now.
    #[must_use]
    pub fn from_result(result: &SuiteResult, run_id: &str, root: &Path) -> Self {
        Self {
            name: result.name.as_str().to_string(),
            status: Some(result.status.as_str().to_string()),
            returncode: Some(i64::from(result.return_code)),
            duration: Some(result.duration),
            command: result.command.clone(),
            timestamp: Some(utc_timestamp()),
            log_path: result
                .log_path
                .as_deref()
                .map(|path| display_relative(path, root)),
            run_id: Some(run_id.to_string()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Summary as loaded from disk. `suites` is kept raw so malformed entries
/// can be skipped one by one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeSummary {
    #[serde(default, deserialize_with = "lenient")]
    pub run_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub suites: serde_json::Value,
}

/// Summary as written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct PersistedSummary {
    pub run_id: String,
    pub generated_at: String,
    pub suites: Vec<SuiteRecord>,
}

/// Prior records keyed by suite name.
pub type ResumeEntries = BTreeMap<String, SuiteRecord>;

/// Resume classification of a prior record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeStatus {
    Ok,
    Failed,
    Unknown,
}

impl ResumeStatus {
    /// Whether the suite must run again. Only a proven pass is skipped.
    #[must_use]
    pub const fn needs_rerun(self) -> bool {
        !matches!(self, Self::Ok)
    }
}

/// Load the summary file.
///
/// Returns `None` when the file is missing, unreadable, not JSON, or not a
/// JSON object.
#[must_use]
pub fn load(path: &Path) -> Option<ResumeSummary> {
    let contents = fs::read_to_string(path).ok()?;
    let value: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "resume summary is not valid JSON");
            return None;
        }
    };
    if !value.is_object() {
        debug!(path = %path.display(), "resume summary is not a JSON object");
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Records by suite name; malformed or nameless entries are skipped.
#[must_use]
pub fn extract_entries(summary: &ResumeSummary) -> ResumeEntries {
    let mut entries = ResumeEntries::new();
    let Some(suites) = summary.suites.as_array() else {
        return entries;
    };
    for suite in suites {
        if !suite.is_object() {
            continue;
        }
        if let Ok(record) = serde_json::from_value::<SuiteRecord>(suite.clone()) {
            entries.insert(record.name.clone(), record);
        }
    }
    entries
}

/// Classify a prior record: an explicit status wins, then the return code.
#[must_use]
pub fn resume_status(entry: Option<&SuiteRecord>) -> ResumeStatus {
    let Some(entry) = entry else {
        return ResumeStatus::Unknown;
    };
    match entry.status.as_deref() {
        Some("ok") => return ResumeStatus::Ok,
        Some("failed") => return ResumeStatus::Failed,
        _ => {}
    }
    match entry.returncode {
        Some(0) => ResumeStatus::Ok,
        Some(_) => ResumeStatus::Failed,
        None => ResumeStatus::Unknown,
    }
}

/// Merge fresh results into prior entries and order them by `suite_order`.
#[must_use]
pub fn build_summary(
    results: &[SuiteResult],
    run_id: &str,
    root: &Path,
    suite_order: &[SuiteName],
    existing: Option<&ResumeEntries>,
) -> PersistedSummary {
    let mut entries = existing.cloned().unwrap_or_default();
    for result in results {
        let record = SuiteRecord::from_result(result, run_id, root);
        entries.insert(record.name.clone(), record);
    }

    let position = |name: &str| {
        suite_order
            .iter()
            .position(|suite| suite.as_str() == name)
            .unwrap_or(UNKNOWN_ORDER)
    };
    let mut suites: Vec<SuiteRecord> = entries.into_values().collect();
    suites.sort_by_key(|record| position(&record.name));

    PersistedSummary {
        run_id: run_id.to_string(),
        generated_at: utc_timestamp(),
        suites,
    }
}

/// Write the summary as indented JSON, replacing any previous file.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn persist(path: &Path, summary: &PersistedSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    Ok(())
}

/// Build, merge and write in one step.
///
/// # Errors
///
/// See [`persist`].
pub fn build_and_persist(
    path: &Path,
    results: &[SuiteResult],
    run_id: &str,
    root: &Path,
    suite_order: &[SuiteName],
    existing: Option<&ResumeEntries>,
) -> Result<PersistedSummary> {
    let summary = build_summary(results, run_id, root, suite_order, existing);
    persist(path, &summary)?;
    Ok(summary)
}
