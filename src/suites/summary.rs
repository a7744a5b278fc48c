//! Coverage summary files written by the frontend test runners.
//!
//! Both files are produced by external tools, so every field is optional
//! and a field of the wrong type reads as absent instead of failing the
//! whole document. A missing or unparseable file renders no lines.

use crate::output::{Palette, Tier};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Deserialize a field, mapping a value of the wrong shape to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// A percentage as reported by Jest: usually numeric, `"Unknown"` for
/// empty totals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Percent {
    Number(f64),
    Text(String),
}

impl Percent {
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::Number(v) => *v,
            Self::Text(_) => 0.0,
        }
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v:.2}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metric {
    #[serde(default, deserialize_with = "lenient")]
    pub covered: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub pct: Option<Percent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitTotals {
    #[serde(default, deserialize_with = "lenient")]
    pub statements: Option<Metric>,
    #[serde(default, deserialize_with = "lenient")]
    pub branches: Option<Metric>,
    #[serde(default, deserialize_with = "lenient")]
    pub functions: Option<Metric>,
    #[serde(default, deserialize_with = "lenient")]
    pub lines: Option<Metric>,
}

/// `coverage/coverage-summary.json` (Jest `json-summary` reporter).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitCoverageSummary {
    #[serde(default, deserialize_with = "lenient")]
    pub total: Option<UnitTotals>,
}

impl UnitCoverageSummary {
    /// Render `Label: pct% (covered/total)` lines, colored by threshold.
    #[must_use]
    pub fn render(&self, palette: Palette) -> Vec<String> {
        let Some(total) = &self.total else {
            return Vec::new();
        };
        let metrics = [
            ("Statements", &total.statements),
            ("Branches", &total.branches),
            ("Functions", &total.functions),
            ("Lines", &total.lines),
        ];
        let mut lines = Vec::new();
        for (label, metric) in metrics {
            let Some(Metric {
                covered: Some(covered),
                total: Some(total),
                pct: Some(pct),
            }) = metric
            else {
                continue;
            };
            let pct_text = palette.tier(Tier::for_summary(pct.value()), &format!("{pct}%"));
            lines.push(format!("{label}: {pct_text} ({covered}/{total})"));
        }
        lines
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowTotals {
    #[serde(default, deserialize_with = "lenient")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub covered: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub partial: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub failing: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub missing: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    #[serde(default, deserialize_with = "lenient")]
    pub totals: Option<FlowTotals>,
    #[serde(default, deserialize_with = "lenient")]
    pub covered_percent: Option<Percent>,
}

/// `e2e-results/flow-coverage.json` written by the E2E flow reporter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowCoverageReport {
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<FlowSummary>,
}

impl FlowCoverageReport {
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        let Some(summary) = &self.summary else {
            return Vec::new();
        };
        let Some(totals) = &summary.totals else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        if let (Some(total), Some(covered)) = (totals.total, totals.covered) {
            let pct = summary
                .covered_percent
                .as_ref()
                .map_or_else(|| "0".to_string(), ToString::to_string);
            lines.push(format!("Flows covered: {covered}/{total} ({pct}%)"));
        }
        for (label, count) in [
            ("Partial", totals.partial),
            ("Failing", totals.failing),
            ("Missing", totals.missing),
        ] {
            if let Some(n) = count.filter(|n| *n > 0) {
                lines.push(format!("{label}: {n}"));
            }
        }
        lines
    }
}

/// Read and parse a JSON summary file; any failure yields `None`.
#[must_use]
pub fn read_summary<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "coverage summary unavailable");
            return None;
        }
    };
    let value: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "coverage summary is not valid JSON");
            return None;
        }
    };
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Rendered unit-test coverage lines from `<frontend>/coverage/coverage-summary.json`.
#[must_use]
pub fn unit_coverage_lines(frontend_root: &Path, palette: Palette) -> Vec<String> {
    let path = frontend_root.join("coverage").join("coverage-summary.json");
    read_summary::<UnitCoverageSummary>(&path)
        .map(|summary| summary.render(palette))
        .unwrap_or_default()
}

/// Rendered flow coverage lines from `<frontend>/e2e-results/flow-coverage.json`.
#[must_use]
pub fn flow_coverage_lines(frontend_root: &Path) -> Vec<String> {
    let path = frontend_root.join("e2e-results").join("flow-coverage.json");
    read_summary::<FlowCoverageReport>(&path)
        .map(|report| report.render())
        .unwrap_or_default()
}
