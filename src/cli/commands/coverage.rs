use crate::cli::CoverageReportArgs;
use crate::config::{self, CliOverrides};
use crate::coverage::{
    DEFAULT_PACKAGE, FileFilter, JsonCoverageData, aggregate, json_report_path, render_report,
};
use crate::error::Result;
use crate::output::Palette;
use crate::util::terminal_width;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Execute the coverage report command.
///
/// An unavailable or unreadable coverage store prints nothing and still
/// succeeds, so a test session is never failed by its report.
///
/// # Errors
///
/// Returns an error if the root or configuration is invalid, or stdout
/// cannot be written.
pub fn execute(args: &CoverageReportArgs, root: Option<&Path>, no_color: bool) -> Result<i32> {
    let root = config::resolve_root(root)?;
    let layer = config::load_config(&root, &CliOverrides::default())?;
    let package = args
        .package
        .clone()
        .or_else(|| layer.get("backend.package").map(ToString::to_string))
        .unwrap_or_else(|| DEFAULT_PACKAGE.to_string());
    let data_path = args.data.clone().unwrap_or_else(|| {
        json_report_path(&root.join(layer.get("backend.root").unwrap_or("backend")))
    });

    let data = match JsonCoverageData::load(&data_path) {
        Ok(data) => data,
        Err(err) => {
            debug!(error = %err, "no coverage data; skipping report");
            return Ok(0);
        }
    };
    let report = match aggregate(&data, &FileFilter::new(package)) {
        Ok(report) => report,
        Err(err) => {
            debug!(error = %err, "coverage aggregation failed; skipping report");
            return Ok(0);
        }
    };

    let width = args.width.unwrap_or_else(terminal_width);
    let palette = Palette::detect(no_color);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in render_report(&report, width, palette) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(0)
}
