//! Final suite report printed after every run.

use super::theme::Palette;
use crate::model::SuiteResult;
use std::io::{self, Write};

/// Print the report for results already in canonical order.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn print_final_report(
    out: &mut dyn Write,
    results: &[SuiteResult],
    wall_clock: f64,
    palette: Palette,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", palette.bold(&"=".repeat(80)))?;
    writeln!(out, "{}", palette.bold("Final suite report"))?;
    writeln!(
        out,
        "Total wall-clock duration: {}",
        palette.cyan(&format!("{wall_clock:.2}s"))
    )?;

    if results.len() > 1 {
        let sum: f64 = results.iter().map(|r| r.duration).sum();
        writeln!(out, "Sum of individual durations: {sum:.2}s")?;
        let saved = sum - wall_clock;
        if saved > 0.0 {
            writeln!(
                out,
                "Time saved by parallelism: {}",
                palette.green(&format!("{saved:.2}s"))
            )?;
        }
    }

    writeln!(out)?;
    for result in results {
        let tag = if result.status.is_ok() {
            palette.green("OK")
        } else {
            palette.red("FAILED")
        };
        writeln!(
            out,
            "  {:<18} {tag}  ({:.2}s)",
            result.name.as_str(),
            result.duration
        )?;
        for line in &result.coverage_lines {
            writeln!(out, "    {line}")?;
        }
        if let Some(path) = &result.log_path {
            writeln!(out, "    {}", palette.dim(&format!("Log: {}", path.display())))?;
        }
    }

    let failed: Vec<&SuiteResult> = results.iter().filter(|r| r.is_failed()).collect();
    if failed.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n{}", palette.red(&"!".repeat(80)))?;
    writeln!(out, "{}", palette.bold_red("Failures (tail output):"))?;
    for result in failed {
        writeln!(out, "\n{}", palette.red(&"-".repeat(80)))?;
        writeln!(
            out,
            "{}",
            palette.red(&format!("{} (exit {})", result.name, result.return_code))
        )?;
        for line in result.deduplicated_tail() {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}
