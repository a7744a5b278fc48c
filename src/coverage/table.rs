//! Colorized coverage table.

use super::{CoverageReport, CoverageTotals, percent};
use crate::output::{Palette, Tier};
use crate::runner::capture::COVERAGE_MARKER;
use crate::util::{pad_right, truncate_to_width, visible_len};

const MINI_BAR: usize = 13;
const WIDE_BAR: usize = 15;
const FOCUS_LIMIT: usize = 3;
/// Indent, separators, counts, percentage and the bracketed mini bar.
const FIXED_COLUMNS: usize = 2 + 2 + 5 + 2 + 4 + 2 + 7 + 2 + 1 + MINI_BAR + 1;
const MIN_PATH_WIDTH: usize = 20;

fn bar(pct: f64, width: usize) -> String {
    let filled = ((pct / 100.0 * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "·".repeat(width - filled))
}

/// `=== title ===` filling `width` columns.
#[must_use]
pub fn separator(fill: char, title: &str, width: usize) -> String {
    let side = (width.saturating_sub(visible_len(title) + 2) / 2).max(1);
    let fill_str = fill.to_string().repeat(side);
    let mut line = format!("{fill_str} {title} {fill_str}");
    if visible_len(&line) < width {
        line.push(fill);
    }
    line
}

/// Path column width for a terminal of `term_width` columns.
#[must_use]
pub fn path_width(term_width: usize, longest_path: usize) -> usize {
    let max_width = term_width
        .saturating_sub(FIXED_COLUMNS + 2)
        .max(MIN_PATH_WIDTH);
    max_width.min(longest_path).max(MIN_PATH_WIDTH)
}

/// Render the full report: table, total row, focus callout and summary
/// block. An empty report renders nothing.
#[must_use]
pub fn render_report(report: &CoverageReport, term_width: usize, palette: Palette) -> Vec<String> {
    if report.is_empty() {
        return Vec::new();
    }
    let longest = report
        .files
        .iter()
        .map(|file| visible_len(&file.path))
        .max()
        .unwrap_or(0);
    let width = path_width(term_width, longest);
    let mut lines = vec![palette.bold(&separator('=', "COVERAGE REPORT", term_width)), String::new()];

    for file in &report.files {
        let tier = Tier::for_table(file.pct);
        lines.push(format!(
            "  {}  {:>5}  {:>4}  {}[{}]",
            pad_right(&truncate_to_width(&file.path, width), width),
            file.statements,
            file.missing,
            palette.tier(tier, &format!("{:>6.1}%  ", file.pct)),
            palette.tier(tier, &bar(file.pct, MINI_BAR)),
        ));
    }
    lines.push(String::new());

    let totals = &report.totals;
    let total_pct = totals.combined_pct();
    let tier = Tier::for_table(total_pct);
    lines.push(format!(
        "{}{}{}",
        palette.bold(&format!(
            "  {}  {:>5}  {:>4}  ",
            pad_right("TOTAL", width),
            totals.combined_total(),
            totals.combined_missing()
        )),
        palette.bold(&palette.tier(tier, &format!("{total_pct:>6.1}%  "))),
        palette.bold(&format!("[{}]", palette.tier(tier, &bar(total_pct, WIDE_BAR)))),
    ));
    lines.push(String::new());

    let focus = report.focus_files(FOCUS_LIMIT);
    let dash = "─".repeat(10);
    let label = if focus.is_empty() {
        "All files fully covered".to_string()
    } else {
        format!("Top-{} files to focus on", focus.len())
    };
    lines.push(palette.bold(&format!(
        "  {dash}  {label}  (total project: {total_pct:.1}%)  {dash}"
    )));
    for (rank, file) in focus.iter().enumerate() {
        let tier = Tier::for_table(file.pct);
        lines.push(format!(
            "  {}.  {}  [{}]  {}   ({} lines uncovered)",
            rank + 1,
            palette.tier(tier, &format!("{:>5.1}%", file.pct)),
            palette.tier(tier, &bar(file.pct, MINI_BAR)),
            truncate_to_width(&file.path, width),
            file.missing,
        ));
    }
    lines.push(String::new());

    lines.extend(render_summary_block(totals, term_width, palette));
    lines
}

/// The `Coverage summary` block picked up from the backend suite's output.
/// The closing separator stays unstyled so it still starts with `=`.
#[must_use]
pub fn render_summary_block(totals: &CoverageTotals, term_width: usize, palette: Palette) -> Vec<String> {
    let metric = |label: &str, covered: usize, total: usize| {
        format!("{label}: {:.2}% ({covered}/{total})", percent(covered, total))
    };
    vec![
        palette.bold(COVERAGE_MARKER),
        metric("Statements", totals.covered_statements(), totals.statements),
        metric("Branches", totals.covered_branches(), totals.branches),
        metric("Functions", totals.covered_functions, totals.functions),
        metric("Total", totals.combined_covered(), totals.combined_total()),
        "=".repeat(term_width.max(1)),
    ]
}
