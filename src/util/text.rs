//! Text helpers for terminal output.

use crate::error::{Result, RunnerError};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Determine terminal width: `COLUMNS`, then the tty size, then 80.
#[must_use]
pub fn terminal_width() -> usize {
    if let Ok(columns) = std::env::var("COLUMNS") {
        if let Ok(value) = columns.trim().parse::<usize>() {
            if value > 0 {
                return value;
            }
        }
    }
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => usize::from(cols),
        _ => 80,
    }
}

/// Visible column count of `text`.
#[must_use]
pub fn visible_len(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Truncate `text` to at most `max_len` visible columns, ending in `…`
/// when anything was cut.
#[must_use]
pub fn truncate_to_width(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if visible_len(text) <= max_len {
        return text.to_string();
    }

    let target_len = max_len - 1;
    let mut w = 0;
    let mut s = String::new();
    for c in text.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if w + cw > target_len {
            break;
        }
        w += cw;
        s.push(c);
    }
    s.push('…');
    s
}

/// Left-align `text` in a field of `width` visible columns.
#[must_use]
pub fn pad_right(text: &str, width: usize) -> String {
    let len = visible_len(text);
    if len >= width {
        return text.to_string();
    }
    format!("{text}{}", " ".repeat(width - len))
}

/// Split a shell-style argument string. Empty input yields no arguments.
///
/// # Errors
///
/// Returns `InvalidArgument` naming `flag` when quoting is unbalanced.
pub fn split_args(flag: &str, value: Option<&str>) -> Result<Vec<String>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    shlex::split(value)
        .ok_or_else(|| RunnerError::invalid_argument(flag, "unbalanced quotes or trailing escape"))
}
