//! Shared utilities for `suite_runner`.
//!
//! Common functionality used across modules:
//! - Time formatting (RFC3339, UTC)
//! - Text helpers (terminal width, column truncation, shell-style splitting)
//! - Path display relative to the orchestration root

pub mod text;
pub mod time;

pub use text::{pad_right, split_args, terminal_width, truncate_to_width, visible_len};
pub use time::utc_timestamp;

use std::path::Path;

/// Render `path` relative to `root` when it lives under it, else verbatim.
#[must_use]
pub fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}
