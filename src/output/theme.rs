//! Color palette for terminal output.
//!
//! Color is decided once at startup (`NO_COLOR`, `--no-color`, TTY
//! detection) and carried in the immutable run configuration. Every
//! renderer receives the palette instead of consulting globals.

use crossterm::style::Stylize;
use std::io::IsTerminal;

/// Braille spinner frames used by the live progress block.
pub const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self { color: false }
    }

    /// Detect from the environment: `NO_COLOR` wins, then stdout TTY.
    #[must_use]
    pub fn detect(no_color_flag: bool) -> Self {
        let color = !no_color_flag
            && std::env::var_os("NO_COLOR").is_none()
            && std::io::stdout().is_terminal();
        Self { color }
    }

    #[must_use]
    pub const fn is_color(self) -> bool {
        self.color
    }

    #[must_use]
    pub fn bold(self, text: &str) -> String {
        if self.color { text.bold().to_string() } else { text.to_string() }
    }

    #[must_use]
    pub fn dim(self, text: &str) -> String {
        if self.color { text.dim().to_string() } else { text.to_string() }
    }

    #[must_use]
    pub fn green(self, text: &str) -> String {
        if self.color { text.green().to_string() } else { text.to_string() }
    }

    #[must_use]
    pub fn red(self, text: &str) -> String {
        if self.color { text.red().to_string() } else { text.to_string() }
    }

    #[must_use]
    pub fn yellow(self, text: &str) -> String {
        if self.color { text.yellow().to_string() } else { text.to_string() }
    }

    #[must_use]
    pub fn cyan(self, text: &str) -> String {
        if self.color { text.cyan().to_string() } else { text.to_string() }
    }

    #[must_use]
    pub fn bold_red(self, text: &str) -> String {
        if self.color { text.red().bold().to_string() } else { text.to_string() }
    }

    /// Color a percentage by the given tier.
    #[must_use]
    pub fn tier(self, tier: Tier, text: &str) -> String {
        match tier {
            Tier::Good => self.green(text),
            Tier::Fair => self.yellow(text),
            Tier::Poor => self.red(text),
        }
    }

    /// Spinner glyph for the given frame; `-` without color.
    #[must_use]
    pub fn spinner(self, frame: usize) -> &'static str {
        if self.color { SPINNER[frame % SPINNER.len()] } else { "-" }
    }
}

/// Coverage quality tier used to pick a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Good,
    Fair,
    Poor,
}

impl Tier {
    /// Thresholds for suite summaries: >= 90 good, >= 70 fair.
    #[must_use]
    pub fn for_summary(pct: f64) -> Self {
        if pct >= 90.0 {
            Self::Good
        } else if pct >= 70.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Thresholds for the coverage table: > 80 good, >= 50 fair.
    #[must_use]
    pub fn for_table(pct: f64) -> Self {
        if pct > 80.0 {
            Self::Good
        } else if pct >= 50.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}
