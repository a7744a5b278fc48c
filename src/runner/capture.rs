//! Extraction of the "Coverage summary" block from a suite's output stream.

/// Literal that opens a coverage block.
pub const COVERAGE_MARKER: &str = "Coverage summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Capturing,
}

/// Line-driven `{Idle, Capturing}` state machine.
///
/// The marker line starts (or restarts) a block and is kept. A line
/// starting with `=` that is not itself a marker closes the block and is
/// dropped.
#[derive(Debug, Clone)]
pub struct CoverageCapture {
    state: State,
    lines: Vec<String>,
}

impl Default for CoverageCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageCapture {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            lines: Vec::new(),
        }
    }

    /// Feed one output line (without its newline).
    pub fn feed(&mut self, line: &str) {
        if line.contains(COVERAGE_MARKER) {
            self.lines.clear();
            self.lines.push(line.to_string());
            self.state = State::Capturing;
            return;
        }
        if self.state == State::Capturing {
            if line.starts_with('=') {
                self.state = State::Idle;
            } else {
                self.lines.push(line.to_string());
            }
        }
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.state == State::Capturing
    }

    #[must_use]
    pub fn finish(self) -> Vec<String> {
        self.lines
    }
}
