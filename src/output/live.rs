//! Live progress block for parallel quiet runs.
//!
//! A single actor thread owns the progress state and redraws the block in
//! place every 300 ms. Suite threads never touch the terminal; they report
//! completions through [`LiveProgress::mark_done`].

use super::theme::Palette;
use crate::model::{SuiteName, SuiteStatus};
use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

const REDRAW_INTERVAL: Duration = Duration::from_millis(300);
const STOP_TIMEOUT: Duration = Duration::from_secs(2);
const BAR_WIDTH: usize = 20;

enum ProgressEvent {
    Done {
        name: SuiteName,
        status: SuiteStatus,
        duration: f64,
    },
    Stop,
}

/// Progress state: every suite is running until reported done.
#[derive(Debug, Clone)]
pub struct ProgressState {
    names: Vec<SuiteName>,
    done: HashMap<SuiteName, (SuiteStatus, f64)>,
}

impl ProgressState {
    #[must_use]
    pub fn new(names: &[SuiteName]) -> Self {
        let mut names = names.to_vec();
        names.sort_by_key(|name| name.order());
        Self {
            names,
            done: HashMap::new(),
        }
    }

    pub fn mark_done(&mut self, name: SuiteName, status: SuiteStatus, duration: f64) {
        self.done.insert(name, (status, duration));
    }

    #[must_use]
    pub fn done_count(&self) -> usize {
        self.names
            .iter()
            .filter(|name| self.done.contains_key(name))
            .count()
    }
}

/// Render one frame of the block. `frame` selects the spinner glyph.
#[must_use]
pub fn render_frame(
    state: &ProgressState,
    elapsed: Duration,
    frame: usize,
    palette: Palette,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(state.names.len() + 2);
    lines.push(format!(
        "  {} {}: {:.0}s",
        palette.cyan(palette.spinner(frame)),
        palette.bold("Elapsed"),
        elapsed.as_secs_f64()
    ));

    for name in &state.names {
        let (tag, extra) = match state.done.get(name) {
            None => (palette.yellow("running..."), String::new()),
            Some((status, duration)) => {
                let tag = if status.is_ok() {
                    palette.green("OK")
                } else {
                    palette.red("FAILED")
                };
                let extra = if *duration > 0.0 {
                    format!(" ({duration:.1}s)")
                } else {
                    String::new()
                };
                (tag, extra)
            }
        };
        lines.push(format!("    {:<18} {tag}{extra}", name.as_str()));
    }

    let total = state.names.len();
    let done = state.done_count();
    let filled = if total == 0 { 0 } else { done * BAR_WIDTH / total };
    let bar = format!(
        "{}{}",
        palette.green(&"█".repeat(filled)),
        palette.dim(&"░".repeat(BAR_WIDTH - filled))
    );
    lines.push(format!("  [{bar}] {done}/{total} suites done"));
    lines
}

struct Renderer {
    state: ProgressState,
    palette: Palette,
    writer: Box<dyn Write + Send>,
    started: Instant,
    frame: usize,
    lines_printed: usize,
}

impl Renderer {
    fn draw(&mut self) -> io::Result<()> {
        if self.lines_printed > 0 {
            let up = u16::try_from(self.lines_printed).unwrap_or(u16::MAX);
            queue!(self.writer, MoveUp(up), Clear(ClearType::FromCursorDown))?;
        }
        let lines = render_frame(&self.state, self.started.elapsed(), self.frame, self.palette);
        self.frame = self.frame.wrapping_add(1);
        for line in &lines {
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()?;
        self.lines_printed = lines.len();
        Ok(())
    }

    fn redraw(&mut self) {
        if let Err(err) = self.draw() {
            debug!(error = %err, "progress redraw failed");
        }
    }
}

/// Handle to the running progress actor.
pub struct LiveProgress {
    events: Sender<ProgressEvent>,
    stopped: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl LiveProgress {
    /// Draw the initial frame and start redrawing in the background.
    #[must_use]
    pub fn start(names: &[SuiteName], palette: Palette, writer: Box<dyn Write + Send>) -> Self {
        let mut renderer = Renderer {
            state: ProgressState::new(names),
            palette,
            writer,
            started: Instant::now(),
            frame: 0,
            lines_printed: 0,
        };
        renderer.redraw();

        let (events, inbox) = mpsc::channel();
        let (ack, stopped) = mpsc::channel();
        let handle = thread::spawn(move || run_actor(renderer, &inbox, &ack));

        Self {
            events,
            stopped,
            handle: Some(handle),
        }
    }

    /// Record a finished suite; shown from the next redraw.
    pub fn mark_done(&self, name: SuiteName, status: SuiteStatus, duration: f64) {
        let _ = self.events.send(ProgressEvent::Done {
            name,
            status,
            duration,
        });
    }

    /// Stop the actor after it draws a final frame. Waits at most 2 s.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.events.send(ProgressEvent::Stop);
        match self.stopped.recv_timeout(STOP_TIMEOUT) {
            Ok(()) => {
                let _ = handle.join();
            }
            Err(_) => debug!("progress actor did not stop in time; detaching"),
        }
    }
}

impl Drop for LiveProgress {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_actor(mut renderer: Renderer, inbox: &Receiver<ProgressEvent>, ack: &Sender<()>) {
    // Redraws follow a fixed cadence; incoming events do not push it back.
    let mut next_tick = Instant::now() + REDRAW_INTERVAL;
    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match inbox.recv_timeout(wait) {
            Ok(ProgressEvent::Done {
                name,
                status,
                duration,
            }) => renderer.state.mark_done(name, status, duration),
            Ok(ProgressEvent::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                renderer.redraw();
                next_tick = Instant::now() + REDRAW_INTERVAL;
            }
        }
    }
    // Completions queued behind Stop still belong in the final frame.
    while let Ok(event) = inbox.try_recv() {
        if let ProgressEvent::Done {
            name,
            status,
            duration,
        } = event
        {
            renderer.state.mark_done(name, status, duration);
        }
    }
    renderer.redraw();
    let _ = ack.send(());
}
