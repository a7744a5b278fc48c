//! Command runner: execute one suite's process and observe its output.
//!
//! The child's stdout and stderr are both piped. One reader thread per
//! stream forwards raw lines over a channel, so the runner thread sees the
//! merged output in arrival order while each stream keeps its own line
//! order. Every line is echoed (unless quiet), teed to the suite log, kept
//! in the tail buffer and fed to the coverage capture.

pub mod capture;

pub use capture::{COVERAGE_MARKER, CoverageCapture};

use crate::error::{Result, RunnerError};
use crate::model::{SuiteName, SuiteResult, SuiteStatus, TailBuffer};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, warn};

/// Return code reported when the program is missing from `PATH`.
pub const NOT_FOUND_CODE: i32 = 127;

/// Tail line used when the child's output pipes are unavailable.
pub const CAPTURE_FAILED: &str = "Failed to capture command output.";

/// Everything needed to run one suite command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: SuiteName,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    pub cwd: PathBuf,
    pub log_path: Option<PathBuf>,
    /// Extra environment on top of the inherited one.
    pub env: Vec<(String, String)>,
    pub capture_coverage: bool,
    pub append_log: bool,
    /// Written once before any output, only when appending.
    pub log_header: Option<String>,
    pub quiet: bool,
}

impl CommandSpec {
    #[must_use]
    pub fn new(name: SuiteName, command: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            name,
            command,
            cwd: cwd.into(),
            log_path: None,
            env: Vec::new(),
            capture_coverage: false,
            append_log: false,
            log_header: None,
            quiet: true,
        }
    }

    #[must_use]
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

/// Run a command, echoing to the process stdout when not quiet.
///
/// # Errors
///
/// Returns an error if the program fails to start for a reason other than
/// being absent, or waiting on it fails. An unopenable log is skipped.
pub fn run_command(spec: &CommandSpec) -> Result<SuiteResult> {
    run_command_with_echo(spec, &mut io::stdout())
}

/// Run a command, echoing to `echo` when not quiet.
///
/// # Errors
///
/// See [`run_command`].
pub fn run_command_with_echo(spec: &CommandSpec, echo: &mut dyn Write) -> Result<SuiteResult> {
    let Some((program, args)) = spec.command.split_first() else {
        return Err(RunnerError::Config(format!(
            "empty command for suite '{}'",
            spec.name
        )));
    };

    if !spec.quiet {
        let banner = format!(
            "\n{}\nRunning step: {}\nCommand: {}\n",
            "=".repeat(80),
            spec.name,
            spec.display_command()
        );
        let _ = echo.write_all(banner.as_bytes());
        let _ = echo.flush();
    }

    let mut log = spec.log_path.as_deref().and_then(|path| {
        LogSink::open(path, spec.append_log)
            .map_err(|err| {
                warn!(path = %path.display(), error = %err, "cannot open suite log; continuing without it");
            })
            .ok()
    });
    if spec.append_log {
        if let (Some(sink), Some(header)) = (log.as_mut(), spec.log_header.as_deref()) {
            sink.write_header(header);
        }
    }

    let mut process = Command::new(program);
    process
        .args(args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in &spec.env {
        process.env(key, value);
    }

    debug!(suite = %spec.name, command = %spec.display_command(), cwd = %spec.cwd.display(), "spawning suite");
    let start = Instant::now();
    let mut child = match process.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let message = format!("{program}: {err}");
            warn!(suite = %spec.name, "{message}");
            if let Some(sink) = log.as_mut() {
                sink.write_line(&format!("{message}\n"));
            }
            return Ok(failed_early(spec, NOT_FOUND_CODE, start, message));
        }
        Err(source) => {
            return Err(RunnerError::Spawn {
                program: program.clone(),
                source,
            });
        }
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Ok(failed_early(spec, 1, start, CAPTURE_FAILED.to_string()));
    };

    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    let readers = [spawn_reader(stdout, tx.clone()), spawn_reader(stderr, tx)];

    let mut tail = TailBuffer::default();
    let mut coverage = spec.capture_coverage.then(CoverageCapture::new);

    for raw in rx {
        let line = String::from_utf8_lossy(&raw);
        if !spec.quiet {
            let _ = echo.write_all(line.as_bytes());
            let _ = echo.flush();
        }
        if let Some(sink) = log.as_mut() {
            sink.write_line(&line);
        }
        let stripped = line.trim_end_matches(['\n', '\r']);
        tail.push(stripped);
        if let Some(capture) = coverage.as_mut() {
            capture.feed(stripped);
        }
    }
    for reader in readers {
        let _ = reader.join();
    }

    let exit = child.wait()?;
    let duration = start.elapsed().as_secs_f64();
    if let Some(sink) = log.as_mut() {
        sink.flush();
    }

    let return_code = exit_code(exit);
    debug!(suite = %spec.name, return_code, duration, "suite finished");
    Ok(SuiteResult {
        name: spec.name,
        command: spec.command.clone(),
        return_code,
        duration,
        status: SuiteStatus::from_return_code(return_code),
        output_tail: tail.into_vec(),
        coverage_lines: coverage.map(CoverageCapture::finish).unwrap_or_default(),
        log_path: spec.log_path.clone(),
    })
}

fn failed_early(spec: &CommandSpec, return_code: i32, start: Instant, message: String) -> SuiteResult {
    SuiteResult {
        name: spec.name,
        command: spec.command.clone(),
        return_code,
        duration: start.elapsed().as_secs_f64(),
        status: SuiteStatus::Failed,
        output_tail: vec![message],
        coverage_lines: Vec::new(),
        log_path: spec.log_path.clone(),
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, tx: mpsc::Sender<Vec<u8>>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        loop {
            let mut buf = Vec::new();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(buf).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Exit code, or the negated signal number for a signal-terminated child.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Suite log file. Write failures are reported once, then the log is dropped.
struct LogSink {
    path: PathBuf,
    file: Option<File>,
}

impl LogSink {
    fn open(path: &Path, append: bool) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = OpenOptions::new();
        if append {
            options.create(true).append(true);
        } else {
            options.create(true).write(true).truncate(true);
        }
        let file = options.open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    fn write_header(&mut self, header: &str) {
        self.write_line(header);
        if !header.ends_with('\n') {
            self.write_line("\n");
        }
        self.flush();
    }

    fn write_line(&mut self, text: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(err) = file.write_all(text.as_bytes()) {
            warn!(path = %self.path.display(), error = %err, "log write failed; disabling log");
            self.file = None;
        }
    }

    fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(name: SuiteName, script: &str, cwd: &Path) -> CommandSpec {
        CommandSpec::new(
            name,
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            cwd,
        )
    }

    #[test]
    fn test_success_collects_output() {
        let temp = TempDir::new().expect("temp dir");
        let spec = sh(SuiteName::Backend, "echo one; echo two", temp.path());
        let result = run_command(&spec).expect("run");
        assert_eq!(result.status, SuiteStatus::Ok);
        assert_eq!(result.return_code, 0);
        assert_eq!(result.output_tail, vec!["one", "two"]);
        assert!(result.duration >= 0.0);
    }

    #[test]
    fn test_nonzero_exit_is_failed() {
        let temp = TempDir::new().expect("temp dir");
        let spec = sh(SuiteName::Backend, "echo broken >&2; exit 3", temp.path());
        let result = run_command(&spec).expect("run");
        assert_eq!(result.status, SuiteStatus::Failed);
        assert_eq!(result.return_code, 3);
        assert_eq!(result.output_tail, vec!["broken"]);
    }

    #[test]
    fn test_missing_program_returns_127() {
        let temp = TempDir::new().expect("temp dir");
        let log_path = temp.path().join("reports").join("backend.log");
        let mut spec = CommandSpec::new(
            SuiteName::Backend,
            vec!["definitely-not-a-real-program-xyz".to_string()],
            temp.path(),
        );
        spec.log_path = Some(log_path.clone());
        let result = run_command(&spec).expect("run");
        assert_eq!(result.return_code, NOT_FOUND_CODE);
        assert_eq!(result.status, SuiteStatus::Failed);
        assert_eq!(result.output_tail.len(), 1);
        assert!(result.output_tail[0].contains("definitely-not-a-real-program-xyz"));
        let log = fs::read_to_string(log_path).expect("log");
        assert!(log.contains("definitely-not-a-real-program-xyz"));
    }

    #[test]
    fn test_unopenable_log_still_runs_command() {
        let temp = TempDir::new().expect("temp dir");
        let log_path = temp.path().join("backend.log");
        fs::create_dir_all(&log_path).expect("directory in place of log");
        let mut spec = sh(SuiteName::Backend, "echo ran", temp.path());
        spec.log_path = Some(log_path.clone());
        let result = run_command(&spec).expect("run");
        assert_eq!(result.status, SuiteStatus::Ok);
        assert_eq!(result.return_code, 0);
        assert_eq!(result.output_tail, vec!["ran"]);
        assert!(log_path.is_dir());
    }

    #[test]
    fn test_overwrite_log_drops_old_content() {
        let temp = TempDir::new().expect("temp dir");
        let log_path = temp.path().join("backend.log");
        fs::write(&log_path, "OLD\n").expect("seed log");
        let mut spec = sh(SuiteName::Backend, "echo NEW", temp.path());
        spec.log_path = Some(log_path.clone());
        spec.log_header = Some("HEADER".to_string());
        run_command(&spec).expect("run");
        let log = fs::read_to_string(log_path).expect("log");
        assert!(!log.contains("OLD"));
        assert!(!log.contains("HEADER"));
        assert_eq!(log, "NEW\n");
    }

    #[test]
    fn test_append_log_preserves_order() {
        let temp = TempDir::new().expect("temp dir");
        let log_path = temp.path().join("frontend-unit.log");
        fs::write(&log_path, "OLD\n").expect("seed log");
        let mut spec = sh(SuiteName::FrontendUnit, "echo NEW", temp.path());
        spec.log_path = Some(log_path.clone());
        spec.append_log = true;
        spec.log_header = Some("=== HEADER ===".to_string());
        run_command(&spec).expect("run");
        let log = fs::read_to_string(log_path).expect("log");
        assert_eq!(log, "OLD\n=== HEADER ===\nNEW\n");
    }

    #[test]
    fn test_tail_keeps_last_forty_lines() {
        let temp = TempDir::new().expect("temp dir");
        let spec = sh(
            SuiteName::FrontendE2e,
            "i=1; while [ $i -le 100 ]; do echo line$i; i=$((i+1)); done",
            temp.path(),
        );
        let result = run_command(&spec).expect("run");
        assert_eq!(result.output_tail.len(), 40);
        assert_eq!(result.output_tail[0], "line61");
        assert_eq!(result.output_tail[39], "line100");
    }

    #[test]
    fn test_coverage_block_extracted_when_enabled() {
        let temp = TempDir::new().expect("temp dir");
        let script = "echo '3 passed'; echo '==== Coverage summary ===='; \
                      echo 'Statements: 75.00% (3/4)'; echo '=========='; echo done";
        let mut spec = sh(SuiteName::Backend, script, temp.path());
        spec.capture_coverage = true;
        let result = run_command(&spec).expect("run");
        assert_eq!(
            result.coverage_lines,
            vec!["==== Coverage summary ====", "Statements: 75.00% (3/4)"]
        );

        spec.capture_coverage = false;
        let result = run_command(&spec).expect("run");
        assert!(result.coverage_lines.is_empty());
    }

    #[test]
    fn test_verbose_echo_streams_banner_and_lines() {
        let temp = TempDir::new().expect("temp dir");
        let mut spec = sh(SuiteName::Backend, "echo hello", temp.path());
        spec.quiet = false;
        let mut echo = Vec::new();
        run_command_with_echo(&spec, &mut echo).expect("run");
        let text = String::from_utf8(echo).expect("utf8");
        assert!(text.contains("Running step: backend"));
        assert!(text.contains("Command: sh -c echo hello"));
        assert!(text.ends_with("hello\n"));
    }

    #[test]
    fn test_quiet_echo_writes_nothing() {
        let temp = TempDir::new().expect("temp dir");
        let spec = sh(SuiteName::Backend, "echo hello", temp.path());
        let mut echo = Vec::new();
        run_command_with_echo(&spec, &mut echo).expect("run");
        assert!(echo.is_empty());
    }

    #[test]
    fn test_env_overrides_reach_child() {
        let temp = TempDir::new().expect("temp dir");
        let mut spec = sh(SuiteName::FrontendE2e, "echo $SUITE_RUNNER_MARKER", temp.path());
        spec.env.push(("SUITE_RUNNER_MARKER".to_string(), "visible".to_string()));
        let result = run_command(&spec).expect("run");
        assert_eq!(result.output_tail, vec!["visible"]);
    }
}
