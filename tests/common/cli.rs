//! Workspace fixture with fake `python3`, `npm` and `npx` on `PATH`.
//!
//! Each fake prints its arguments and working directory, appends its suite
//! name to `calls.txt`, and exits with `FAKE_<SUITE>_EXIT` (default 0).

use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

#[derive(Debug)]
pub struct RunnerRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl RunnerRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

pub struct SuiteWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub bin_dir: PathBuf,
    pub log_dir: PathBuf,
}

const BACKEND_SCRIPT: &str = r#"#!/bin/sh
echo backend >> "$FAKE_CALLS"
echo "backend args: $*"
echo "backend cwd: $(pwd)"
if [ -n "$FAKE_BACKEND_COVERAGE" ]; then
  echo "Coverage summary"
  echo "Statements: 90.00% (9/10)"
  echo "Total: 90.00% (9/10)"
  echo "================================"
fi
echo "backend stderr line" >&2
exit ${FAKE_BACKEND_EXIT:-0}
"#;

const UNIT_SCRIPT: &str = r#"#!/bin/sh
echo frontend-unit >> "$FAKE_CALLS"
echo "unit args: $*"
echo "unit cwd: $(pwd)"
if [ "${FAKE_UNIT_EXIT:-0}" != "0" ]; then
  echo "FAIL src/App.test.tsx"
fi
exit ${FAKE_UNIT_EXIT:-0}
"#;

const E2E_SCRIPT: &str = r#"#!/bin/sh
echo frontend-e2e >> "$FAKE_CALLS"
echo "e2e args: $*"
echo "e2e cwd: $(pwd)"
exit ${FAKE_E2E_EXIT:-0}
"#;

impl SuiteWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().join("repo");
        let bin_dir = temp_dir.path().join("bin");
        let log_dir = temp_dir.path().join("logs");
        for dir in [
            root.join("backend"),
            root.join("frontend"),
            bin_dir.clone(),
            log_dir.clone(),
        ] {
            fs::create_dir_all(dir).expect("workspace dir");
        }
        let workspace = Self {
            temp_dir,
            root,
            bin_dir,
            log_dir,
        };
        workspace.write_tool("python3", BACKEND_SCRIPT);
        workspace.write_tool("npm", UNIT_SCRIPT);
        workspace.write_tool("npx", E2E_SCRIPT);
        workspace
    }

    pub fn write_tool(&self, name: &str, body: &str) {
        let path = self.bin_dir.join(name);
        fs::write(&path, body).expect("write tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod tool");
    }

    pub fn remove_tool(&self, name: &str) {
        fs::remove_file(self.bin_dir.join(name)).expect("remove tool");
    }

    pub fn calls_path(&self) -> PathBuf {
        self.temp_dir.path().join("calls.txt")
    }

    /// Suite names the fakes recorded, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.calls_path())
            .unwrap_or_default()
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    pub fn clear_calls(&self) {
        let _ = fs::remove_file(self.calls_path());
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.join("test-reports")
    }

    pub fn suite_log(&self, suite: &str) -> String {
        fs::read_to_string(self.report_dir().join(format!("{suite}.log"))).unwrap_or_default()
    }

    pub fn resume_summary(&self) -> serde_json::Value {
        let raw = fs::read_to_string(self.report_dir().join("last-run.json")).expect("summary");
        serde_json::from_str(&raw).expect("summary json")
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir");
        }
        fs::write(path, contents).expect("write file");
    }

    fn path_var(&self, isolated: bool) -> String {
        if isolated {
            return self.bin_dir.display().to_string();
        }
        let system = std::env::var("PATH").unwrap_or_default();
        format!("{}:{system}", self.bin_dir.display())
    }
}

pub fn run_suite_runner<I, S>(workspace: &SuiteWorkspace, args: I, label: &str) -> RunnerRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_suite_runner_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_suite_runner_with_env<I, S, E, K, V>(
    workspace: &SuiteWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> RunnerRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    run_in(workspace, args, env_vars, label, false)
}

/// Run with only the fake tools on `PATH`.
pub fn run_suite_runner_isolated<I, S>(workspace: &SuiteWorkspace, args: I, label: &str) -> RunnerRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_in(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
        true,
    )
}

fn run_in<I, S, E, K, V>(
    workspace: &SuiteWorkspace,
    args: I,
    env_vars: E,
    label: &str,
    isolated_path: bool,
) -> RunnerRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("suite-runner"));
    cmd.current_dir(&workspace.root);
    cmd.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("SUITE_RUNNER_") || key.starts_with("FAKE_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("PATH", workspace.path_var(isolated_path));
    cmd.env("FAKE_CALLS", workspace.calls_path());
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "suite_runner=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);
    cmd.envs(env_vars);

    let start = Instant::now();
    let output = cmd.output().expect("run suite-runner");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    RunnerRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}
