//! E2E tests for the resume summary and `--resume` runs.
#![cfg(unix)]

mod common;

use common::cli::{SuiteWorkspace, run_suite_runner, run_suite_runner_with_env};
use serde_json::Value;

fn entry<'a>(summary: &'a Value, name: &str) -> &'a Value {
    summary["suites"]
        .as_array()
        .expect("suites array")
        .iter()
        .find(|suite| suite["name"] == name)
        .unwrap_or_else(|| panic!("no entry for {name}"))
}

#[test]
fn e2e_summary_records_every_suite_in_order() {
    let _log = common::test_log("e2e_summary_records_every_suite_in_order");
    let workspace = SuiteWorkspace::new();

    let run = run_suite_runner_with_env(
        &workspace,
        ["--parallel"],
        [("FAKE_E2E_EXIT", "4")],
        "summary",
    );
    assert_eq!(run.code(), Some(1));

    let summary = workspace.resume_summary();
    let run_id = summary["run_id"].as_str().expect("run id");
    assert_eq!(run_id.len(), 32);
    assert!(summary["generated_at"].as_str().unwrap().ends_with("+00:00"));

    let names: Vec<&str> = summary["suites"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["backend", "frontend-unit", "frontend-e2e"]);

    let backend = entry(&summary, "backend");
    assert_eq!(backend["status"], "ok");
    assert_eq!(backend["returncode"], 0);
    assert_eq!(backend["log_path"], "test-reports/backend.log");
    assert_eq!(backend["run_id"], run_id);
    assert_eq!(backend["command"][0], "python3");

    let e2e = entry(&summary, "frontend-e2e");
    assert_eq!(e2e["status"], "failed");
    assert_eq!(e2e["returncode"], 4);
}

#[test]
fn e2e_resume_reruns_only_failed_suites_and_appends_logs() {
    let _log = common::test_log("e2e_resume_reruns_only_failed_suites_and_appends_logs");
    let workspace = SuiteWorkspace::new();

    let first = run_suite_runner_with_env(
        &workspace,
        std::iter::empty::<&str>(),
        [("FAKE_UNIT_EXIT", "1")],
        "first",
    );
    assert_eq!(first.code(), Some(1));
    let first_id = workspace.resume_summary()["run_id"]
        .as_str()
        .unwrap()
        .to_string();
    workspace.clear_calls();

    let resumed = run_suite_runner(&workspace, ["--resume"], "resumed");
    assert_eq!(resumed.code(), Some(0), "stderr: {}", resumed.stderr);
    assert_eq!(workspace.calls(), vec!["frontend-unit"]);
    assert!(resumed.stdout.contains("  frontend-unit "));
    assert!(!resumed.stdout.contains("Running step: backend"));

    let summary = workspace.resume_summary();
    assert_eq!(summary["suites"].as_array().unwrap().len(), 3);
    assert_eq!(entry(&summary, "frontend-unit")["status"], "ok");
    assert_eq!(entry(&summary, "backend")["run_id"], first_id.as_str());
    assert_ne!(entry(&summary, "frontend-unit")["run_id"], first_id.as_str());

    let unit_log = workspace.suite_log("frontend-unit");
    let header = unit_log.find("Resume run: ").expect("resume header");
    assert!(unit_log[..header].contains("FAIL src/App.test.tsx"));
    assert!(unit_log[header..].contains("Suite: frontend-unit"));
    assert!(unit_log[header..].contains("Command: npm run test -- --silent"));
    assert_eq!(unit_log.matches("Resume run: ").count(), 1);
}

#[test]
fn e2e_resume_after_clean_run_has_nothing_to_do() {
    let _log = common::test_log("e2e_resume_after_clean_run_has_nothing_to_do");
    let workspace = SuiteWorkspace::new();

    assert_eq!(run_suite_runner(&workspace, ["--quiet"], "clean").code(), Some(0));
    workspace.clear_calls();

    let resumed = run_suite_runner(&workspace, ["--resume"], "resume_noop");
    assert_eq!(resumed.code(), Some(0));
    assert!(resumed.stdout.contains(
        "All suites passed in the last run. Re-run without --resume to execute again."
    ));
    assert!(workspace.calls().is_empty());
}

#[test]
fn e2e_resume_without_usable_summary_runs_everything() {
    let _log = common::test_log("e2e_resume_without_usable_summary_runs_everything");
    let workspace = SuiteWorkspace::new();

    let run = run_suite_runner(&workspace, ["--resume", "--quiet"], "resume_missing");
    assert_eq!(run.code(), Some(0));
    assert_eq!(workspace.calls().len(), 3);

    workspace.clear_calls();
    workspace.write("test-reports/last-run.json", "{ definitely not json");
    let run = run_suite_runner(&workspace, ["--resume", "--quiet"], "resume_corrupt");
    assert_eq!(run.code(), Some(0));
    assert_eq!(workspace.calls().len(), 3);
    assert_eq!(workspace.resume_summary()["suites"].as_array().unwrap().len(), 3);
}

#[test]
fn e2e_resume_treats_unknown_status_as_rerun() {
    let _log = common::test_log("e2e_resume_treats_unknown_status_as_rerun");
    let workspace = SuiteWorkspace::new();
    workspace.write(
        "test-reports/last-run.json",
        r#"{"run_id": "old", "suites": [
            {"name": "backend", "status": "ok", "returncode": 0, "custom": "kept"},
            {"name": "frontend-unit", "returncode": 0},
            {"name": "frontend-e2e", "status": "skipped"}
        ]}"#,
    );

    let run = run_suite_runner(&workspace, ["--resume", "--quiet"], "resume_unknown");
    assert_eq!(run.code(), Some(0));
    assert_eq!(workspace.calls(), vec!["frontend-e2e"]);

    let summary = workspace.resume_summary();
    assert_eq!(entry(&summary, "backend")["custom"], "kept");
    assert_eq!(entry(&summary, "frontend-e2e")["status"], "ok");
}

#[test]
fn e2e_fresh_run_replaces_previous_summary() {
    let _log = common::test_log("e2e_fresh_run_replaces_previous_summary");
    let workspace = SuiteWorkspace::new();
    workspace.write(
        "test-reports/last-run.json",
        r#"{"suites": [{"name": "frontend-e2e", "status": "failed", "returncode": 1}]}"#,
    );

    let run = run_suite_runner(
        &workspace,
        ["--skip-unit", "--skip-e2e"],
        "fresh_replaces",
    );
    assert_eq!(run.code(), Some(0));
    let summary = workspace.resume_summary();
    let suites = summary["suites"].as_array().unwrap();
    assert_eq!(suites.len(), 1);
    assert_eq!(suites[0]["name"], "backend");
    assert!(!workspace.suite_log("backend").contains("Resume run:"));
}
