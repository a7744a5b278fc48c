//! Suite orchestration: selection, execution, reporting and resume state.
//!
//! A run moves through selection (enabled suites, filtered by the resume
//! summary), execution (sequential, or one scoped thread per suite), and
//! reporting (canonical order, final report, summary persisted). Every
//! suite runs inside a guard so an error or panic in one suite becomes a
//! failed result instead of aborting the others.

use crate::config::RunConfig;
use crate::error::Result;
use crate::model::{SuiteName, SuiteResult, sort_canonical};
use crate::output::{LiveProgress, print_final_report};
use crate::resume::{self, ResumeEntries};
use crate::suites::{Suite, SuiteContext, suites_from_config};
use crate::util::time::seconds;
use std::any::Any;
use std::fs;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const NOTHING_TO_RUN: &str = "All suites skipped. Nothing to run.";
pub const ALL_PASSED: &str =
    "All suites passed in the last run. Re-run without --resume to execute again.";

/// Fresh run identifier: 32 lowercase hex characters.
#[must_use]
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Run every enabled suite and return the process exit code.
///
/// # Errors
///
/// Returns an error only when writing to stdout fails; suite failures are
/// reported through the exit code.
pub fn run(config: &RunConfig) -> Result<i32> {
    // Not locked: suite threads echo to stdout concurrently.
    let mut out = io::stdout();
    run_with(config, suites_from_config(config), &mut out)
}

/// Orchestrate the given suites, writing messages and the report to `out`.
///
/// # Errors
///
/// See [`run`].
pub fn run_with(
    config: &RunConfig,
    enabled: Vec<Box<dyn Suite>>,
    out: &mut dyn Write,
) -> Result<i32> {
    if enabled.is_empty() {
        writeln!(out, "{NOTHING_TO_RUN}")?;
        return Ok(0);
    }

    let resume_path = config.resume_path();
    let existing = if config.resume {
        resume::load(&resume_path).map(|summary| resume::extract_entries(&summary))
    } else {
        discard_resume_file(&resume_path);
        None
    };

    let mut selected = select_suites(enabled, existing.as_ref());
    selected.sort_by_key(|suite| suite.name().order());
    if selected.is_empty() {
        writeln!(out, "{ALL_PASSED}")?;
        return Ok(0);
    }
    let names: Vec<SuiteName> = selected.iter().map(|suite| suite.name()).collect();
    info!(suites = ?names, resume = config.resume, "selected suites");

    let run_id = new_run_id();
    let ctx = SuiteContext::from_config(config, &run_id);
    let started = Instant::now();
    let mut results = if config.parallel && selected.len() > 1 {
        writeln!(out, "Running {} suites in parallel...", selected.len())?;
        out.flush()?;
        execute_parallel(&selected, &ctx, config)
    } else {
        execute_sequential(&selected, &ctx)
    };
    let wall_clock = seconds(started.elapsed());

    sort_canonical(&mut results);
    print_final_report(out, &results, wall_clock, config.palette)?;

    let merge_with = if config.resume {
        Some(existing.unwrap_or_default())
    } else {
        None
    };
    if let Err(err) = resume::build_and_persist(
        &resume_path,
        &results,
        &run_id,
        &config.root,
        &SuiteName::ALL,
        merge_with.as_ref(),
    ) {
        warn!(path = %resume_path.display(), error = %err, "failed to write resume summary");
        writeln!(out, "Warning: could not write {}: {err}", resume_path.display())?;
    }

    Ok(i32::from(results.iter().any(SuiteResult::is_failed)))
}

/// Keep suites that did not pass last time. Without prior entries every
/// enabled suite runs.
#[must_use]
pub fn select_suites(
    enabled: Vec<Box<dyn Suite>>,
    existing: Option<&ResumeEntries>,
) -> Vec<Box<dyn Suite>> {
    let Some(entries) = existing else {
        return enabled;
    };
    enabled
        .into_iter()
        .filter(|suite| {
            let status = resume::resume_status(entries.get(suite.name().as_str()));
            debug!(suite = %suite.name(), ?status, "resume status");
            status.needs_rerun()
        })
        .collect()
}

fn discard_resume_file(path: &std::path::Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed previous resume summary"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "could not remove resume summary"),
    }
}

fn execute_sequential(suites: &[Box<dyn Suite>], ctx: &SuiteContext) -> Vec<SuiteResult> {
    suites
        .iter()
        .map(|suite| run_guarded(suite.as_ref(), ctx))
        .collect()
}

fn execute_parallel(
    suites: &[Box<dyn Suite>],
    ctx: &SuiteContext,
    config: &RunConfig,
) -> Vec<SuiteResult> {
    let names: Vec<SuiteName> = suites.iter().map(|suite| suite.name()).collect();
    let progress = config
        .quiet
        .then(|| LiveProgress::start(&names, config.palette, Box::new(io::stdout())));

    let mut results = Vec::with_capacity(suites.len());
    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        for suite in suites {
            let tx = tx.clone();
            scope.spawn(move || {
                let _ = tx.send(run_guarded(suite.as_ref(), ctx));
            });
        }
        drop(tx);
        for result in rx {
            debug!(suite = %result.name, code = result.return_code, "suite finished");
            if let Some(progress) = &progress {
                progress.mark_done(result.name, result.status, result.duration);
            }
            results.push(result);
        }
    });

    if let Some(progress) = progress {
        progress.stop();
    }
    results
}

/// Run one suite, converting errors and panics into failed results.
#[must_use]
pub fn run_guarded(suite: &dyn Suite, ctx: &SuiteContext) -> SuiteResult {
    let name = suite.name();
    match panic::catch_unwind(AssertUnwindSafe(|| suite.run(ctx))) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!(suite = %name, error = %err, "suite errored");
            SuiteResult::internal_failure(name, err.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(suite = %name, panic = %message, "suite panicked");
            SuiteResult::internal_failure(name, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "suite panicked".to_string()
    }
}
