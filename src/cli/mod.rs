//! CLI definitions and entry point.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Run backend pytest, frontend unit and E2E test suites with reporting
#[derive(Parser, Debug)]
#[command(name = "suite-runner", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Repository root containing backend/ and frontend/ (default: current directory)
    #[arg(long, global = true, env = "SUITE_RUNNER_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase diagnostic logging on stderr (-d, -dd)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the backend coverage table from a coverage JSON report
    CoverageReport(CoverageReportArgs),
}

/// Options for running the suites (the default command).
#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// pytest marker expression passed as -m
    #[arg(long, value_name = "EXPR", allow_hyphen_values = true)]
    pub backend_markers: Option<String>,

    /// Extra pytest arguments, as one shell-quoted string
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub backend_args: Option<String>,

    /// Extra Jest arguments, as one shell-quoted string
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub unit_args: Option<String>,

    /// Extra Playwright arguments, as one shell-quoted string
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub e2e_args: Option<String>,

    /// Jest --maxWorkers value
    #[arg(long, value_name = "N")]
    pub unit_workers: Option<String>,

    /// Playwright --workers value
    #[arg(long, value_name = "N")]
    pub e2e_workers: Option<String>,

    /// Skip the backend suite
    #[arg(long)]
    pub skip_backend: bool,

    /// Skip the frontend unit suite
    #[arg(long)]
    pub skip_unit: bool,

    /// Skip the frontend E2E suite
    #[arg(long)]
    pub skip_e2e: bool,

    /// Run suites in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Re-run only suites that did not pass in the last run
    #[arg(long)]
    pub resume: bool,

    /// Stream suite output even in parallel mode
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress suite output; show only the summary
    #[arg(long)]
    pub quiet: bool,

    /// Collect coverage for every suite
    #[arg(long)]
    pub coverage: bool,

    /// Directory for suite logs and the resume summary
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CoverageReportArgs {
    /// Coverage JSON report (default: <root>/backend/coverage.json)
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Application package to report on
    #[arg(long, value_name = "NAME")]
    pub package: Option<String>,

    /// Terminal width used for the table (default: detected)
    #[arg(long, value_name = "COLS")]
    pub width: Option<usize>,
}
