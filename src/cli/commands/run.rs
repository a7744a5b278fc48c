use crate::cli::RunArgs;
use crate::config::{self, CliOverrides, RunConfig, RunFlags};
use crate::error::Result;
use crate::orchestrator;
use std::path::Path;
use tracing::debug;

/// Execute the suites.
///
/// # Errors
///
/// Returns an error if the root or configuration is invalid.
pub fn execute(args: &RunArgs, root: Option<&Path>, no_color: bool) -> Result<i32> {
    let root = config::resolve_root(root)?;
    let layer = config::load_config(&root, &build_cli_overrides(args))?;
    let config = RunConfig::resolve(&root, &layer, run_flags(args, no_color))?;
    debug!(root = %config.root.display(), parallel = config.parallel, quiet = config.quiet, "resolved run config");
    orchestrator::run(&config)
}

/// Switches only override lower layers when given.
fn build_cli_overrides(args: &RunArgs) -> CliOverrides {
    let switch = |on: bool| on.then_some(true);
    CliOverrides {
        report_dir: args.report_dir.clone(),
        backend_markers: args.backend_markers.clone(),
        backend_args: args.backend_args.clone(),
        unit_args: args.unit_args.clone(),
        e2e_args: args.e2e_args.clone(),
        unit_workers: args.unit_workers.clone(),
        e2e_workers: args.e2e_workers.clone(),
        skip_backend: switch(args.skip_backend),
        skip_unit: switch(args.skip_unit),
        skip_e2e: switch(args.skip_e2e),
        parallel: switch(args.parallel),
        coverage: switch(args.coverage),
    }
}

const fn run_flags(args: &RunArgs, no_color: bool) -> RunFlags {
    RunFlags {
        resume: args.resume,
        verbose: args.verbose,
        quiet: args.quiet,
        no_color,
    }
}
