use clap::Parser;
use std::io::{self, IsTerminal};
use suite_runner::RunnerError;
use suite_runner::cli::commands;
use suite_runner::cli::{Cli, Commands};
use suite_runner::logging::init_logging;
use suite_runner::output::Palette;

fn main() {
    let cli = Cli::parse();

    let quiet = cli.command.is_none() && cli.run.quiet;
    if let Err(e) = init_logging(cli.debug, quiet) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let root = cli.root.as_deref();
    let result = match &cli.command {
        Some(Commands::CoverageReport(args)) => {
            commands::coverage::execute(args, root, cli.no_color)
        }
        None => commands::run::execute(&cli.run, root, cli.no_color),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => handle_error(&e, cli.no_color),
    }
}

/// Print a human-readable error with an optional hint and exit.
fn handle_error(err: &RunnerError, no_color: bool) -> ! {
    let use_color =
        !no_color && std::env::var_os("NO_COLOR").is_none() && io::stderr().is_terminal();
    let palette = Palette::new(use_color);

    eprintln!("{} {err}", palette.bold_red("Error:"));
    if let Some(hint) = err.suggestion() {
        eprintln!("{} {hint}", palette.yellow("Hint:"));
    }

    std::process::exit(err.exit_code());
}
