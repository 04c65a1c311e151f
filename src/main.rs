use std::process::ExitCode;

use clap::Parser;

use action_extract::cli::{self, Cli};
use action_extract::config::APP_NAME;

fn main() -> ExitCode {
    // Usage errors exit with status 2 inside clap.
    let cli = Cli::parse();

    if cli.verbose {
        action_extract::init_tracing_with("debug");
    } else {
        action_extract::init_tracing();
    }

    let result = cli::run(&cli)
        .and_then(|output| cli::write_output(std::io::stdout().lock(), &output));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{APP_NAME}: {e}");
            ExitCode::FAILURE
        }
    }
}
