use std::process::ExitCode;

use clap::Parser;
use hierfig::Cli;
use hierfig::logging::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.execute() {
        Ok(outcome) => {
            let verb = if cli.dry_run { "would write" } else { "wrote" };
            for path in &outcome.files {
                println!("{verb} {}", path.display());
            }
            if outcome.report.is_success() {
                ExitCode::SUCCESS
            } else {
                for failure in &outcome.report.failures {
                    eprintln!("skipped {}: {}", failure.identifier, failure.error);
                }
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
