use std::process::ExitCode;

use clap::Parser;

use rowgraph::cli::{self, Cli};
use rowgraph::observability::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.resolve_config() {
        Ok(config) => config.logging.filter,
        Err(_) => rowgraph::observability::DEFAULT_FILTER.to_string(),
    };
    init_logging(&filter);

    let stdout = std::io::stdout();
    match cli::run(&cli, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
