//! simfleet: batch device simulations across a fixed pool of simulator slots.

use std::process::ExitCode;

use simfleet_cli::presenter::CLIResultPresenter;
use simfleet_lib::{app, config, errors};
use simfleet_orchestration::interfaces::ResultPresenter;

fn main() -> ExitCode {
    let config = config::AppConfig::parse();

    let default_level = if config.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match app::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            CLIResultPresenter::new(config.verbose, config.quiet).present_error(&format!("{err:#}"));
            let code = errors::handle_error(&err);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
