// The binary uses the library, not duplicate modules
use brunnels::logging::setup_logging;
use brunnels::settings::Settings;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = Settings::parse();
    setup_logging(settings.verbose);

    match brunnels::run(&settings, std::io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
