//! dnsvakt binary: load settings, assemble the pipeline, run until signalled.

use std::process;

use tracing::error;

use dnsvakt_config::{ConfigError, Settings};
use dnsvakt_engine::{exit_code, Supervisor};

fn main() {
    dnsvakt_telemetry::logging::init();
    process::exit(run());
}

fn run() -> i32 {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(ConfigError::Help(usage)) => {
            println!("{usage}");
            return exit_code::HELP;
        }
        Err(error) => {
            error!("{error}");
            return exit_code::ARGUMENT_CHECK;
        }
    };

    let supervisor = match Supervisor::new(settings) {
        Ok(supervisor) => supervisor,
        Err(error) => {
            error!("{error}");
            return error.exit_code();
        }
    };

    match supervisor.run() {
        Ok(()) => exit_code::SUCCESS,
        Err(error) => {
            error!("{error}");
            error.exit_code()
        }
    }
}
