//! Config file management. Runs without a session.

use stockpile_config::{BackendSettings, Config, Defaults, config_path, save_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { backend, email } => {
            let config = Config {
                backend: BackendSettings {
                    url: backend,
                    ..BackendSettings::default()
                },
                defaults: Defaults { email },
                ..Config::default()
            };
            save_config(&config)?;
            output::print_output(
                &format!("Wrote {}", config_path().display()),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
