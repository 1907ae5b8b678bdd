mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stockpile_core::Session;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a session
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions need no session
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "stockpile", &mut std::io::stdout());
            Ok(())
        }

        // All other commands sign in, run, and sign out
        cmd => {
            let file_config = config::load_config_or_default();
            let session_config = config::resolve_session_config(&file_config, &cli.global)?;
            let (email, password) = config::resolve_credentials(&file_config, &cli.global)?;
            let global = &cli.global;

            tracing::debug!(command = ?cmd, "dispatching command");
            Session::oneshot(session_config, &email, &password, |session| async move {
                commands::dispatch(cmd, &session, global).await
            })
            .await
        }
    }
}
