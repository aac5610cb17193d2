//! bmlt CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use bmlt_client::cli::{Cli, Command, ConfigAction};
use bmlt_client::commands::{config as config_cmd, server};
use bmlt_client::config::ClientConfig;
use bmlt_client::error::{ClientError, ClientResult};
use bmlt_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(TracingConfig::for_cli(cli.debug)) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    match &cli.command {
        Command::Connect => server::connect(&cli, &config).await,
        Command::Search { query } => server::search(&cli, &config, query).await,
        Command::Changes {
            from,
            to,
            meeting,
            service_body,
        } => {
            let filter = server::ChangeFilter {
                from: *from,
                to: *to,
                meeting: *meeting,
                service_body: *service_body,
            };
            server::changes(&cli, &config, filter).await
        }
        Command::Deleted {
            service_body,
            from,
            to,
        } => server::deleted(&cli, &config, service_body, *from, *to).await,
        Command::Login { user, password } => {
            server::login(&cli, &config, user.as_deref(), password.as_deref()).await
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => config_cmd::dump(&config),
            ConfigAction::Path => config_cmd::path(),
        },
    }
}
