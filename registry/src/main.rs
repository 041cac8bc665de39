// Conference Registry
// Main entry point for the confreg binary

use clap::Parser;
use conference_registry::cli::{Cli, Command};
use conference_registry::config::Config;
use conference_registry::handlers::{
    handle_accounts, handle_login, handle_logout, handle_meeting, handle_paper, handle_review,
    handle_session, handle_signup, handle_stats, handle_whoami, report_error, OutputFormat,
};
use conference_registry::telemetry::init_telemetry_with_level;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match run(cli, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, format);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, format: OutputFormat) -> anyhow::Result<()> {
    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_or_create_at(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log beats the config file; RUST_LOG beats both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::debug!("confreg v{} ({} - {})", version, commit, timestamp);

    match cli.command {
        Command::Login {
            email,
            role,
            password,
        } => handle_login(email, role, password, &config, format).await,

        Command::Logout => handle_logout(&config, format).await,

        Command::Whoami => handle_whoami(&config, format).await,

        Command::Signup {
            name,
            email,
            role,
            affiliation,
            password,
        } => handle_signup(name, email, role, affiliation, password, &config, format).await,

        Command::Accounts => handle_accounts(&config, format).await,

        Command::Paper { action } => handle_paper(action, &config, format).await,

        Command::Review { action } => handle_review(action, &config, format).await,

        Command::Session { action } => handle_session(action, &config, format).await,

        Command::Meeting { action } => handle_meeting(action, &config, format).await,

        Command::Stats => handle_stats(&config, format).await,
    }
}
