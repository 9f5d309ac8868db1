mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::StargazerClient;
use directories::ProjectDirs;
use output::{OutputConfig, OutputFormat};
use stargazer::config;
use std::process;

/// CLI for the Stargazer membership portal
#[derive(Parser, Debug)]
#[clap(name = "stargazer-cli", about = "CLI for the Stargazer membership portal")]
struct Cli {
    /// Server URL to connect to
    #[clap(
        long,
        env = "STARGAZER_URL",
        global = true
    )]
    server_url: Option<String>,

    /// Session token for commands that need a login
    #[clap(long, env = "STARGAZER_TOKEN", global = true)]
    token: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or tokens)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and manage the session
    #[command(subcommand)]
    Auth(commands::auth::AuthCommands),
    /// Browse the event calendar and price registrations
    #[command(subcommand)]
    Event(commands::event::EventCommands),
    /// Browse the classifieds corner
    #[command(subcommand)]
    Listing(commands::listing::ListingCommands),
    /// Administer member accounts
    #[command(subcommand)]
    Member(commands::member::MemberCommands),
    /// Payments, donations and refunds
    #[command(subcommand)]
    Payment(commands::payment::PaymentCommands),
    /// The board roster
    #[command(subcommand)]
    Board(commands::board::BoardCommands),
    /// Membership badges
    #[command(subcommand)]
    Badge(commands::badge::BadgeCommands),
}

/// Resolves the server URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > default
fn resolve_server_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    // Try reading from the same config file the server uses
    if let Some(proj_dirs) = ProjectDirs::from("org", "stargazer", "stargazer") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if let Ok(update) = config::config_from_file(Some(config_path)) {
            if let Some(url) = update.public_base_url {
                return url;
            }
        }
    }

    "http://localhost:3000".to_string()
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    // ClientError::Request wraps reqwest errors; check for connection issues
    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!(
            "Could not connect to server. Is stargazer running?\n  {}",
            err_string
        );
    }

    // ClientError::Server already formats as "Server error (STATUS): message"
    // so we can return it directly
    err_string
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = resolve_server_url(cli.server_url);
    let client = StargazerClient::new(server_url, cli.token);
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Auth(cmd) => commands::auth::execute(&client, cmd, &output_config).await,
        Commands::Event(cmd) => commands::event::execute(&client, cmd, &output_config).await,
        Commands::Listing(cmd) => commands::listing::execute(&client, cmd, &output_config).await,
        Commands::Member(cmd) => commands::member::execute(&client, cmd, &output_config).await,
        Commands::Payment(cmd) => commands::payment::execute(&client, cmd, &output_config).await,
        Commands::Board(cmd) => commands::board::execute(&client, cmd, &output_config).await,
        Commands::Badge(cmd) => commands::badge::execute(&client, cmd, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
