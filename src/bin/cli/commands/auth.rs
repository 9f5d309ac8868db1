use clap::Subcommand;
use stargazer::dto::{LoginDto, RegisterDto};

use crate::client::StargazerClient;
use crate::output::{self, OutputConfig};

/// Session and account commands
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Register a new member account
    Register {
        /// Email address to register with
        #[clap(long)]
        email: String,
        /// Password for the new account
        #[clap(long)]
        password: String,
        /// Full name as it should appear on the roster
        #[clap(long)]
        name: String,
    },
    /// Log in and print a session token
    Login {
        /// Email address of the account
        #[clap(long)]
        email: String,
        /// Password of the account
        #[clap(long)]
        password: String,
    },
    /// Revoke the current session token
    Logout,
    /// Show the account behind the current token
    Whoami,
}

/// Executes an auth command
pub async fn execute(
    client: &StargazerClient,
    cmd: AuthCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AuthCommands::Register {
            email,
            password,
            name,
        } => {
            let dto = RegisterDto {
                email,
                password,
                name,
            };
            let session = client.register(&dto).await?;
            output::print_session(&session, config);
        }
        AuthCommands::Login { email, password } => {
            let dto = LoginDto { email, password };
            let session = client.login(&dto).await?;
            output::print_session(&session, config);
        }
        AuthCommands::Logout => {
            client.logout().await?;
            output::print_success("Logged out", config);
        }
        AuthCommands::Whoami => {
            let user = client.me().await?;
            output::print_user(&user, config);
        }
    }
    Ok(())
}
