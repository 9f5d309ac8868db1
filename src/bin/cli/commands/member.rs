use clap::Subcommand;
use chrono::{DateTime, Utc};
use stargazer::dto::{MemberQueryDto, UpdateMemberDto};
use stargazer::models::UserRole;

use crate::client::StargazerClient;
use crate::output::{self, OutputConfig};

/// Parses a role name from the command line
fn parse_role(s: &str) -> Result<UserRole, String> {
    match s {
        "member" => Ok(UserRole::Member),
        "board" => Ok(UserRole::Board),
        "admin" => Ok(UserRole::Admin),
        other => Err(format!("unknown role: {} (use member, board or admin)", other)),
    }
}

/// Member administration commands
#[derive(Subcommand, Debug)]
pub enum MemberCommands {
    /// List member accounts
    List {
        /// Only accounts with this role (member, board or admin)
        #[clap(long, value_parser = parse_role)]
        role: Option<UserRole>,
        /// Match against name or email
        #[clap(long)]
        search: Option<String>,
        /// Include deactivated accounts
        #[clap(long)]
        include_deactivated: bool,
    },
    /// Change a member's role or push out their membership expiry
    Update {
        /// The member ID
        id: String,
        /// New role (member, board or admin)
        #[clap(long, value_parser = parse_role)]
        role: Option<UserRole>,
        /// New membership expiry, RFC 3339
        #[clap(long, value_parser = super::parse_datetime)]
        expires: Option<DateTime<Utc>>,
    },
    /// Deactivate a member account
    Deactivate {
        /// The member ID
        id: String,
    },
}

/// Executes a member command
pub async fn execute(
    client: &StargazerClient,
    cmd: MemberCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        MemberCommands::List {
            role,
            search,
            include_deactivated,
        } => {
            let query = MemberQueryDto {
                role,
                q: search,
                include_deactivated,
            };
            let members = client.list_members(&query).await?;
            output::print_users(&members, config);
        }
        MemberCommands::Update { id, role, expires } => {
            let dto = UpdateMemberDto {
                role,
                membership_expires: expires,
            };
            let member = client.update_member(&id, &dto).await?;
            output::print_user(&member, config);
        }
        MemberCommands::Deactivate { id } => {
            client.deactivate_member(&id).await?;
            output::print_success(&format!("Deactivated member {}", id), config);
        }
    }
    Ok(())
}
