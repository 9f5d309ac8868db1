use clap::Subcommand;
use chrono::{DateTime, Utc};
use stargazer::dto::CreateBoardMemberDto;

use crate::client::StargazerClient;
use crate::output::{self, OutputConfig};

/// Board roster commands
#[derive(Subcommand, Debug)]
pub enum BoardCommands {
    /// Show the current board roster
    Roster,
    /// Appoint a member to a board seat (admin)
    Appoint {
        /// The member ID
        #[clap(long)]
        member: String,
        /// The office title (e.g. "President")
        #[clap(long)]
        office: String,
        /// Position in the roster, lowest first
        #[clap(long, default_value_t = 0)]
        sort_order: i32,
        /// When the term starts, RFC 3339
        #[clap(long, value_parser = super::parse_datetime)]
        term_starts: DateTime<Utc>,
        /// When the term ends, RFC 3339
        #[clap(long, value_parser = super::parse_datetime)]
        term_ends: DateTime<Utc>,
    },
    /// Remove a seat from the roster (admin)
    Remove {
        /// The board seat ID
        id: String,
    },
}

/// Executes a board command
pub async fn execute(
    client: &StargazerClient,
    cmd: BoardCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        BoardCommands::Roster => {
            let roster = client.board_roster().await?;
            output::print_roster(&roster, config);
        }
        BoardCommands::Appoint {
            member,
            office,
            sort_order,
            term_starts,
            term_ends,
        } => {
            let dto = CreateBoardMemberDto {
                user_id: member,
                office,
                sort_order,
                term_starts,
                term_ends,
            };
            let seat = client.appoint_board_member(&dto).await?;
            output::print_board_seat(&seat, config);
        }
        BoardCommands::Remove { id } => {
            client.remove_board_member(&id).await?;
            output::print_success(&format!("Removed board seat {}", id), config);
        }
    }
    Ok(())
}
