use clap::Subcommand;
use stargazer::dto::IssueBadgeDto;
use stargazer::models::BadgeDesign;

use crate::client::StargazerClient;
use crate::output::{self, OutputConfig};

/// Membership badge commands
#[derive(Subcommand, Debug)]
pub enum BadgeCommands {
    /// Show your current badge
    Mine,
    /// Issue (or reissue) a badge for a member (admin)
    Issue {
        /// The member ID
        member_id: String,
        /// Label printed on the badge; defaults to the member's name
        #[clap(long)]
        label: Option<String>,
        /// JSON design parameters for the print shop
        #[clap(long)]
        design: Option<String>,
    },
    /// List every badge ever issued (admin)
    List,
}

/// Executes a badge command
pub async fn execute(
    client: &StargazerClient,
    cmd: BadgeCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        BadgeCommands::Mine => {
            let badge = client.my_badge().await?;
            output::print_badge(&badge, config);
        }
        BadgeCommands::Issue {
            member_id,
            label,
            design,
        } => {
            let design = design
                .map(|d| serde_json::from_str(&d))
                .transpose()?
                .map(BadgeDesign);
            let dto = IssueBadgeDto { label, design };
            let badge = client.issue_badge(&member_id, &dto).await?;
            output::print_badge(&badge, config);
        }
        BadgeCommands::List => {
            let badges = client.list_badges().await?;
            output::print_badges(&badges, config);
        }
    }
    Ok(())
}
