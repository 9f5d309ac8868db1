use clap::Subcommand;
use stargazer::dto::ListingQueryDto;
use stargazer::models::ListingStatus;

use crate::client::StargazerClient;
use crate::output::{self, OutputConfig};

/// Parses a listing status from the command line
fn parse_status(s: &str) -> Result<ListingStatus, String> {
    match s {
        "active" => Ok(ListingStatus::Active),
        "pending" => Ok(ListingStatus::Pending),
        "sold" => Ok(ListingStatus::Sold),
        "withdrawn" => Ok(ListingStatus::Withdrawn),
        "expired" => Ok(ListingStatus::Expired),
        other => Err(format!(
            "unknown listing status: {} (use active, pending, sold, withdrawn or expired)",
            other
        )),
    }
}

/// Classifieds browsing commands
#[derive(Subcommand, Debug)]
pub enum ListingCommands {
    /// List classified listings
    List {
        /// Only listings in this category
        #[clap(long)]
        category: Option<String>,
        /// Only listings with this status (active, pending, sold, withdrawn or expired)
        #[clap(long, value_parser = parse_status)]
        status: Option<ListingStatus>,
        /// Only listings by this seller
        #[clap(long)]
        seller: Option<String>,
        /// Match against title or description
        #[clap(long)]
        search: Option<String>,
    },
    /// Get a specific listing by ID
    Get {
        /// The listing ID
        id: String,
    },
}

/// Executes a listing command
pub async fn execute(
    client: &StargazerClient,
    cmd: ListingCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ListingCommands::List {
            category,
            status,
            seller,
            search,
        } => {
            let query = ListingQueryDto {
                category,
                status,
                seller_id: seller,
                q: search,
            };
            let listings = client.list_listings(&query).await?;
            output::print_listings(&listings, config);
        }
        ListingCommands::Get { id } => {
            let listing = client.get_listing(&id).await?;
            output::print_listing(&listing, config);
        }
    }
    Ok(())
}
