use clap::Subcommand;
use chrono::{DateTime, Utc};
use stargazer::dto::{CreateEventDto, EventQueryDto, QuoteRequestDto, UpdateEventDto};
use stargazer::models::EventKind;

use crate::client::StargazerClient;
use crate::output::{self, OutputConfig};

/// Parses an event kind from the command line
fn parse_kind(s: &str) -> Result<EventKind, String> {
    match s {
        "meeting" => Ok(EventKind::Meeting),
        "star_party" => Ok(EventKind::StarParty),
        "workshop" => Ok(EventKind::Workshop),
        other => Err(format!(
            "unknown event kind: {} (use meeting, star_party or workshop)",
            other
        )),
    }
}

/// Event calendar commands
#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// List upcoming events
    List {
        /// Only events of this kind (meeting, star_party or workshop)
        #[clap(long, value_parser = parse_kind)]
        kind: Option<EventKind>,
        /// Include events that have already ended
        #[clap(long)]
        include_past: bool,
        /// Include unpublished drafts (admin only)
        #[clap(long)]
        include_unpublished: bool,
    },
    /// Get a specific event by ID
    Get {
        /// The event ID
        id: String,
    },
    /// Create a new event
    Create {
        /// The event title
        #[clap(long)]
        title: String,
        /// A longer description
        #[clap(long, default_value = "")]
        description: String,
        /// The event kind (meeting, star_party or workshop)
        #[clap(long, value_parser = parse_kind)]
        kind: EventKind,
        /// Where the event takes place
        #[clap(long)]
        location: String,
        /// Start time, RFC 3339
        #[clap(long, value_parser = super::parse_datetime)]
        starts: DateTime<Utc>,
        /// End time, RFC 3339
        #[clap(long, value_parser = super::parse_datetime)]
        ends: DateTime<Utc>,
        /// Registration cap; 0 means unlimited
        #[clap(long, default_value_t = 0)]
        capacity: i32,
        /// Early-bird pricing deadline, RFC 3339
        #[clap(long, value_parser = super::parse_datetime)]
        early_bird: Option<DateTime<Utc>>,
        /// Keep the event as an unpublished draft
        #[clap(long)]
        draft: bool,
    },
    /// Update an existing event
    Update {
        /// The event ID
        id: String,
        /// New title
        #[clap(long)]
        title: Option<String>,
        /// New description
        #[clap(long)]
        description: Option<String>,
        /// New location
        #[clap(long)]
        location: Option<String>,
        /// New start time, RFC 3339
        #[clap(long, value_parser = super::parse_datetime)]
        starts: Option<DateTime<Utc>>,
        /// New end time, RFC 3339
        #[clap(long, value_parser = super::parse_datetime)]
        ends: Option<DateTime<Utc>>,
        /// New registration cap; 0 means unlimited
        #[clap(long)]
        capacity: Option<i32>,
        /// Publish or unpublish the event
        #[clap(long)]
        published: Option<bool>,
    },
    /// Delete an event
    Delete {
        /// The event ID
        id: String,
    },
    /// Price a star-party registration without committing to it
    Quote {
        /// The event ID
        id: String,
        /// Number of adults attending
        #[clap(long, default_value_t = 1)]
        adults: i32,
        /// Number of children attending
        #[clap(long, default_value_t = 0)]
        children: i32,
        /// Number of camping nights
        #[clap(long, default_value_t = 0)]
        nights: i32,
        /// Include the meal plan
        #[clap(long)]
        meal_plan: bool,
    },
}

/// Executes an event command
pub async fn execute(
    client: &StargazerClient,
    cmd: EventCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        EventCommands::List {
            kind,
            include_past,
            include_unpublished,
        } => {
            let query = EventQueryDto {
                kind,
                include_past,
                include_unpublished,
            };
            let events = client.list_events(&query).await?;
            output::print_events(&events, config);
        }
        EventCommands::Get { id } => {
            let event = client.get_event(&id).await?;
            output::print_event(&event, config);
        }
        EventCommands::Create {
            title,
            description,
            kind,
            location,
            starts,
            ends,
            capacity,
            early_bird,
            draft,
        } => {
            let dto = CreateEventDto {
                title,
                description,
                kind,
                location,
                starts_at: starts,
                ends_at: ends,
                capacity,
                early_bird_deadline: early_bird,
                published: !draft,
            };
            let event = client.create_event(&dto).await?;
            output::print_event(&event, config);
        }
        EventCommands::Update {
            id,
            title,
            description,
            location,
            starts,
            ends,
            capacity,
            published,
        } => {
            let dto = UpdateEventDto {
                title,
                description,
                location,
                starts_at: starts,
                ends_at: ends,
                capacity,
                published,
                ..Default::default()
            };
            let event = client.update_event(&id, &dto).await?;
            output::print_event(&event, config);
        }
        EventCommands::Delete { id } => {
            client.delete_event(&id).await?;
            output::print_success(&format!("Deleted event {}", id), config);
        }
        EventCommands::Quote {
            id,
            adults,
            children,
            nights,
            meal_plan,
        } => {
            let dto = QuoteRequestDto {
                adults,
                children,
                nights,
                meal_plan,
            };
            let quote = client.quote_event(&id, &dto).await?;
            output::print_quote(&quote, config);
        }
    }
    Ok(())
}
