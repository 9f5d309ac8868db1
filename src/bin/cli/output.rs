use clap::ValueEnum;
use stargazer::models::{Badge, BoardMember, Event, Listing, Payment, User};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or counts)
    pub quiet: bool,
}

/// Formats an amount of cents as dollars, e.g. `$45.00` or `-$10.00`
fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

/// Prints a list of member accounts in the specified format
pub fn print_users(users: &[User], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if users.is_empty() {
                if !config.quiet {
                    println!("No members found.");
                }
                return;
            }
            if config.quiet {
                for user in users {
                    println!("{}", user.get_id());
                }
                return;
            }
            let max_id = users.iter().map(|u| u.get_id().len()).max().unwrap_or(2);
            let max_name = users.iter().map(|u| u.get_name().len()).max().unwrap_or(4);
            let max_email = users.iter().map(|u| u.get_email().len()).max().unwrap_or(5);
            println!(
                "{:<id_w$}  {:<name_w$}  {:<email_w$}  {:<6}  EXPIRES",
                "ID",
                "NAME",
                "EMAIL",
                "ROLE",
                id_w = max_id,
                name_w = max_name,
                email_w = max_email,
            );
            for user in users {
                let expires = match user.get_membership_expires() {
                    Some(dt) => dt.format("%Y-%m-%d").to_string(),
                    None => "-".to_string(),
                };
                println!(
                    "{:<id_w$}  {:<name_w$}  {:<email_w$}  {:<6}  {}",
                    user.get_id(),
                    user.get_name(),
                    user.get_email(),
                    user.get_role().as_str(),
                    expires,
                    id_w = max_id,
                    name_w = max_name,
                    email_w = max_email,
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(users).unwrap());
        }
    }
}

/// Prints a single member account in the specified format
pub fn print_user(user: &User, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", user.get_id());
                return;
            }
            println!("ID:      {}", user.get_id());
            println!("Name:    {}", user.get_name());
            println!("Email:   {}", user.get_email());
            match user.get_phone() {
                Some(phone) => println!("Phone:   {}", phone),
                None => println!("Phone:   -"),
            }
            println!("Role:    {}", user.get_role());
            match user.get_membership_expires() {
                Some(dt) => println!("Expires: {}", dt.format("%Y-%m-%d")),
                None => println!("Expires: -"),
            }
            println!("Joined:  {}", user.get_created_at().format("%Y-%m-%d"));
            if let Some(dt) = user.get_deactivated_at() {
                println!("Deactivated: {}", dt.format("%Y-%m-%d"));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(user).unwrap());
        }
    }
}

/// Prints a list of events in the specified format
pub fn print_events(events: &[Event], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if events.is_empty() {
                if !config.quiet {
                    println!("No events found.");
                }
                return;
            }
            if config.quiet {
                for event in events {
                    println!("{}", event.get_id());
                }
                return;
            }
            let max_id = events.iter().map(|e| e.get_id().len()).max().unwrap_or(2);
            let max_title = events.iter().map(|e| e.get_title().len()).max().unwrap_or(5);
            println!(
                "{:<id_w$}  {:<title_w$}  {:<10}  {:<16}  LOCATION",
                "ID",
                "TITLE",
                "KIND",
                "STARTS",
                id_w = max_id,
                title_w = max_title,
            );
            for event in events {
                println!(
                    "{:<id_w$}  {:<title_w$}  {:<10}  {:<16}  {}",
                    event.get_id(),
                    event.get_title(),
                    event.get_event_kind().as_str(),
                    event.get_starts_at().format("%Y-%m-%d %H:%M"),
                    event.get_location(),
                    id_w = max_id,
                    title_w = max_title,
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(events).unwrap());
        }
    }
}

/// Prints a single event in the specified format
pub fn print_event(event: &Event, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", event.get_id());
                return;
            }
            println!("ID:         {}", event.get_id());
            println!("Title:      {}", event.get_title());
            println!("Kind:       {}", event.get_event_kind());
            println!("Location:   {}", event.get_location());
            println!("Starts:     {}", event.get_starts_at());
            println!("Ends:       {}", event.get_ends_at());
            if event.get_capacity() == 0 {
                println!("Capacity:   unlimited");
            } else {
                println!("Capacity:   {}", event.get_capacity());
            }
            match event.get_early_bird_deadline() {
                Some(dt) => println!("Early bird: until {}", dt.format("%Y-%m-%d")),
                None => println!("Early bird: none"),
            }
            let published = if event.is_published() { "yes" } else { "draft" };
            println!("Published:  {}", published);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(event).unwrap());
        }
    }
}

/// Prints a list of classified listings in the specified format
pub fn print_listings(listings: &[Listing], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if listings.is_empty() {
                if !config.quiet {
                    println!("No listings found.");
                }
                return;
            }
            if config.quiet {
                for listing in listings {
                    println!("{}", listing.get_id());
                }
                return;
            }
            let max_id = listings.iter().map(|l| l.get_id().len()).max().unwrap_or(2);
            let max_title = listings.iter().map(|l| l.get_title().len()).max().unwrap_or(5);
            let max_category = listings
                .iter()
                .map(|l| l.get_category().len())
                .max()
                .unwrap_or(8);
            println!(
                "{:<id_w$}  {:<title_w$}  {:<cat_w$}  {:>10}  STATUS",
                "ID",
                "TITLE",
                "CATEGORY",
                "PRICE",
                id_w = max_id,
                title_w = max_title,
                cat_w = max_category,
            );
            for listing in listings {
                println!(
                    "{:<id_w$}  {:<title_w$}  {:<cat_w$}  {:>10}  {}",
                    listing.get_id(),
                    listing.get_title(),
                    listing.get_category(),
                    format_cents(listing.get_price_cents()),
                    listing.get_status().as_str(),
                    id_w = max_id,
                    title_w = max_title,
                    cat_w = max_category,
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(listings).unwrap());
        }
    }
}

/// Prints a single listing in the specified format
pub fn print_listing(listing: &Listing, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", listing.get_id());
                return;
            }
            println!("ID:       {}", listing.get_id());
            println!("Seller:   {}", listing.get_seller_id());
            println!("Title:    {}", listing.get_title());
            println!("Category: {}", listing.get_category());
            println!("Price:    {}", format_cents(listing.get_price_cents()));
            println!("Status:   {}", listing.get_status());
            if let Some(dt) = listing.get_sold_at() {
                println!("Sold:     {}", dt.format("%Y-%m-%d"));
            }
            println!("Listed:   {}", listing.get_created_at().format("%Y-%m-%d"));
            println!();
            println!("{}", listing.get_description());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(listing).unwrap());
        }
    }
}

/// Prints a list of payments in the specified format
pub fn print_payments(payments: &[Payment], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if payments.is_empty() {
                if !config.quiet {
                    println!("No payments found.");
                }
                return;
            }
            if config.quiet {
                for payment in payments {
                    println!("{}", payment.get_id());
                }
                return;
            }
            let max_id = payments.iter().map(|p| p.get_id().len()).max().unwrap_or(2);
            println!(
                "{:<id_w$}  {:<12}  {:>10}  {:<9}  CREATED",
                "ID",
                "KIND",
                "AMOUNT",
                "STATUS",
                id_w = max_id,
            );
            for payment in payments {
                println!(
                    "{:<id_w$}  {:<12}  {:>10}  {:<9}  {}",
                    payment.get_id(),
                    payment.get_kind().as_str(),
                    format_cents(payment.get_amount_cents()),
                    payment.get_status().as_str(),
                    payment.get_created_at().format("%Y-%m-%d %H:%M"),
                    id_w = max_id,
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(payments).unwrap());
        }
    }
}

/// Prints a single payment in the specified format
pub fn print_payment(payment: &Payment, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", payment.get_id());
                return;
            }
            println!("ID:       {}", payment.get_id());
            println!("Member:   {}", payment.get_user_id());
            println!("Kind:     {}", payment.get_kind());
            println!("Amount:   {}", format_cents(payment.get_amount_cents()));
            println!("Status:   {}", payment.get_status());
            if let Some(designation) = payment.get_designation() {
                println!("For:      {}", designation);
            }
            if let Some(note) = payment.get_note() {
                println!("Note:     {}", note);
            }
            if let Some(provider_ref) = payment.get_provider_ref() {
                println!("Ref:      {}", provider_ref);
            }
            if let Some(dt) = payment.get_refunded_at() {
                let reason = payment.get_refund_reason().unwrap_or_default();
                println!("Refunded: {} ({})", dt.format("%Y-%m-%d"), reason);
            }
            println!("Created:  {}", payment.get_created_at());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(payment).unwrap());
        }
    }
}

/// Prints a list of badges in the specified format
pub fn print_badges(badges: &[Badge], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if badges.is_empty() {
                if !config.quiet {
                    println!("No badges found.");
                }
                return;
            }
            if config.quiet {
                for badge in badges {
                    println!("{}", badge.get_id());
                }
                return;
            }
            let max_id = badges.iter().map(|b| b.get_id().len()).max().unwrap_or(2);
            let max_label = badges.iter().map(|b| b.get_label().len()).max().unwrap_or(5);
            println!(
                "{:>6}  {:<id_w$}  {:<label_w$}  STATUS",
                "NUMBER",
                "ID",
                "LABEL",
                id_w = max_id,
                label_w = max_label,
            );
            for badge in badges {
                let status = match badge.get_revoked_at() {
                    Some(dt) => format!("revoked {}", dt.format("%Y-%m-%d")),
                    None => "active".to_string(),
                };
                println!(
                    "{:>6}  {:<id_w$}  {:<label_w$}  {}",
                    badge.get_badge_number(),
                    badge.get_id(),
                    badge.get_label(),
                    status,
                    id_w = max_id,
                    label_w = max_label,
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(badges).unwrap());
        }
    }
}

/// Prints a single badge in the specified format
pub fn print_badge(badge: &Badge, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", badge.get_id());
                return;
            }
            println!("ID:      {}", badge.get_id());
            println!("Member:  {}", badge.get_user_id());
            println!("Number:  {}", badge.get_badge_number());
            println!("Label:   {}", badge.get_label());
            println!("Design:  {}", badge.get_design().0);
            println!("Issued:  {}", badge.get_issued_at().format("%Y-%m-%d"));
            match badge.get_revoked_at() {
                Some(dt) => println!("Revoked: {}", dt.format("%Y-%m-%d")),
                None => println!("Revoked: no"),
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(badge).unwrap());
        }
    }
}

/// Prints the board roster from raw JSON entries (seat plus member name)
pub fn print_roster(roster: &[serde_json::Value], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if roster.is_empty() {
                if !config.quiet {
                    println!("No board members found.");
                }
                return;
            }
            if config.quiet {
                for entry in roster {
                    if let Some(id) = entry
                        .pointer("/board_member/id")
                        .and_then(|v| v.as_str())
                    {
                        println!("{}", id);
                    }
                }
                return;
            }
            for entry in roster {
                let office = entry
                    .pointer("/board_member/office")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                let name = entry.get("name").and_then(|v| v.as_str()).unwrap_or("?");
                let term_ends = entry
                    .pointer("/board_member/term_ends")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                println!("{:<20}  {:<24}  until {}", office, name, term_ends);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(roster).unwrap());
        }
    }
}

/// Prints a single board seat in the specified format
pub fn print_board_seat(seat: &BoardMember, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", seat.get_id());
                return;
            }
            println!("ID:     {}", seat.get_id());
            println!("Member: {}", seat.get_user_id());
            println!("Office: {}", seat.get_office());
            println!("Term:   {} to {}",
                seat.get_term_starts().format("%Y-%m-%d"),
                seat.get_term_ends().format("%Y-%m-%d"),
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(seat).unwrap());
        }
    }
}

/// Prints a registration quote from raw JSON (line items plus total)
pub fn print_quote(quote: &serde_json::Value, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            let total = quote
                .get("total_cents")
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            if config.quiet {
                println!("{}", format_cents(total));
                return;
            }
            if let Some(items) = quote.get("line_items").and_then(|v| v.as_array()) {
                for item in items {
                    let label = item.get("label").and_then(|v| v.as_str()).unwrap_or("?");
                    let amount = item
                        .get("amount_cents")
                        .and_then(|v| v.as_i64())
                        .unwrap_or(0);
                    println!("{:<36}  {:>10}", label, format_cents(amount));
                }
            }
            println!("{:<36}  {:>10}", "TOTAL", format_cents(total));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(quote).unwrap());
        }
    }
}

/// Prints a session envelope from raw JSON (token plus account)
///
/// In quiet mode only the token is printed, so it can be captured into
/// an environment variable.
pub fn print_session(session: &serde_json::Value, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            let token = session.get("token").and_then(|v| v.as_str()).unwrap_or("");
            if config.quiet {
                println!("{}", token);
                return;
            }
            let name = session
                .pointer("/user/name")
                .and_then(|v| v.as_str())
                .unwrap_or("?");
            println!("Logged in as {}", name);
            println!("Token: {}", token);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(session).unwrap());
        }
    }
}

/// Prints a donation checkout from raw JSON (payment plus checkout URL)
pub fn print_checkout(checkout: &serde_json::Value, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            let url = checkout
                .get("checkout_url")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if config.quiet {
                println!("{}", url);
                return;
            }
            if let Some(id) = checkout.pointer("/payment/id").and_then(|v| v.as_str()) {
                println!("Payment: {}", id);
            }
            println!("Pay at:  {}", url);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(checkout).unwrap());
        }
    }
}

/// Prints a simple success message (for operations that don't return data)
pub fn print_success(message: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                println!("{}", message);
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({"status": "ok", "message": message}))
                    .unwrap()
            );
        }
    }
}
