use clap::Subcommand;
use stargazer::dto::{CreateDonationDto, PaymentQueryDto, RefundDto};
use stargazer::models::{PaymentKind, PaymentStatus};

use crate::client::StargazerClient;
use crate::output::{self, OutputConfig};

/// Parses a payment status from the command line
fn parse_status(s: &str) -> Result<PaymentStatus, String> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        "refunded" => Ok(PaymentStatus::Refunded),
        "failed" => Ok(PaymentStatus::Failed),
        other => Err(format!(
            "unknown payment status: {} (use pending, completed, refunded or failed)",
            other
        )),
    }
}

/// Parses a payment kind from the command line
fn parse_kind(s: &str) -> Result<PaymentKind, String> {
    match s {
        "registration" => Ok(PaymentKind::Registration),
        "donation" => Ok(PaymentKind::Donation),
        "dues" => Ok(PaymentKind::Dues),
        other => Err(format!(
            "unknown payment kind: {} (use registration, donation or dues)",
            other
        )),
    }
}

/// Payment ledger commands
#[derive(Subcommand, Debug)]
pub enum PaymentCommands {
    /// List payments (admin)
    List {
        /// Only payments with this status (pending, completed, refunded or failed)
        #[clap(long, value_parser = parse_status)]
        status: Option<PaymentStatus>,
        /// Only payments of this kind (registration, donation or dues)
        #[clap(long, value_parser = parse_kind)]
        kind: Option<PaymentKind>,
        /// Only payments by this member
        #[clap(long)]
        member: Option<String>,
    },
    /// Get a specific payment by ID (admin)
    Get {
        /// The payment ID
        id: String,
    },
    /// Refund a completed payment (admin)
    Refund {
        /// The payment ID
        id: String,
        /// Why the payment is being refunded
        #[clap(long)]
        reason: String,
    },
    /// Start a donation checkout
    Donate {
        /// Amount in cents
        #[clap(long)]
        amount_cents: i64,
        /// What the donation is for (e.g. "telescope fund")
        #[clap(long)]
        designation: Option<String>,
        /// A note to pass along with the donation
        #[clap(long)]
        note: Option<String>,
    },
}

/// Executes a payment command
pub async fn execute(
    client: &StargazerClient,
    cmd: PaymentCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        PaymentCommands::List {
            status,
            kind,
            member,
        } => {
            let query = PaymentQueryDto {
                status,
                kind,
                user_id: member,
            };
            let payments = client.list_payments(&query).await?;
            output::print_payments(&payments, config);
        }
        PaymentCommands::Get { id } => {
            let payment = client.get_payment(&id).await?;
            output::print_payment(&payment, config);
        }
        PaymentCommands::Refund { id, reason } => {
            let dto = RefundDto { reason };
            let payment = client.refund_payment(&id, &dto).await?;
            output::print_payment(&payment, config);
        }
        PaymentCommands::Donate {
            amount_cents,
            designation,
            note,
        } => {
            let dto = CreateDonationDto {
                amount_cents,
                designation,
                note,
            };
            let checkout = client.donate(&dto).await?;
            output::print_checkout(&checkout, config);
        }
    }
    Ok(())
}
