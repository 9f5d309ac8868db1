use crate::db::{DbPool, ExecuteWithRetry};
use crate::dto::PaymentQueryDto;
use crate::models::{Payment, PaymentStatus};
use crate::schema::payments;
use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument, warn};

/// Records a payment in the ledger
///
/// The caller builds the `Payment` first (the processor is contacted
/// before anything is written, so the provider reference is already on
/// the row when it lands).
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `payment` - The payment to record
///
/// ### Returns
///
/// A Result containing the recorded Payment if successful
#[instrument(skip(pool, payment), fields(payment_id = %payment.get_id()))]
pub async fn create_payment(pool: &DbPool, payment: &Payment) -> Result<Payment> {
    debug!("Recording {} payment of {} cents", payment.get_kind(), payment.get_amount_cents());

    let conn = &mut pool.get()?;
    diesel::insert_into(payments::table)
        .values(payment.clone())
        .execute_with_retry(conn)
        .await?;

    info!("Recorded payment with id: {}", payment.get_id());

    Ok(payment.clone())
}

/// Retrieves a payment from the database by its ID
#[instrument(skip(pool), fields(payment_id = %payment_id))]
pub fn get_payment(pool: &DbPool, payment_id: &str) -> Result<Option<Payment>> {
    let conn = &mut pool.get()?;

    let result = payments::table
        .find(payment_id)
        .first::<Payment>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a payment by the processor's reference
///
/// This is the lookup webhooks use; the reference is what the processor
/// knows the payment by.
#[instrument(skip(pool), fields(provider_ref = %provider_ref))]
pub fn get_payment_by_provider_ref(pool: &DbPool, provider_ref: &str) -> Result<Option<Payment>> {
    let conn = &mut pool.get()?;

    let result = payments::table
        .filter(payments::provider_ref.eq(provider_ref))
        .first::<Payment>(conn)
        .optional()?;

    Ok(result)
}

/// Lists payments with optional filtering, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `query` - Status, kind, and user filters
///
/// ### Returns
///
/// A Result containing a vector of Payments matching the filters
#[instrument(skip(pool, query))]
pub fn list_payments(pool: &DbPool, query: &PaymentQueryDto) -> Result<Vec<Payment>> {
    debug!("Listing payments with filters: {:?}", query);

    let conn = &mut pool.get()?;

    let mut payment_query = payments::table.into_boxed();

    if let Some(status) = query.status {
        debug!("Filtering by status: {}", status);
        payment_query = payment_query.filter(payments::status.eq(status));
    }

    if let Some(kind) = query.kind {
        debug!("Filtering by kind: {}", kind);
        payment_query = payment_query.filter(payments::kind.eq(kind));
    }

    if let Some(user_id) = &query.user_id {
        debug!("Filtering by user: {}", user_id);
        payment_query = payment_query.filter(payments::user_id.eq(user_id.clone()));
    }

    let results = payment_query
        .order_by(payments::created_at.desc())
        .load::<Payment>(conn)?;

    info!("Retrieved {} payments matching filters", results.len());

    Ok(results)
}

/// Lists a user's payments, newest first
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_payments_for_user(pool: &DbPool, user_id: &str) -> Result<Vec<Payment>> {
    let conn = &mut pool.get()?;

    let results = payments::table
        .filter(payments::user_id.eq(user_id))
        .order_by(payments::created_at.desc())
        .load::<Payment>(conn)?;

    Ok(results)
}

/// Settles a pending payment from a processor notification
///
/// Webhook deliveries are retried, so settling a payment that already
/// carries the target status is a no-op rather than an error. Moving a
/// payment that settled the other way (or was refunded) is refused.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `provider_ref` - The processor's reference for the payment
/// * `outcome` - `Completed` or `Failed`
///
/// ### Returns
///
/// A Result containing the settled Payment
///
/// ### Errors
///
/// Returns an error if:
/// - The outcome is not a settlement status
/// - No payment carries the reference
/// - The payment already settled differently
#[instrument(skip(pool), fields(provider_ref = %provider_ref))]
pub async fn settle_payment(
    pool: &DbPool,
    provider_ref: &str,
    outcome: PaymentStatus,
) -> Result<Payment> {
    if !matches!(outcome, PaymentStatus::Completed | PaymentStatus::Failed) {
        return Err(anyhow!("{} is not a settlement status", outcome));
    }

    let payment = get_payment_by_provider_ref(pool, provider_ref)?
        .ok_or(anyhow!("No payment with provider reference {}", provider_ref))?;

    if payment.get_status() == outcome {
        debug!("Payment {} already {}, ignoring re-delivery", payment.get_id(), outcome);
        return Ok(payment);
    }

    if payment.get_status() != PaymentStatus::Pending {
        warn!(
            "Refusing to move payment {} from {} to {}",
            payment.get_id(),
            payment.get_status(),
            outcome
        );
        return Err(anyhow!(
            "Payment is not pending (status: {})",
            payment.get_status()
        ));
    }

    let conn = &mut pool.get()?;
    diesel::update(
        payments::table
            .find(payment.get_id())
            .filter(payments::status.eq(PaymentStatus::Pending)),
    )
    .set((
        payments::status.eq(outcome),
        payments::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute_with_retry(conn)
    .await?;

    info!("Payment {} settled as {}", payment.get_id(), outcome);

    get_payment(pool, &payment.get_id())?.ok_or(anyhow!("Payment disappeared during settlement"))
}

/// Marks a completed payment as refunded
///
/// The money movement itself is the processor's; this records the outcome
/// with the stated reason. Only completed payments can be refunded.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `payment_id` - The ID of the payment to refund
/// * `reason` - Why the refund was given
///
/// ### Returns
///
/// A Result containing the refunded Payment
///
/// ### Errors
///
/// Returns an error if the payment does not exist or is not completed
#[instrument(skip(pool, reason), fields(payment_id = %payment_id))]
pub async fn refund_payment(pool: &DbPool, payment_id: &str, reason: &str) -> Result<Payment> {
    debug!("Refunding payment");

    let payment = get_payment(pool, payment_id)?.ok_or(anyhow!("Payment not found"))?;
    if !payment.is_refundable() {
        return Err(anyhow!(
            "Only completed payments can be refunded (status: {})",
            payment.get_status()
        ));
    }

    let now = Utc::now().naive_utc();
    let conn = &mut pool.get()?;
    let updated = diesel::update(
        payments::table
            .find(payment_id.to_string())
            .filter(payments::status.eq(PaymentStatus::Completed)),
    )
    .set((
        payments::status.eq(PaymentStatus::Refunded),
        payments::refunded_at.eq(Some(now)),
        payments::refund_reason.eq(Some(reason.to_string())),
        payments::updated_at.eq(now),
    ))
    .execute_with_retry(conn)
    .await?;

    if updated == 0 {
        return Err(anyhow!("Payment is no longer refundable"));
    }

    info!("Refunded payment {}", payment_id);

    get_payment(pool, payment_id)?.ok_or(anyhow!("Payment disappeared during refund"))
}
