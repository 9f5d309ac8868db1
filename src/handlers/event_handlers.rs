use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::config::PricingConfig;
use crate::dto::{
    CreateEventDto, EventQueryDto, QuoteRequestDto, QuoteResponseDto, UpdateEventDto,
};
use crate::errors::ApiError;
use crate::models::{Event, User};
use crate::pricing::{self, Quote, QuoteInput};
use crate::repo;
use crate::state::AppState;

/// Checks a quoted party for shape problems before pricing it
pub(crate) fn validate_party(request: &QuoteRequestDto) -> Result<(), ApiError> {
    if request.adults < 1 {
        return Err(ApiError::Validation(
            "At least one adult is required".to_string(),
        ));
    }
    if request.children < 0 {
        return Err(ApiError::Validation(
            "Children cannot be negative".to_string(),
        ));
    }
    if request.nights < 0 {
        return Err(ApiError::Validation("Nights cannot be negative".to_string()));
    }
    Ok(())
}

/// Prices a party for an event as of the given instant
///
/// Quotes and real registrations both come through here, so the price a
/// member is shown is always the price they are charged.
pub(crate) fn price_party(
    prices: &PricingConfig,
    event: &Event,
    user: &User,
    request: &QuoteRequestDto,
    at: DateTime<Utc>,
) -> Quote {
    let input = QuoteInput {
        adults: request.adults,
        children: request.children,
        nights: request.nights,
        meal_plan: request.meal_plan,
        member_in_good_standing: user.is_member_in_good_standing(at),
        early_bird: event.is_early_bird(at),
    };

    pricing::quote(prices, &input)
}

/// Handler for listing events
///
/// This function handles GET requests to `/api/events`. No login is
/// required; drafts stay hidden unless an admin asks for them.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `query` - Kind, past, and draft filters from the query string
/// * `headers` - The request headers, which may carry a bearer token
///
/// ### Returns
///
/// A list of events as JSON, soonest first
#[instrument(skip(state, headers))]
pub async fn list_events_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract and deserialize the query string
    Query(query): Query<EventQueryDto>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<Event>>, ApiError> {
    let caller = auth::optional_user(&state.pool, &headers)?;

    // Only admins get to see drafts, whatever the query says
    let mut query = query;
    if !caller.as_ref().is_some_and(|user| user.is_admin()) {
        query.include_unpublished = false;
    }

    let events = repo::list_events(&state.pool, &query).map_err(ApiError::Database)?;

    debug!("Retrieved {} events", events.len());

    // Return the list of events as JSON
    Ok(Json(events))
}

/// Handler for retrieving a specific event
///
/// This function handles GET requests to `/api/events/{id}`. Drafts are
/// reported as missing to everyone but admins.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `event_id` - The ID of the event, extracted from the URL path
/// * `headers` - The request headers, which may carry a bearer token
///
/// ### Returns
///
/// The requested event as JSON
#[instrument(skip(state, headers), fields(event_id = %event_id))]
pub async fn get_event_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the event ID from the URL path
    Path(event_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Event>, ApiError> {
    let caller = auth::optional_user(&state.pool, &headers)?;

    debug!("Retrieving event");

    let event = repo::get_event(&state.pool, &event_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    if !event.is_published() && !caller.as_ref().is_some_and(|user| user.is_admin()) {
        return Err(ApiError::NotFound);
    }

    // Return the event as JSON
    Ok(Json(event))
}

/// Handler for creating a new event
///
/// This function handles POST requests to `/api/events`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload containing the event details
///
/// ### Returns
///
/// The newly created event as JSON
#[instrument(skip(state, headers, payload), fields(title = %payload.title))]
pub async fn create_event_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateEventDto>,
) -> Result<Json<Event>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Creating event: {}", payload.title);

    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("Title cannot be empty".to_string()));
    }
    if payload.ends_at <= payload.starts_at {
        return Err(ApiError::Validation(
            "Event must end after it starts".to_string(),
        ));
    }
    if payload.capacity < 0 {
        return Err(ApiError::Validation(
            "Capacity cannot be negative".to_string(),
        ));
    }

    // Call the repository function to create the event
    let event = repo::create_event(&state.pool, &payload)
        .await
        .map_err(ApiError::Database)?;

    info!("Created event with id: {}", event.get_id());

    // Return the created event as JSON
    Ok(Json(event))
}

/// Handler for updating an event
///
/// This function handles PUT requests to `/api/events/{id}`. Only the
/// provided fields are changed, but the resulting start and end must
/// still form a valid window.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `event_id` - The ID of the event to update
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The request payload containing the fields to change
///
/// ### Returns
///
/// The updated event as JSON
#[instrument(skip(state, headers, payload), fields(event_id = %event_id))]
pub async fn update_event_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the event ID from the URL path
    Path(event_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdateEventDto>,
) -> Result<Json<Event>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Updating event");

    // First check the event exists
    let existing = repo::get_event(&state.pool, &event_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let starts = payload.starts_at.unwrap_or_else(|| existing.get_starts_at());
    let ends = payload.ends_at.unwrap_or_else(|| existing.get_ends_at());
    if ends <= starts {
        return Err(ApiError::Validation(
            "Event must end after it starts".to_string(),
        ));
    }
    if payload.capacity.is_some_and(|capacity| capacity < 0) {
        return Err(ApiError::Validation(
            "Capacity cannot be negative".to_string(),
        ));
    }

    // Call the repository function to update the event
    let event = repo::update_event(&state.pool, &event_id, &payload)
        .await
        .map_err(ApiError::Database)?;

    info!("Updated event {}", event_id);

    // Return the updated event as JSON
    Ok(Json(event))
}

/// Handler for deleting an event
///
/// This function handles DELETE requests to `/api/events/{id}`. An event
/// with active registrations cannot be deleted out from under them.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `event_id` - The ID of the event to delete
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// An empty JSON response on success
#[instrument(skip(state, headers), fields(event_id = %event_id))]
pub async fn delete_event_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the event ID from the URL path
    Path(event_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<()>, ApiError> {
    auth::require_admin(&state.pool, &headers)?;

    info!("Deleting event");

    // First check the event exists and has no one signed up
    repo::get_event(&state.pool, &event_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let active =
        repo::count_active_registrations(&state.pool, &event_id).map_err(ApiError::Database)?;
    if active > 0 {
        return Err(ApiError::Conflict(format!(
            "Event still has {} active registrations",
            active
        )));
    }

    // Call the repository function to delete the event
    repo::delete_event(&state.pool, &event_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Deleted event {}", event_id);

    // Return an empty response
    Ok(Json(()))
}

/// Handler for quoting a star-party registration
///
/// This function handles POST requests to `/api/events/{id}/quote`.
///
/// The quote is computed from the caller's own membership standing and
/// the event's early-bird window at the time of the request; nothing is
/// reserved.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `event_id` - The ID of the event to quote for
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The party being priced
///
/// ### Returns
///
/// The itemised quote as JSON
#[instrument(skip(state, headers, payload), fields(event_id = %event_id))]
pub async fn quote_event_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the event ID from the URL path
    Path(event_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<QuoteRequestDto>,
) -> Result<Json<QuoteResponseDto>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!(
        "Quoting for {} adults, {} children, {} nights",
        payload.adults, payload.children, payload.nights
    );

    validate_party(&payload)?;

    let event = repo::get_event(&state.pool, &event_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if !event.is_published() && !user.is_admin() {
        return Err(ApiError::NotFound);
    }

    let quote = price_party(&state.config.pricing, &event, &user, &payload, Utc::now());

    info!("Quoted {} cents for event {}", quote.total_cents, event_id);

    // Return the quote as JSON
    Ok(Json(QuoteResponseDto {
        line_items: quote.line_items,
        total_cents: quote.total_cents,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::{
        member_with_headers, paid_up, setup_test_state, staff_with_headers,
    };
    use crate::models::{EventKind, UserRole};
    use chrono::TimeDelta;

    fn star_party_payload() -> CreateEventDto {
        let starts = Utc::now() + TimeDelta::days(30);
        CreateEventDto {
            title: "Orange Blossom Special".to_string(),
            description: "Annual dark-sky star party.".to_string(),
            kind: EventKind::StarParty,
            location: "Withlacoochee River Park".to_string(),
            starts_at: starts,
            ends_at: starts + TimeDelta::days(4),
            capacity: 120,
            early_bird_deadline: Some(Utc::now() + TimeDelta::days(7)),
            published: true,
        }
    }

    async fn created_event(state: &Arc<AppState>, payload: CreateEventDto) -> Event {
        let (_, admin_headers) =
            staff_with_headers(state, "admin@example.com", "Ada", UserRole::Admin).await;
        create_event_handler(State(state.clone()), admin_headers, Json(payload))
            .await
            .unwrap()
            .0
    }

    #[tokio::test]
    async fn test_creating_events_is_admin_only() {
        let state = setup_test_state();
        let (_, member_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;

        let err = create_event_handler(State(state), member_headers, Json(star_party_payload()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Forbidden));
    }

    #[tokio::test]
    async fn test_admin_creates_a_published_event() {
        let state = setup_test_state();

        let event = created_event(&state, star_party_payload()).await;

        assert_eq!(event.get_title(), "Orange Blossom Special");
        assert_eq!(event.get_event_kind(), EventKind::StarParty);
        assert!(event.is_published());
        assert!(event.get_early_bird_deadline().is_some());
    }

    #[tokio::test]
    async fn test_event_must_end_after_it_starts() {
        let state = setup_test_state();
        let (_, admin_headers) =
            staff_with_headers(&state, "admin@example.com", "Ada", UserRole::Admin).await;

        let mut payload = star_party_payload();
        payload.ends_at = payload.starts_at - TimeDelta::hours(1);

        let err = create_event_handler(State(state), admin_headers, Json(payload))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_drafts_are_hidden_from_members() {
        let state = setup_test_state();
        let (_, admin_headers) =
            staff_with_headers(&state, "admin@example.com", "Ada", UserRole::Admin).await;
        let (_, member_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;

        create_event_handler(
            State(state.clone()),
            admin_headers.clone(),
            Json(star_party_payload()),
        )
        .await
        .unwrap();
        let mut draft = star_party_payload();
        draft.title = "Unannounced Workshop".to_string();
        draft.published = false;
        let draft = create_event_handler(State(state.clone()), admin_headers.clone(), Json(draft))
            .await
            .unwrap()
            .0;

        // Members asking for drafts still only see published events
        let nosy_query = EventQueryDto {
            include_unpublished: true,
            ..Default::default()
        };
        let seen = list_events_handler(
            State(state.clone()),
            Query(nosy_query.clone()),
            member_headers.clone(),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get_title(), "Orange Blossom Special");

        let all = list_events_handler(State(state.clone()), Query(nosy_query), admin_headers)
            .await
            .unwrap()
            .0;
        assert_eq!(all.len(), 2);

        let err = get_event_handler(State(state), Path(draft.get_id()), member_headers)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn test_anonymous_callers_see_published_events() {
        let state = setup_test_state();
        created_event(&state, star_party_payload()).await;

        let events = list_events_handler(
            State(state),
            Query(EventQueryDto::default()),
            HeaderMap::new(),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let state = setup_test_state();
        let event = created_event(&state, star_party_payload()).await;
        let (_, admin_headers) =
            staff_with_headers(&state, "admin2@example.com", "Abe", UserRole::Admin).await;

        let updated = update_event_handler(
            State(state),
            Path(event.get_id()),
            admin_headers,
            Json(UpdateEventDto {
                capacity: Some(60),
                ..Default::default()
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(updated.get_capacity(), 60);
        assert_eq!(updated.get_title(), "Orange Blossom Special");
    }

    #[tokio::test]
    async fn test_delete_refuses_while_anyone_is_registered() {
        let state = setup_test_state();
        let event = created_event(&state, star_party_payload()).await;
        let (member, _) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (_, admin_headers) =
            staff_with_headers(&state, "admin2@example.com", "Abe", UserRole::Admin).await;

        let details = QuoteRequestDto {
            adults: 1,
            ..Default::default()
        };
        let quote = price_party(
            &state.config.pricing,
            &event,
            &member,
            &details,
            Utc::now(),
        );
        let registration = crate::repo::create_registration(
            &state.pool,
            &event.get_id(),
            &member.get_id(),
            &details,
            &quote,
        )
        .await
        .unwrap();

        let err = delete_event_handler(
            State(state.clone()),
            Path(event.get_id()),
            admin_headers.clone(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        crate::repo::cancel_registration(&state.pool, &registration.get_id())
            .await
            .unwrap();
        delete_event_handler(State(state), Path(event.get_id()), admin_headers)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_quote_prices_the_whole_party() {
        let state = setup_test_state();
        let event = created_event(&state, star_party_payload()).await;
        let (member, member_headers) =
            member_with_headers(&state, "vera@example.com", "Vera").await;
        paid_up(&state, &member.get_id()).await;

        // 2 adults, 1 child, 2 nights camping, meals for all three,
        // inside the early-bird window, membership paid up
        let quote = quote_event_handler(
            State(state),
            Path(event.get_id()),
            member_headers,
            Json(QuoteRequestDto {
                adults: 2,
                children: 1,
                nights: 2,
                meal_plan: true,
            }),
        )
        .await
        .unwrap()
        .0;

        // 5000 + 2500 + 1000 + 4*1500 + 3*4500 - 1000
        assert_eq!(quote.total_cents, 27_000);
        let labels: Vec<&str> = quote
            .line_items
            .0
            .iter()
            .map(|item| item.label.as_str())
            .collect();
        assert!(labels.contains(&"Early-bird discount"));
        assert!(!labels.contains(&"Non-member surcharge"));
    }

    #[tokio::test]
    async fn test_lapsed_members_pay_the_surcharge() {
        let state = setup_test_state();
        let event = created_event(&state, star_party_payload()).await;
        // A fresh account has no membership expiry on record
        let (_, member_headers) = member_with_headers(&state, "new@example.com", "Nia").await;

        let quote = quote_event_handler(
            State(state),
            Path(event.get_id()),
            member_headers,
            Json(QuoteRequestDto {
                adults: 1,
                ..Default::default()
            }),
        )
        .await
        .unwrap()
        .0;

        // 5000 + 2000 surcharge - 1000 early bird
        assert_eq!(quote.total_cents, 6_000);
    }

    #[tokio::test]
    async fn test_quote_requires_an_adult() {
        let state = setup_test_state();
        let event = created_event(&state, star_party_payload()).await;
        let (_, member_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;

        let err = quote_event_handler(
            State(state),
            Path(event.get_id()),
            member_headers,
            Json(QuoteRequestDto {
                adults: 0,
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_quote_for_a_missing_event_is_not_found() {
        let state = setup_test_state();
        let (_, member_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;

        let err = quote_event_handler(
            State(state),
            Path("missing".to_string()),
            member_headers,
            Json(QuoteRequestDto {
                adults: 1,
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::NotFound));
    }
}
