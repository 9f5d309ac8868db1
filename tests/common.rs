// Each test binary compiles this module separately and uses a different
// subset of the helpers, so dead code analysis stays off.
#![allow(dead_code)]

/// Common test utilities for Stargazer integration tests
///
/// This file contains shared functions and utilities for all integration tests,
/// including test application setup, helper functions for registering members
/// and seeding club data over the API, and other shared functionality.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeDelta, Utc};
use serde_json::{json, Value};
use stargazer::{
    config::base_config,
    create_app,
    db::init_pool,
    models::UserRole,
    notify::NoopNotifier,
    payments::SandboxProvider,
    repo,
    state::AppState,
};
use std::sync::Arc;
use tower::Service;

/// The password every test account registers with
pub const PASSWORD: &str = "albireo-double-star";

/// Creates the shared application state over an in-memory SQLite database
///
/// This helper function:
/// 1. Creates an in-memory SQLite database and runs migrations on it
/// 2. Wires in the sandbox payment provider and the no-op notifier,
///    exactly as the server does when no real integrations are configured
/// 3. Returns the state so tests can also reach the repository directly
///
/// Plain ":memory:" would give every pooled connection its own private
/// database, so the pool is built over a unique shared-cache URI instead:
/// every connection sees the migrated schema, and each test stays
/// isolated from the others.
///
/// ### Returns
///
/// An Arc'd AppState backed by a fresh in-memory database
pub fn create_test_state() -> Arc<AppState> {
    let database_url = format!(
        "file:integration_{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4()
    );
    let pool = Arc::new(init_pool(&database_url));

    // Run migrations on the in-memory database to set up the schema
    let conn = &mut pool.get().unwrap();
    stargazer::run_migrations(conn);

    let config = base_config(None);
    let payments = Arc::new(SandboxProvider::new(config.public_base_url.clone()));

    AppState::new(pool, config, payments, Arc::new(NoopNotifier))
}

/// Creates a test application with an in-memory SQLite database
///
/// Using an in-memory database ensures that:
/// - Tests run quickly
/// - Tests are isolated from each other
/// - No cleanup is needed after tests
///
/// ### Returns
///
/// An Axum Router configured with all routes and connected to an in-memory database
pub fn create_test_app() -> Router {
    create_app(create_test_state())
}

/// Builds a JSON request, attaching the bearer token when one is given
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// Builds a bodyless request, attaching the bearer token when one is given
pub fn bare_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Sends a request through the router and parses the JSON response
///
/// Every endpoint answers with a JSON body, including errors, so the
/// response is always parsed; assertions on the status code stay with
/// the caller.
///
/// ### Arguments
///
/// * `app` - The test application
/// * `request` - The request to dispatch
///
/// ### Returns
///
/// The response status together with the parsed JSON body
pub async fn send(app: &mut Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.call(request).await.unwrap();
    let status = response.status();

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&body).unwrap();

    (status, value)
}

/// Registers a member account via the API
///
/// This helper function:
/// 1. Sends a POST request to /api/auth/register
/// 2. Verifies the response has a 200 OK status
/// 3. Returns the session token and the created user
///
/// ### Arguments
///
/// * `app` - The test application
/// * `email` - The email to register with
/// * `name` - The member's name
///
/// ### Returns
///
/// The session token and the user object as JSON
pub async fn register(app: &mut Router, email: &str, name: &str) -> (String, Value) {
    let request = json_request(
        Method::POST,
        "/api/auth/register",
        None,
        &json!({
            "email": email,
            "password": PASSWORD,
            "name": name,
        }),
    );

    let (status, session) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);

    let token = session["token"].as_str().unwrap().to_string();
    (token, session["user"].clone())
}

/// Registers an account and promotes it to the given role
///
/// Roles are granted by existing staff in production, so the promotion
/// goes through the repository rather than the API. The session issued
/// at registration keeps working; roles are read per request.
///
/// ### Arguments
///
/// * `app` - The test application
/// * `state` - The application state backing `app`
/// * `email` - The email to register with
/// * `name` - The member's name
/// * `role` - The role to grant
///
/// ### Returns
///
/// The session token and the user object as JSON
pub async fn register_with_role(
    app: &mut Router,
    state: &Arc<AppState>,
    email: &str,
    name: &str,
    role: UserRole,
) -> (String, Value) {
    let (token, user) = register(app, email, name).await;

    repo::update_member(&state.pool, user["id"].as_str().unwrap(), Some(role), None)
        .await
        .unwrap();

    (token, user)
}

/// Pushes a member's expiry a year out so pricing treats them as paid up
pub async fn make_paid_up(state: &Arc<AppState>, user_id: &str) {
    repo::update_member(
        &state.pool,
        user_id,
        None,
        Some(Utc::now() + TimeDelta::days(365)),
    )
    .await
    .unwrap();
}

/// Creates a classifieds listing via the API
///
/// ### Arguments
///
/// * `app` - The test application
/// * `token` - The seller's session token
/// * `title` - The listing title
/// * `price_cents` - The asking price in integer cents
///
/// ### Returns
///
/// The created listing as JSON
pub async fn create_listing(
    app: &mut Router,
    token: &str,
    title: &str,
    price_cents: i64,
) -> Value {
    let request = json_request(
        Method::POST,
        "/api/listings",
        Some(token),
        &json!({
            "title": title,
            "description": "Well cared for, smoke-free home.",
            "category": "telescopes",
            "price_cents": price_cents,
        }),
    );

    let (status, listing) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);

    listing
}

/// Creates a published star party a month out via the API
///
/// This helper function:
/// 1. Sends a POST request to /api/events with an admin token
/// 2. Verifies the response has a 200 OK status
/// 3. Parses and returns the created event
///
/// ### Arguments
///
/// * `app` - The test application
/// * `admin_token` - A session token holding the admin role
/// * `capacity` - Maximum confirmed registrations, 0 for unlimited
/// * `early_bird` - Whether an early-bird window is still open
///
/// ### Returns
///
/// The created event as JSON
pub async fn create_star_party(
    app: &mut Router,
    admin_token: &str,
    capacity: i32,
    early_bird: bool,
) -> Value {
    let starts = Utc::now() + TimeDelta::days(30);
    let deadline = early_bird.then(|| (starts - TimeDelta::days(7)).to_rfc3339());

    let request = json_request(
        Method::POST,
        "/api/events",
        Some(admin_token),
        &json!({
            "title": "Autumn Star Party",
            "description": "Four nights under dark skies.",
            "kind": "star_party",
            "location": "Cherry Springs State Park",
            "starts_at": starts.to_rfc3339(),
            "ends_at": (starts + TimeDelta::days(4)).to_rfc3339(),
            "capacity": capacity,
            "early_bird_deadline": deadline,
            "published": true,
        }),
    );

    let (status, event) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);

    event
}

/// Registers a party of adults for an event via the API
///
/// ### Arguments
///
/// * `app` - The test application
/// * `token` - The registrant's session token
/// * `event_id` - The ID of the event
/// * `adults` - Number of adults attending
///
/// ### Returns
///
/// The registration response as JSON: the registration itself plus the
/// checkout URL when payment is due
pub async fn register_for_event(
    app: &mut Router,
    token: &str,
    event_id: &str,
    adults: i32,
) -> Value {
    let request = json_request(
        Method::POST,
        &format!("/api/events/{}/registrations", event_id),
        Some(token),
        &json!({
            "adults": adults,
            "children": 0,
            "nights": 0,
            "meal_plan": false,
        }),
    );

    let (status, response) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);

    response
}
