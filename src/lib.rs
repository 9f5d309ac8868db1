/// Stargazer: A Membership Portal for an Astronomy Club
///
/// This library provides the core functionality for running a club of
/// amateur astronomers: member accounts and households, a classifieds
/// corner with offer negotiation, star parties with camping and meal
/// registration, donations and dues payments, a document library, a
/// photo gallery, membership badges, the board roster, and private
/// messaging between members.
///
/// ### Modules
///
/// - `auth`: Password hashing and bearer-token authentication
/// - `db`: Database connection management
/// - `models`: Data structures for members, listings, events and money
/// - `repo`: Repository layer for database operations
/// - `handlers`: Axum handlers for the RESTful API
/// - `payments`: The payment-processor seam
/// - `pricing`: Star-party registration pricing
/// - `signing`: Signed storage URLs and webhook signatures
///
/// ### Web API
///
/// The library exposes a RESTful API under `/api` using Axum; see
/// [`create_app`] for the full route table.

/// Authentication and password hashing module
pub mod auth;

/// Configuration loading module
pub mod config;

/// Database connection module
pub mod db;

/// Data transfer objects for the API
pub mod dto;

/// API error type module
pub mod errors;

/// Web API handlers module
pub mod handlers;

/// Data models module
pub mod models;

/// Outbound notification module
pub mod notify;

/// Payment-processor integration module
pub mod payments;

/// Registration pricing module
pub mod pricing;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

/// Signed URL and webhook signature module
pub mod signing;

/// Shared application state module
pub mod state;

/// Proptest generators shared across test modules
#[cfg(test)]
pub mod test_utils;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Creates the application router with all routes
///
/// This function sets up the Axum router with all the API endpoints.
///
/// ### Arguments
///
/// * `state` - The shared application state to be handed to all handlers
///
/// ### Returns
///
/// An Axum Router configured with all routes and the application state
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        // Route for registering a member account
        .route("/api/auth/register", post(handlers::register_handler))
        // Route for logging in
        .route("/api/auth/login", post(handlers::login_handler))
        // Route for logging out
        .route("/api/auth/logout", post(handlers::logout_handler))
        // Route for the authenticated member's own account
        .route("/api/auth/me", get(handlers::me_handler))
        // Routes for the member's household
        .route(
            "/api/user/family",
            get(handlers::list_family_handler).post(handlers::create_family_member_handler),
        )
        .route(
            "/api/user/family/{id}",
            put(handlers::update_family_member_handler)
                .delete(handlers::delete_family_member_handler),
        )
        // Route for the member's own registrations
        .route(
            "/api/user/registrations",
            get(handlers::list_my_registrations_handler),
        )
        // Route for the member's own payments
        .route("/api/user/payments", get(handlers::list_my_payments_handler))
        // Route for the member's current badge
        .route("/api/user/badge", get(handlers::get_my_badge_handler))
        // Routes for the classifieds corner
        .route(
            "/api/listings",
            get(handlers::list_listings_handler).post(handlers::create_listing_handler),
        )
        .route(
            "/api/listings/{id}",
            get(handlers::get_listing_handler)
                .put(handlers::update_listing_handler)
                .delete(handlers::withdraw_listing_handler),
        )
        // Route for attaching a photo to a listing
        .route(
            "/api/listings/{id}/photo",
            post(handlers::attach_listing_photo_handler),
        )
        // Routes for offers on a listing
        .route(
            "/api/listings/{id}/offers",
            post(handlers::create_offer_handler).get(handlers::list_listing_offers_handler),
        )
        // Route for reading one offer
        .route("/api/offers/{id}", get(handlers::get_offer_handler))
        // Routes for acting on a pending offer
        .route("/api/offers/{id}/accept", post(handlers::accept_offer_handler))
        .route("/api/offers/{id}/reject", post(handlers::reject_offer_handler))
        .route(
            "/api/offers/{id}/counter",
            post(handlers::counter_offer_handler),
        )
        .route(
            "/api/offers/{id}/withdraw",
            post(handlers::withdraw_offer_handler),
        )
        // Routes for the event calendar
        .route(
            "/api/events",
            get(handlers::list_events_handler).post(handlers::create_event_handler),
        )
        .route(
            "/api/events/{id}",
            get(handlers::get_event_handler)
                .put(handlers::update_event_handler)
                .delete(handlers::delete_event_handler),
        )
        // Route for pricing a star-party registration without committing
        .route("/api/events/{id}/quote", post(handlers::quote_event_handler))
        // Routes for registering and for the admin roster
        .route(
            "/api/events/{id}/registrations",
            post(handlers::create_registration_handler)
                .get(handlers::list_event_registrations_handler),
        )
        // Route for cancelling a registration
        .route(
            "/api/registrations/{id}",
            delete(handlers::cancel_registration_handler),
        )
        // Route for making a donation
        .route("/api/donations", post(handlers::create_donation_handler))
        // Route for payment-processor webhooks
        .route("/api/payments/webhook", post(handlers::webhook_handler))
        // Routes for the payment back office
        .route("/api/admin/payments", get(handlers::list_payments_handler))
        .route("/api/admin/payments/{id}", get(handlers::get_payment_handler))
        .route(
            "/api/admin/payments/{id}/refund",
            post(handlers::refund_payment_handler),
        )
        // Routes for the document library
        .route(
            "/api/documents",
            get(handlers::list_documents_handler).post(handlers::create_document_handler),
        )
        .route(
            "/api/documents/{id}",
            delete(handlers::delete_document_handler),
        )
        // Route for a signed download URL
        .route(
            "/api/documents/{id}/download",
            get(handlers::download_document_handler),
        )
        // Routes for the photo gallery
        .route(
            "/api/photos",
            get(handlers::list_photos_handler).post(handlers::create_photo_handler),
        )
        .route(
            "/api/photos/{id}",
            patch(handlers::update_photo_handler).delete(handlers::delete_photo_handler),
        )
        // Routes for the member back office
        .route("/api/admin/members", get(handlers::list_members_handler))
        .route(
            "/api/admin/members/{id}",
            patch(handlers::update_member_handler).delete(handlers::deactivate_member_handler),
        )
        // Route for issuing a membership badge
        .route(
            "/api/admin/members/{id}/badge",
            post(handlers::issue_badge_handler),
        )
        // Route for the badge register
        .route("/api/admin/badges", get(handlers::list_badges_handler))
        // Route for the public board roster
        .route("/api/board", get(handlers::list_board_handler))
        // Routes for managing the board roster
        .route("/api/admin/board", post(handlers::create_board_member_handler))
        .route(
            "/api/admin/board/{id}",
            delete(handlers::delete_board_member_handler),
        )
        // Routes for private messaging
        .route(
            "/api/conversations",
            post(handlers::start_conversation_handler)
                .get(handlers::list_conversations_handler),
        )
        .route(
            "/api/conversations/{id}",
            get(handlers::get_conversation_handler),
        )
        .route(
            "/api/conversations/{id}/messages",
            post(handlers::send_message_handler),
        )
        // Add the application state to the router
        .with_state(state)
}

/// Runs the embedded migrations
///
/// This function applies all database migrations to set up the schema.
///
/// ### Arguments
///
/// * `conn` - A mutable reference to a SQLite connection
///
/// ### Panics
///
/// This function will panic if the migrations fail to run
pub fn run_migrations(conn: &mut diesel::SqliteConnection) {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    // Define the embedded migrations
    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    // Run all pending migrations
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
}
