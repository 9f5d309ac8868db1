/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP request,
/// extracting the necessary data, calling the appropriate repository functions,
/// and returning a properly formatted response.

mod auth_handlers;
mod family_handlers;
mod listing_handlers;
mod offer_handlers;
mod event_handlers;
mod registration_handlers;
mod payment_handlers;
mod document_handlers;
mod photo_handlers;
mod badge_handlers;
mod board_handlers;
mod member_handlers;
mod message_handlers;

// Re-export all handlers
pub use auth_handlers::*;
pub use family_handlers::*;
pub use listing_handlers::*;
pub use offer_handlers::*;
pub use event_handlers::*;
pub use registration_handlers::*;
pub use payment_handlers::*;
pub use document_handlers::*;
pub use photo_handlers::*;
pub use badge_handlers::*;
pub use board_handlers::*;
pub use member_handlers::*;
pub use message_handlers::*;
