/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for interacting with the database: accounts and
/// sessions, the classifieds (listings and offers), events with their
/// registrations, payments, files, badges, the board roster, and member
/// messaging.
///
/// The repository pattern abstracts away the details of database access
/// and provides a clean API for the rest of the application to use.
/// Multi-row mutations that must land together run inside an immediate
/// transaction so SQLite takes its write lock up front.

mod user_repo;
mod session_repo;
mod family_repo;
mod listing_repo;
mod offer_repo;
mod event_repo;
mod registration_repo;
mod payment_repo;
mod document_repo;
mod photo_repo;
mod badge_repo;
mod board_repo;
mod message_repo;

// Re-export all repository functions
pub use user_repo::*;
pub use session_repo::*;
pub use family_repo::*;
pub use listing_repo::*;
pub use offer_repo::*;
pub use event_repo::*;
pub use registration_repo::*;
pub use payment_repo::*;
pub use document_repo::*;
pub use photo_repo::*;
pub use badge_repo::*;
pub use board_repo::*;
pub use message_repo::*;
