/// Data models module
///
/// This module defines the core data structures used throughout the application.
/// It includes database models that map to database tables, as well as methods
/// for creating and manipulating these models.

// Re-export all model types
mod user;
pub use user::{User, UserRole};

mod session;
pub use session::Session;

mod family_member;
pub use family_member::FamilyMember;

mod listing;
pub use listing::{Listing, ListingStatus};

mod offer;
pub use offer::{Offer, OfferParty, OfferStatus};

mod event;
pub use event::{Event, EventKind};

mod line_items;
pub use line_items::{LineItem, LineItems};

mod registration;
pub use registration::{Registration, RegistrationStatus};

mod payment;
pub use payment::{Payment, PaymentKind, PaymentStatus};

mod document;
pub use document::{Document, Visibility};

mod photo;
pub use photo::Photo;

mod badge;
pub use badge::{Badge, BadgeDesign};

mod board_member;
pub use board_member::BoardMember;

mod conversation;
pub use conversation::{Conversation, ConversationParticipant};

mod message;
pub use message::Message;
