use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a private conversation between members
///
/// A conversation optionally hangs off a listing (buyer asking about an
/// item); the subject then defaults to the listing title.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::conversations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Conversation {
    /// Unique identifier for the conversation (UUID v4 as string)
    id: String,

    /// Subject line, if one was set
    subject: Option<String>,

    /// The listing this conversation is about, if any
    listing_id: Option<String>,

    /// When the conversation was started
    created_at: NaiveDateTime,
}

impl Conversation {
    pub fn new(subject: Option<String>, listing_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            subject,
            listing_id,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the conversation's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the subject line, if any
    pub fn get_subject(&self) -> Option<String> {
        self.subject.clone()
    }

    /// Gets the linked listing ID, if any
    pub fn get_listing_id(&self) -> Option<String> {
        self.listing_id.clone()
    }

    /// Gets when the conversation was started
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}

/// Membership of a user in a conversation
///
/// `last_read_at` drives unread counts: messages created after it are
/// unread for this participant.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::conversation_participants)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ConversationParticipant {
    /// The conversation
    conversation_id: String,

    /// The participating user
    user_id: String,

    /// When this participant last opened the conversation
    last_read_at: Option<NaiveDateTime>,

    /// When the participant was added
    created_at: NaiveDateTime,
}

impl ConversationParticipant {
    pub fn new(conversation_id: String, user_id: String) -> Self {
        Self {
            conversation_id,
            user_id,
            last_read_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the conversation ID
    pub fn get_conversation_id(&self) -> String {
        self.conversation_id.clone()
    }

    /// Gets the participant's user ID
    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    /// Gets when this participant last opened the conversation
    pub fn get_last_read_at(&self) -> Option<DateTime<Utc>> {
        self.last_read_at
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    /// Gets the raw last-read timestamp
    pub fn get_last_read_at_raw(&self) -> Option<NaiveDateTime> {
        self.last_read_at
    }
}
