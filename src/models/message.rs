use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents one message in a conversation
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Message {
    /// Unique identifier for the message (UUID v4 as string)
    id: String,

    /// The conversation this message belongs to
    conversation_id: String,

    /// The sending user
    sender_id: String,

    /// Message text
    body: String,

    /// When the message was sent
    created_at: NaiveDateTime,
}

impl Message {
    pub fn new(conversation_id: String, sender_id: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id,
            sender_id,
            body,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the message's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the conversation ID
    pub fn get_conversation_id(&self) -> String {
        self.conversation_id.clone()
    }

    /// Gets the sender's user ID
    pub fn get_sender_id(&self) -> String {
        self.sender_id.clone()
    }

    /// Gets the message text
    pub fn get_body(&self) -> String {
        self.body.clone()
    }

    /// Gets when the message was sent
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Gets the raw sent timestamp
    pub fn get_created_at_raw(&self) -> NaiveDateTime {
        self.created_at
    }
}
