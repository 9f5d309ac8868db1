use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::{Conversation, ConversationParticipant, Message, User};
use crate::repo::{listing_repo, user_repo};
use crate::schema::{conversation_participants, conversations, messages, users};
use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// One row of a member's inbox: the conversation plus enough context to
/// render it without further queries
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub other_participants: Vec<User>,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

/// Finds or starts a conversation between two members
///
/// A pair of members gets one conversation per listing (and one with no
/// listing at all); asking again returns the existing thread instead of
/// forking a new one. When the conversation is about a listing and no
/// subject was given, the listing title becomes the subject.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `initiator_id` - The member starting the conversation
/// * `recipient_id` - The member being messaged
/// * `listing_id` - The listing the conversation is about, if any
/// * `subject` - An optional subject line
///
/// ### Returns
///
/// A Result containing the existing or newly created Conversation
///
/// ### Errors
///
/// Returns an error if the recipient or listing does not exist, or the
/// initiator is messaging themselves
#[instrument(skip(pool, subject), fields(initiator_id = %initiator_id, recipient_id = %recipient_id))]
pub async fn find_or_create_conversation(
    pool: &DbPool,
    initiator_id: &str,
    recipient_id: &str,
    listing_id: Option<&str>,
    subject: Option<String>,
) -> Result<Conversation> {
    if initiator_id == recipient_id {
        return Err(anyhow!("Cannot start a conversation with yourself"));
    }

    user_repo::get_user(pool, recipient_id)?.ok_or(anyhow!("User not found"))?;

    let default_subject = match listing_id {
        Some(lid) => {
            let listing =
                listing_repo::get_listing(pool, lid)?.ok_or(anyhow!("Listing not found"))?;
            Some(listing.get_title())
        }
        None => None,
    };

    let conn = &mut pool.get()?;
    let conversation = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mine: Vec<String> = conversation_participants::table
            .filter(conversation_participants::user_id.eq(initiator_id.to_string()))
            .select(conversation_participants::conversation_id)
            .load(conn)?;

        let shared: Vec<String> = conversation_participants::table
            .filter(conversation_participants::user_id.eq(recipient_id.to_string()))
            .filter(conversation_participants::conversation_id.eq_any(mine))
            .select(conversation_participants::conversation_id)
            .load(conn)?;

        let mut existing_query = conversations::table
            .filter(conversations::id.eq_any(shared))
            .into_boxed();
        existing_query = match listing_id {
            Some(lid) => existing_query.filter(conversations::listing_id.eq(lid.to_string())),
            None => existing_query.filter(conversations::listing_id.is_null()),
        };

        if let Some(existing) = existing_query.first::<Conversation>(conn).optional()? {
            debug!("Reusing conversation {}", existing.get_id());
            return Ok(existing);
        }

        let conversation = Conversation::new(
            subject.clone().or(default_subject.clone()),
            listing_id.map(|lid| lid.to_string()),
        );

        diesel::insert_into(conversations::table)
            .values(conversation.clone())
            .execute(conn)?;
        diesel::insert_into(conversation_participants::table)
            .values(vec![
                ConversationParticipant::new(conversation.get_id(), initiator_id.to_string()),
                ConversationParticipant::new(conversation.get_id(), recipient_id.to_string()),
            ])
            .execute(conn)?;

        info!("Created conversation with id: {}", conversation.get_id());

        Ok(conversation)
    })?;

    Ok(conversation)
}

/// Retrieves a conversation by its ID
#[instrument(skip(pool), fields(conversation_id = %conversation_id))]
pub fn get_conversation(pool: &DbPool, conversation_id: &str) -> Result<Option<Conversation>> {
    let conn = &mut pool.get()?;

    let result = conversations::table
        .find(conversation_id)
        .first::<Conversation>(conn)
        .optional()?;

    Ok(result)
}

/// Whether a user belongs to a conversation
#[instrument(skip(pool), fields(conversation_id = %conversation_id, user_id = %user_id))]
pub fn is_participant(pool: &DbPool, conversation_id: &str, user_id: &str) -> Result<bool> {
    let conn = &mut pool.get()?;

    let count: i64 = conversation_participants::table
        .filter(conversation_participants::conversation_id.eq(conversation_id.to_string()))
        .filter(conversation_participants::user_id.eq(user_id.to_string()))
        .count()
        .get_result(conn)?;

    Ok(count > 0)
}

/// Lists a conversation's participants together with their user records
#[instrument(skip(pool), fields(conversation_id = %conversation_id))]
pub fn list_participants(
    pool: &DbPool,
    conversation_id: &str,
) -> Result<Vec<(ConversationParticipant, User)>> {
    let conn = &mut pool.get()?;

    let results = conversation_participants::table
        .inner_join(users::table)
        .filter(conversation_participants::conversation_id.eq(conversation_id.to_string()))
        .select((ConversationParticipant::as_select(), User::as_select()))
        .load::<(ConversationParticipant, User)>(conn)?;

    Ok(results)
}

/// Appends a message to a conversation
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `conversation_id` - The conversation to post into
/// * `sender_id` - The sending user, who must be a participant
/// * `body` - The message text
///
/// ### Returns
///
/// A Result containing the newly created Message
///
/// ### Errors
///
/// Returns an error if the body is empty or the sender is not a
/// participant
#[instrument(skip(pool, body), fields(conversation_id = %conversation_id, sender_id = %sender_id))]
pub async fn create_message(
    pool: &DbPool,
    conversation_id: &str,
    sender_id: &str,
    body: String,
) -> Result<Message> {
    if body.trim().is_empty() {
        return Err(anyhow!("Message body cannot be empty"));
    }

    if !is_participant(pool, conversation_id, sender_id)? {
        return Err(anyhow!("User is not a participant in this conversation"));
    }

    let message = Message::new(
        conversation_id.to_string(),
        sender_id.to_string(),
        body,
    );

    let conn = &mut pool.get()?;
    diesel::insert_into(messages::table)
        .values(message.clone())
        .execute_with_retry(conn)
        .await?;

    debug!("Created message with id: {}", message.get_id());

    Ok(message)
}

/// Lists a conversation's messages, oldest first
#[instrument(skip(pool), fields(conversation_id = %conversation_id))]
pub fn list_messages(pool: &DbPool, conversation_id: &str) -> Result<Vec<Message>> {
    let conn = &mut pool.get()?;

    let results = messages::table
        .filter(messages::conversation_id.eq(conversation_id.to_string()))
        .order_by(messages::created_at.asc())
        .load::<Message>(conn)?;

    info!("Retrieved {} messages", results.len());

    Ok(results)
}

/// Marks a conversation read for one participant
///
/// Messages sent up to now stop counting as unread for them.
#[instrument(skip(pool), fields(conversation_id = %conversation_id, user_id = %user_id))]
pub async fn mark_read(pool: &DbPool, conversation_id: &str, user_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    diesel::update(
        conversation_participants::table
            .filter(conversation_participants::conversation_id.eq(conversation_id.to_string()))
            .filter(conversation_participants::user_id.eq(user_id.to_string())),
    )
    .set(conversation_participants::last_read_at.eq(Utc::now().naive_utc()))
    .execute_with_retry(conn)
    .await?;

    debug!("Marked conversation read");

    Ok(())
}

/// Lists a member's inbox, most recent activity first
///
/// Each row carries the other participants, the latest message, and how
/// many messages from others arrived since the member last read the
/// thread. A thread with no messages yet sorts by its creation time.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The member whose inbox to build
///
/// ### Returns
///
/// A Result containing a vector of ConversationSummary rows
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_conversations_for_user(
    pool: &DbPool,
    user_id: &str,
) -> Result<Vec<ConversationSummary>> {
    let conn = &mut pool.get()?;

    let memberships: Vec<ConversationParticipant> = conversation_participants::table
        .filter(conversation_participants::user_id.eq(user_id.to_string()))
        .load(conn)?;

    let mut summaries = Vec::with_capacity(memberships.len());
    for membership in memberships {
        let conversation_id = membership.get_conversation_id();

        let conversation = conversations::table
            .find(&conversation_id)
            .first::<Conversation>(conn)?;

        let last_message = messages::table
            .filter(messages::conversation_id.eq(&conversation_id))
            .order_by(messages::created_at.desc())
            .first::<Message>(conn)
            .optional()?;

        let mut unread_query = messages::table
            .filter(messages::conversation_id.eq(&conversation_id))
            .filter(messages::sender_id.ne(user_id.to_string()))
            .into_boxed();
        if let Some(last_read) = membership.get_last_read_at_raw() {
            unread_query = unread_query.filter(messages::created_at.gt(last_read));
        }
        let unread_count: i64 = unread_query.count().get_result(conn)?;

        let other_participants: Vec<User> = conversation_participants::table
            .inner_join(users::table)
            .filter(conversation_participants::conversation_id.eq(&conversation_id))
            .filter(conversation_participants::user_id.ne(user_id.to_string()))
            .select(User::as_select())
            .load(conn)?;

        summaries.push(ConversationSummary {
            conversation,
            other_participants,
            last_message,
            unread_count,
        });
    }

    // Latest traffic floats to the top; untouched threads rank by creation
    summaries.sort_by_key(|s| {
        std::cmp::Reverse(
            s.last_message
                .as_ref()
                .map(|m| m.get_created_at_raw())
                .unwrap_or_else(|| {
                    s.conversation.get_created_at().naive_utc()
                }),
        )
    });

    info!("Built inbox with {} conversations", summaries.len());

    Ok(summaries)
}
