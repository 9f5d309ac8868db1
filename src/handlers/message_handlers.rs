use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth;
use crate::dto::{
    ConversationDetailDto, ConversationSummaryDto, SendMessageDto, StartConversationDto,
    UserSummaryDto,
};
use crate::errors::ApiError;
use crate::models::{Conversation, Message, User};
use crate::repo;
use crate::state::AppState;

/// Loads a conversation with its participants and messages
fn load_detail(
    state: &AppState,
    conversation: Conversation,
) -> Result<ConversationDetailDto, ApiError> {
    let participants = repo::list_participants(&state.pool, &conversation.get_id())
        .map_err(ApiError::Database)?
        .iter()
        .map(|(_, user)| UserSummaryDto::from(user))
        .collect();
    let messages =
        repo::list_messages(&state.pool, &conversation.get_id()).map_err(ApiError::Database)?;

    Ok(ConversationDetailDto {
        conversation,
        participants,
        messages,
    })
}

/// Tells every participant except the sender that a message arrived
async fn notify_others(state: &AppState, sender: &User, message: &Message) -> Result<(), ApiError> {
    let participants = repo::list_participants(&state.pool, &message.get_conversation_id())
        .map_err(ApiError::Database)?;

    for (_, user) in participants {
        if user.get_id() == sender.get_id() {
            continue;
        }
        state
            .notifier
            .notify(
                &user.get_email(),
                &format!("New message from {}", sender.get_name()),
                &message.get_body(),
            )
            .await;
    }

    Ok(())
}

/// Handler for starting a conversation
///
/// This function handles POST requests to `/api/conversations`.
///
/// A pair of members shares one thread per listing (plus one general
/// thread), so writing to the same recipient again lands in the
/// existing conversation rather than starting another.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The recipient, optional listing and subject, and the first message
///
/// ### Returns
///
/// The conversation with its participants and messages as JSON
#[instrument(skip(state, headers, payload))]
pub async fn start_conversation_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<StartConversationDto>,
) -> Result<Json<ConversationDetailDto>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Starting conversation");

    if payload.body.trim().is_empty() {
        return Err(ApiError::Validation(
            "A message body is required".to_string(),
        ));
    }
    if payload.recipient_id == user.get_id() {
        return Err(ApiError::Validation(
            "Cannot start a conversation with yourself".to_string(),
        ));
    }

    // First check the recipient exists
    repo::get_user(&state.pool, &payload.recipient_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    // And the listing, when the thread is about one
    if let Some(listing_id) = &payload.listing_id {
        repo::get_listing(&state.pool, listing_id)
            .map_err(ApiError::Database)?
            .ok_or(ApiError::NotFound)?;
    }

    // Call the repository function to find or create the conversation
    let conversation = repo::find_or_create_conversation(
        &state.pool,
        &user.get_id(),
        &payload.recipient_id,
        payload.listing_id.as_deref(),
        payload.subject,
    )
    .await
    .map_err(ApiError::Database)?;

    let message = repo::create_message(
        &state.pool,
        &conversation.get_id(),
        &user.get_id(),
        payload.body,
    )
    .await
    .map_err(ApiError::Database)?;

    notify_others(&state, &user, &message).await?;

    info!(
        "Posted message {} into conversation {}",
        message.get_id(),
        conversation.get_id()
    );

    // Return the full thread as JSON
    Ok(Json(load_detail(&state, conversation)?))
}

/// Handler for listing the caller's inbox
///
/// This function handles GET requests to `/api/conversations`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The caller's conversations as JSON, most recent activity first
#[instrument(skip(state, headers))]
pub async fn list_conversations_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<Vec<ConversationSummaryDto>>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!("Building inbox for user {}", user.get_id());

    // Call the repository function to build the inbox
    let summaries = repo::list_conversations_for_user(&state.pool, &user.get_id())
        .map_err(ApiError::Database)?;

    let inbox = summaries
        .into_iter()
        .map(|summary| ConversationSummaryDto {
            conversation: summary.conversation,
            other_participants: summary
                .other_participants
                .iter()
                .map(UserSummaryDto::from)
                .collect(),
            last_message: summary.last_message,
            unread_count: summary.unread_count,
        })
        .collect::<Vec<_>>();

    info!("Retrieved {} conversations", inbox.len());

    // Return the inbox as JSON
    Ok(Json(inbox))
}

/// Handler for reading a conversation
///
/// This function handles GET requests to `/api/conversations/{id}`.
/// Opening the thread marks it read for the caller. Threads the caller
/// does not belong to are reported as missing, so conversation IDs leak
/// nothing.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `conversation_id` - The ID of the conversation, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
///
/// ### Returns
///
/// The conversation with its participants and messages as JSON
#[instrument(skip(state, headers), fields(conversation_id = %conversation_id))]
pub async fn get_conversation_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the conversation ID from the URL path
    Path(conversation_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
) -> Result<Json<ConversationDetailDto>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    debug!("Retrieving conversation");

    let conversation = repo::get_conversation(&state.pool, &conversation_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if !repo::is_participant(&state.pool, &conversation_id, &user.get_id())
        .map_err(ApiError::Database)?
    {
        return Err(ApiError::NotFound);
    }

    let detail = load_detail(&state, conversation)?;

    // The caller has now seen everything in the thread
    repo::mark_read(&state.pool, &conversation_id, &user.get_id())
        .await
        .map_err(ApiError::Database)?;

    // Return the full thread as JSON
    Ok(Json(detail))
}

/// Handler for replying to a conversation
///
/// This function handles POST requests to `/api/conversations/{id}/messages`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `conversation_id` - The ID of the conversation, extracted from the URL path
/// * `headers` - The request headers carrying the bearer token
/// * `payload` - The message body
///
/// ### Returns
///
/// The newly posted message as JSON
#[instrument(skip(state, headers, payload), fields(conversation_id = %conversation_id))]
pub async fn send_message_handler(
    // Extract the application state
    State(state): State<Arc<AppState>>,
    // Extract the conversation ID from the URL path
    Path(conversation_id): Path<String>,
    // Extract the request headers for the bearer token
    headers: HeaderMap,
    // Extract and deserialize the JSON request body
    Json(payload): Json<SendMessageDto>,
) -> Result<Json<Message>, ApiError> {
    let user = auth::require_user(&state.pool, &headers)?;

    info!("Posting message");

    if payload.body.trim().is_empty() {
        return Err(ApiError::Validation(
            "A message body is required".to_string(),
        ));
    }

    // First check the conversation exists and the caller belongs to it
    repo::get_conversation(&state.pool, &conversation_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    if !repo::is_participant(&state.pool, &conversation_id, &user.get_id())
        .map_err(ApiError::Database)?
    {
        return Err(ApiError::NotFound);
    }

    // Call the repository function to post the message
    let message = repo::create_message(&state.pool, &conversation_id, &user.get_id(), payload.body)
        .await
        .map_err(ApiError::Database)?;

    notify_others(&state, &user, &message).await?;

    info!("Posted message {}", message.get_id());

    // Return the message as JSON
    Ok(Json(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::{member_with_headers, setup_test_state};

    fn opener(recipient_id: &str, body: &str) -> StartConversationDto {
        StartConversationDto {
            recipient_id: recipient_id.to_string(),
            listing_id: None,
            subject: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_starting_a_conversation_delivers_the_first_message() {
        let state = setup_test_state();
        let (vera, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (finn, _) = member_with_headers(&state, "finn@example.com", "Finn").await;

        let detail = start_conversation_handler(
            State(state),
            vera_headers,
            Json(opener(&finn.get_id(), "Is the refractor still available?")),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(detail.participants.len(), 2);
        assert_eq!(detail.messages.len(), 1);
        assert_eq!(detail.messages[0].get_sender_id(), vera.get_id());
        assert_eq!(
            detail.messages[0].get_body(),
            "Is the refractor still available?"
        );
        assert_eq!(detail.conversation.get_subject(), None);
    }

    #[tokio::test]
    async fn test_writing_again_reuses_the_thread() {
        let state = setup_test_state();
        let (_, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (finn, _) = member_with_headers(&state, "finn@example.com", "Finn").await;

        let first = start_conversation_handler(
            State(state.clone()),
            vera_headers.clone(),
            Json(opener(&finn.get_id(), "Is the refractor still available?")),
        )
        .await
        .unwrap()
        .0;

        let second = start_conversation_handler(
            State(state),
            vera_headers,
            Json(opener(&finn.get_id(), "Any flexibility on the price?")),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(
            second.conversation.get_id(),
            first.conversation.get_id()
        );
        assert_eq!(second.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_listing_threads_take_the_listing_title_as_subject() {
        let state = setup_test_state();
        let (_, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (finn, _) = member_with_headers(&state, "finn@example.com", "Finn").await;
        let listing = repo::create_listing(
            &state.pool,
            &finn.get_id(),
            "Orion XT8 Dobsonian".to_string(),
            "Barely used, includes two eyepieces".to_string(),
            "telescopes".to_string(),
            30_000,
        )
        .await
        .unwrap();

        let detail = start_conversation_handler(
            State(state),
            vera_headers,
            Json(StartConversationDto {
                listing_id: Some(listing.get_id()),
                ..opener(&finn.get_id(), "Would you take 250 for it?")
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(
            detail.conversation.get_subject(),
            Some("Orion XT8 Dobsonian".to_string())
        );
        assert_eq!(detail.conversation.get_listing_id(), Some(listing.get_id()));
    }

    #[tokio::test]
    async fn test_inbox_counts_unread_messages() {
        let state = setup_test_state();
        let (_, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (finn, finn_headers) = member_with_headers(&state, "finn@example.com", "Finn").await;

        start_conversation_handler(
            State(state.clone()),
            vera_headers.clone(),
            Json(opener(&finn.get_id(), "Is the refractor still available?")),
        )
        .await
        .unwrap();

        let finn_inbox = list_conversations_handler(State(state.clone()), finn_headers)
            .await
            .unwrap()
            .0;
        assert_eq!(finn_inbox.len(), 1);
        assert_eq!(finn_inbox[0].unread_count, 1);
        assert_eq!(finn_inbox[0].other_participants[0].name, "Vera");
        assert!(finn_inbox[0].last_message.is_some());

        // Your own messages are never unread to you
        let vera_inbox = list_conversations_handler(State(state), vera_headers)
            .await
            .unwrap()
            .0;
        assert_eq!(vera_inbox[0].unread_count, 0);
    }

    #[tokio::test]
    async fn test_opening_a_thread_clears_unread() {
        let state = setup_test_state();
        let (_, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (finn, finn_headers) = member_with_headers(&state, "finn@example.com", "Finn").await;

        let detail = start_conversation_handler(
            State(state.clone()),
            vera_headers,
            Json(opener(&finn.get_id(), "Is the refractor still available?")),
        )
        .await
        .unwrap()
        .0;

        get_conversation_handler(
            State(state.clone()),
            Path(detail.conversation.get_id()),
            finn_headers.clone(),
        )
        .await
        .unwrap();

        let finn_inbox = list_conversations_handler(State(state), finn_headers)
            .await
            .unwrap()
            .0;
        assert_eq!(finn_inbox[0].unread_count, 0);
    }

    #[tokio::test]
    async fn test_replies_land_oldest_first() {
        let state = setup_test_state();
        let (_, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (finn, finn_headers) = member_with_headers(&state, "finn@example.com", "Finn").await;

        let detail = start_conversation_handler(
            State(state.clone()),
            vera_headers.clone(),
            Json(opener(&finn.get_id(), "Is the refractor still available?")),
        )
        .await
        .unwrap()
        .0;
        let conversation_id = detail.conversation.get_id();

        send_message_handler(
            State(state.clone()),
            Path(conversation_id.clone()),
            finn_headers,
            Json(SendMessageDto {
                body: "It is, want to see it at the next star party?".to_string(),
            }),
        )
        .await
        .unwrap();
        send_message_handler(
            State(state.clone()),
            Path(conversation_id.clone()),
            vera_headers.clone(),
            Json(SendMessageDto {
                body: "Perfect, see you there".to_string(),
            }),
        )
        .await
        .unwrap();

        let thread = get_conversation_handler(State(state), Path(conversation_id), vera_headers)
            .await
            .unwrap()
            .0;

        let bodies: Vec<String> = thread
            .messages
            .iter()
            .map(|message| message.get_body())
            .collect();
        assert_eq!(
            bodies,
            vec![
                "Is the refractor still available?",
                "It is, want to see it at the next star party?",
                "Perfect, see you there"
            ]
        );
    }

    #[tokio::test]
    async fn test_threads_are_invisible_to_outsiders() {
        let state = setup_test_state();
        let (_, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (finn, _) = member_with_headers(&state, "finn@example.com", "Finn").await;
        let (_, sol_headers) = member_with_headers(&state, "sol@example.com", "Sol").await;

        let detail = start_conversation_handler(
            State(state.clone()),
            vera_headers,
            Json(opener(&finn.get_id(), "Is the refractor still available?")),
        )
        .await
        .unwrap()
        .0;
        let conversation_id = detail.conversation.get_id();

        let err = get_conversation_handler(
            State(state.clone()),
            Path(conversation_id.clone()),
            sol_headers.clone(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));

        let err = send_message_handler(
            State(state),
            Path(conversation_id),
            sol_headers,
            Json(SendMessageDto {
                body: "Let me in".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn test_messaging_yourself_is_rejected() {
        let state = setup_test_state();
        let (vera, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;

        let err = start_conversation_handler(
            State(state),
            vera_headers,
            Json(opener(&vera.get_id(), "Note to self")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_bodies_are_rejected() {
        let state = setup_test_state();
        let (_, vera_headers) = member_with_headers(&state, "vera@example.com", "Vera").await;
        let (finn, _) = member_with_headers(&state, "finn@example.com", "Finn").await;

        let err = start_conversation_handler(
            State(state),
            vera_headers,
            Json(opener(&finn.get_id(), "   ")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }
}
