use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use elroi_shared::clients::db::get_conn;
use elroi_shared::errors::AppResult;
use elroi_shared::types::auth::AuthUser;
use elroi_shared::types::ApiResponse;

use crate::models::{Message, PublicProfile};
use crate::services::{conversation_store, user_directory};
use crate::AppState;

// --- GET /messages ---

#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub partner: PublicProfile,
    pub unread: i64,
}

pub async fn list_conversations(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ConversationSummary>>>> {
    let mut conn = get_conn(&state.db)?;

    let partners = user_directory::partners_of(&mut conn, user.id)?;
    let unread: HashMap<i32, i64> = conversation_store::unread_by_sender(&mut conn, user.id)?
        .into_iter()
        .collect();

    let summaries = partners
        .into_iter()
        .map(|partner| ConversationSummary {
            unread: unread.get(&partner.id).copied().unwrap_or(0),
            partner: PublicProfile::from(partner),
        })
        .collect();

    Ok(Json(ApiResponse::ok(summaries)))
}

// --- GET /messages/unread-count ---

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

pub async fn unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCount>>> {
    let mut conn = get_conn(&state.db)?;
    let unread = conversation_store::unread_count(&mut conn, user.id)?;

    Ok(Json(ApiResponse::ok(UnreadCount { unread })))
}

// --- GET /messages/:id ---

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub other_user: PublicProfile,
    pub messages: Vec<Message>,
}

/// Opening a conversation marks what the other user sent as read. The thread
/// is loaded first, so the response still shows those messages as unread.
pub async fn conversation(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(other_id): Path<i32>,
) -> AppResult<Json<ApiResponse<ConversationView>>> {
    let mut conn = get_conn(&state.db)?;

    let other = user_directory::find(&mut conn, other_id)?;

    let messages = conversation_store::list_thread(&mut conn, user.id, other.id)?;
    conversation_store::mark_read(&mut conn, user.id, other.id)?;

    Ok(Json(ApiResponse::ok(ConversationView {
        other_user: PublicProfile::from(other),
        messages,
    })))
}

// --- POST /messages/:id ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

pub async fn send_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(receiver_id): Path<i32>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    let mut conn = get_conn(&state.db)?;
    let message = conversation_store::post_message(&mut conn, user.id, receiver_id, &req.content)?;

    Ok(Json(ApiResponse::ok_with_message(message, "Message sent!")))
}
