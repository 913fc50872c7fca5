// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Direct messaging routes. Plain CRUD over chats and messages.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ChatRecord, MessageRecord};
use crate::routes::{encode_cursor, parse_cursor, PageCursor};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const DEFAULT_MESSAGES_PER_PAGE: u32 = 50;
const MAX_MESSAGES_PER_PAGE: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chats", get(get_chats).post(open_chat))
        .route(
            "/api/chats/{id}/messages",
            get(get_messages).post(send_message),
        )
}

#[derive(Serialize)]
pub struct ChatSummary {
    pub id: String,
    /// The other participant
    pub peer_id: String,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
}

impl ChatSummary {
    fn for_viewer(chat: &ChatRecord, viewer_id: &str) -> Self {
        let peer_id = if chat.member_a == viewer_id {
            chat.member_b.clone()
        } else {
            chat.member_a.clone()
        };
        Self {
            id: chat.id.clone(),
            peer_id,
            last_message: chat.last_message.clone(),
            last_message_at: chat.last_message_at.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ChatsResponse {
    pub chats: Vec<ChatSummary>,
}

/// All chats the caller belongs to, most recently active first.
async fn get_chats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ChatsResponse>> {
    let chats = state.db.get_chats_for_user(&user.user_id).await?;
    Ok(Json(ChatsResponse {
        chats: chats
            .iter()
            .map(|c| ChatSummary::for_viewer(c, &user.user_id))
            .collect(),
    }))
}

#[derive(Deserialize)]
pub struct OpenChatRequest {
    pub peer_id: String,
}

#[derive(Serialize)]
pub struct OpenChatResponse {
    pub chat: ChatSummary,
}

/// Get or create the chat with another user. One chat per pair: the
/// document ID is the sorted member pair, so a concurrent open from the
/// other side lands on the same document.
async fn open_chat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<OpenChatRequest>,
) -> Result<Json<OpenChatResponse>> {
    if payload.peer_id == user.user_id {
        return Err(AppError::BadRequest(
            "Cannot open a chat with yourself".to_string(),
        ));
    }

    // Peer must be a real account
    state
        .db
        .get_user(&payload.peer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", payload.peer_id)))?;

    let chat_id = ChatRecord::pair_id(&user.user_id, &payload.peer_id);

    let chat = match state.db.get_chat(&chat_id).await? {
        Some(chat) => chat,
        None => {
            let (member_a, member_b) = if user.user_id <= payload.peer_id {
                (user.user_id.clone(), payload.peer_id.clone())
            } else {
                (payload.peer_id.clone(), user.user_id.clone())
            };
            let chat = ChatRecord {
                id: chat_id,
                member_a,
                member_b,
                last_message: None,
                last_message_at: None,
                created_at: state.clock.now_rfc3339(),
            };
            state.db.set_chat(&chat).await?;
            chat
        }
    };

    Ok(Json(OpenChatResponse {
        chat: ChatSummary::for_viewer(&chat, &user.user_id),
    }))
}

// ─── Messages ────────────────────────────────────────────────

#[derive(Deserialize)]
struct MessagesQuery {
    cursor: Option<String>,
    #[serde(default = "default_messages_per_page")]
    per_page: u32,
}

fn default_messages_per_page() -> u32 {
    DEFAULT_MESSAGES_PER_PAGE
}

#[derive(Serialize)]
pub struct MessageSummary {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    pub sent_at: String,
}

impl From<MessageRecord> for MessageSummary {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            text: record.text,
            sent_at: record.sent_at,
        }
    }
}

#[derive(Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageSummary>,
    pub next_cursor: Option<String>,
}

/// Messages in a chat, newest first, cursor-paginated. Members only.
async fn get_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>> {
    let chat = require_membership(&state, &chat_id, &user.user_id).await?;

    let limit = params.per_page.min(MAX_MESSAGES_PER_PAGE).max(1);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let mut records = state
        .db
        .get_messages(
            &chat.id,
            cursor.as_ref().map(|c| c.sort_key.as_str()),
            limit.saturating_add(1),
        )
        .await?;

    let has_more = records.len() > limit as usize;
    if has_more {
        records.truncate(limit as usize);
    }

    let next_cursor = has_more
        .then(|| {
            records.last().map(|m| {
                encode_cursor(&PageCursor {
                    sort_key: m.sent_at.clone(),
                    doc_id: m.id.clone(),
                })
            })
        })
        .flatten();

    Ok(Json(MessagesResponse {
        messages: records.into_iter().map(Into::into).collect(),
        next_cursor,
    }))
}

#[derive(Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

#[derive(Serialize)]
pub struct SendMessageResponse {
    pub message: MessageSummary,
}

/// Send a message in a chat the caller belongs to.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let chat = require_membership(&state, &chat_id, &user.user_id).await?;

    let message = MessageRecord {
        id: uuid::Uuid::new_v4().to_string(),
        chat_id: chat.id.clone(),
        sender_id: user.user_id.clone(),
        text: payload.text,
        sent_at: state.clock.now_rfc3339(),
    };
    state.db.create_message(&message).await?;

    Ok(Json(SendMessageResponse {
        message: message.into(),
    }))
}

async fn require_membership(
    state: &AppState,
    chat_id: &str,
    user_id: &str,
) -> Result<ChatRecord> {
    let chat = state
        .db
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat {} not found", chat_id)))?;

    if !chat.has_member(user_id) {
        return Err(AppError::Forbidden(
            "Not a member of this chat".to_string(),
        ));
    }
    Ok(chat)
}
