// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media feed routes. Plain CRUD: posts carry no point accrual.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::PostRecord;
use crate::routes::{encode_cursor, parse_cursor, PageCursor};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/posts", post(create_post))
        .route("/api/posts/{id}", delete(delete_post))
}

#[derive(Deserialize)]
struct FeedQuery {
    cursor: Option<String>,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostSummary>,
    pub next_cursor: Option<String>,
}

#[derive(Serialize)]
pub struct PostSummary {
    pub id: String,
    pub user_id: String,
    pub caption: Option<String>,
    pub media_url: String,
    pub media_kind: String,
    pub created_at: String,
}

impl From<PostRecord> for PostSummary {
    fn from(record: PostRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            caption: record.caption,
            media_url: record.media_url,
            media_kind: record.media_kind,
            created_at: record.created_at,
        }
    }
}

/// Feed page, newest first, cursor-paginated.
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let limit = params.per_page.min(MAX_PER_PAGE).max(1);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    // Fetch one extra item to determine if another page is available
    let mut records = state
        .db
        .get_feed(
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
            records.last().map(|p| {
                encode_cursor(&PageCursor {
                    sort_key: p.created_at.clone(),
                    doc_id: p.id.clone(),
                })
            })
        })
        .flatten();

    Ok(Json(FeedResponse {
        posts: records.into_iter().map(Into::into).collect(),
        next_cursor,
    }))
}

#[derive(Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 2000))]
    pub caption: Option<String>,
    #[validate(length(min = 1, max = 2048))]
    pub media_url: String,
    pub media_kind: String,
}

#[derive(Serialize)]
pub struct CreatePostResponse {
    pub post: PostSummary,
}

/// Publish a feed post.
async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<CreatePostResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if !matches!(payload.media_kind.as_str(), "image" | "video") {
        return Err(AppError::BadRequest(
            "media_kind must be 'image' or 'video'".to_string(),
        ));
    }

    super::api::require_complete_profile(&state, &user.user_id).await?;

    let record = PostRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        caption: payload.caption.map(|c| c.trim().to_string()),
        media_url: payload.media_url,
        media_kind: payload.media_kind,
        created_at: state.clock.now_rfc3339(),
    };
    state.db.set_post(&record).await?;

    tracing::info!(user_id = %user.user_id, post_id = %record.id, "Post published");

    Ok(Json(CreatePostResponse {
        post: record.into(),
    }))
}

#[derive(Serialize)]
pub struct DeletePostResponse {
    pub deleted: bool,
}

/// Delete an owned post.
async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<Json<DeletePostResponse>> {
    let record = state
        .db
        .get_post(&post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    if record.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "Only the owner can delete a post".to_string(),
        ));
    }

    state.db.delete_post(&post_id).await?;
    Ok(Json(DeletePostResponse { deleted: true }))
}
