// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Highlight routes: posting, feed, like toggling and comments, with the
//! point accrual each of those carries.

use crate::db::LikeToggle;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CommentRecord, HighlightRecord};
use crate::routes::{encode_cursor, parse_cursor, PageCursor};
use crate::services::points::{comment_qualifies, ActivityKind, AwardOutcome};
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
const MAX_COMMENTS_PAGE: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/highlights", get(get_highlights).post(create_highlight))
        .route("/api/highlights/{id}", delete(delete_highlight))
        .route("/api/highlights/{id}/like", post(toggle_like))
        .route(
            "/api/highlights/{id}/comments",
            get(get_comments).post(create_comment),
        )
        .route(
            "/api/highlights/{id}/comments/{comment_id}",
            delete(delete_comment),
        )
}

// ─── Highlight Posting ───────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateHighlightRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 2048))]
    pub video_url: String,
    #[validate(length(max = 2048))]
    pub thumbnail_url: Option<String>,
}

/// Response for highlight creation. A hit daily cap is an expected
/// outcome: the submission is not stored and no points move.
#[derive(Serialize)]
pub struct CreateHighlightResponse {
    pub created: bool,
    #[serde(flatten)]
    pub outcome: AwardOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<HighlightSummary>,
}

#[derive(Serialize)]
pub struct HighlightSummary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub upvotes: u32,
    pub comments_count: u32,
    pub created_at: String,
}

impl From<HighlightRecord> for HighlightSummary {
    fn from(record: HighlightRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            title: record.title,
            description: record.description,
            video_url: record.video_url,
            thumbnail_url: record.thumbnail_url,
            upvotes: record.upvotes,
            comments_count: record.comments_count,
            created_at: record.created_at,
        }
    }
}

/// Submit a highlight video. Awards posting points, capped per day.
async fn create_highlight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateHighlightRequest>,
) -> Result<Json<CreateHighlightResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    super::api::require_complete_profile(&state, &user.user_id).await?;

    let cfg = &state.config.points;

    // Award first: a capped day rejects the submission outright
    let outcome = state
        .db
        .award_points(
            &user.user_id,
            cfg.highlight_points,
            ActivityKind::HighlightPosted,
            Some(cfg.highlight_daily_max),
            state.clock.as_ref(),
        )
        .await?;

    if !outcome.is_awarded() {
        return Ok(Json(CreateHighlightResponse {
            created: false,
            outcome,
            highlight: None,
        }));
    }

    let highlight = HighlightRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        title: payload.title.trim().to_string(),
        description: payload.description.map(|d| d.trim().to_string()),
        video_url: payload.video_url,
        thumbnail_url: payload.thumbnail_url,
        upvotes: 0,
        comments_count: 0,
        created_at: state.clock.now_rfc3339(),
    };
    state.db.set_highlight(&highlight).await?;

    tracing::info!(
        user_id = %user.user_id,
        highlight_id = %highlight.id,
        "Highlight posted"
    );

    Ok(Json(CreateHighlightResponse {
        created: true,
        outcome,
        highlight: Some(highlight.into()),
    }))
}

// ─── Highlight Feed ──────────────────────────────────────────

#[derive(Deserialize)]
struct HighlightsQuery {
    cursor: Option<String>,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

#[derive(Serialize)]
pub struct HighlightsResponse {
    pub highlights: Vec<HighlightSummary>,
    pub next_cursor: Option<String>,
}

/// Recent highlights, newest first, cursor-paginated.
async fn get_highlights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HighlightsQuery>,
) -> Result<Json<HighlightsResponse>> {
    let limit = params.per_page.min(MAX_PER_PAGE).max(1);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    // Fetch one extra item to determine if another page is available
    let mut records = state
        .db
        .get_highlights(
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
            records.last().map(|h| {
                encode_cursor(&PageCursor {
                    sort_key: h.created_at.clone(),
                    doc_id: h.id.clone(),
                })
            })
        })
        .flatten();

    Ok(Json(HighlightsResponse {
        highlights: records.into_iter().map(Into::into).collect(),
        next_cursor,
    }))
}

// ─── Highlight Deletion ──────────────────────────────────────

#[derive(Serialize)]
pub struct DeleteHighlightResponse {
    pub deleted: bool,
}

/// Delete an owned highlight, reversing every point award it generated:
/// the posting award, each liker's award and the owner's per-like
/// recipient awards, and each qualified comment's paired award.
async fn delete_highlight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(highlight_id): Path<String>,
) -> Result<Json<DeleteHighlightResponse>> {
    let highlight = state
        .db
        .get_highlight(&highlight_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Highlight {} not found", highlight_id)))?;

    if highlight.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "Only the owner can delete a highlight".to_string(),
        ));
    }

    let (likes, comments) = state.db.delete_highlight(&highlight_id).await?;

    let cfg = &state.config.points;

    // Posting award
    state
        .db
        .deduct_points(&highlight.user_id, cfg.highlight_points)
        .await?;

    // Like awards, both sides
    for like in &likes {
        state.db.deduct_points(&like.user_id, cfg.like_points).await?;
        if like.user_id != highlight.user_id {
            state
                .db
                .deduct_points(&highlight.user_id, cfg.like_points)
                .await?;
        }
    }

    // Qualified comment awards, both sides
    for comment in &comments {
        if comment.qualified_for_points {
            state
                .db
                .deduct_comment_points(&comment.user_id, &highlight.user_id, cfg.comment_points)
                .await?;
        }
    }

    tracing::info!(
        user_id = %user.user_id,
        highlight_id = %highlight_id,
        "Highlight deleted and awards reversed"
    );

    Ok(Json(DeleteHighlightResponse { deleted: true }))
}

// ─── Like Toggling ───────────────────────────────────────────

#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub upvotes: u32,
}

/// Toggle the caller's like on a highlight.
///
/// Idempotent per (highlight, user): like -> unlike -> like converges to a
/// single like and never double-counts. Points move with the toggle.
async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(highlight_id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let highlight = state
        .db
        .get_highlight(&highlight_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Highlight {} not found", highlight_id)))?;

    // Serialize double-taps from this instance; the transaction inside
    // toggle_like guards cross-instance races
    let lock = state.toggle_lock(&highlight_id, &user.user_id);
    let _guard = lock.lock().await;

    let toggle = state
        .db
        .toggle_like(&highlight_id, &user.user_id, state.clock.as_ref())
        .await?;

    let cfg = &state.config.points;
    let self_like = highlight.user_id == user.user_id;

    let (liked, upvotes) = match toggle {
        LikeToggle::Liked { upvotes } => {
            state
                .db
                .award_points(
                    &user.user_id,
                    cfg.like_points,
                    ActivityKind::LikeGiven,
                    None,
                    state.clock.as_ref(),
                )
                .await?;
            if !self_like {
                state
                    .db
                    .award_creator_points(&highlight.user_id, cfg.like_points)
                    .await?;
            }
            (true, upvotes)
        }
        LikeToggle::Unliked { upvotes } => {
            state.db.deduct_points(&user.user_id, cfg.like_points).await?;
            if !self_like {
                state
                    .db
                    .deduct_points(&highlight.user_id, cfg.like_points)
                    .await?;
            }
            (false, upvotes)
        }
    };

    Ok(Json(LikeResponse { liked, upvotes }))
}

// ─── Comments ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

#[derive(Serialize)]
pub struct CommentSummary {
    pub id: String,
    pub highlight_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: String,
}

impl From<CommentRecord> for CommentSummary {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            highlight_id: record.highlight_id,
            user_id: record.user_id,
            text: record.text,
            created_at: record.created_at,
        }
    }
}

/// Response for comment creation. `points` reports whether the comment
/// earned the paired award: "awarded", "limit_reached" or "too_short".
#[derive(Serialize)]
pub struct CreateCommentResponse {
    pub comment: CommentSummary,
    pub points: &'static str,
}

/// Comment on a highlight. Comments below the length minimum are stored
/// but earn no points; qualified comments award the commenter (capped per
/// day) and the content owner (uncapped) together.
async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(highlight_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<CreateCommentResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    super::api::require_complete_profile(&state, &user.user_id).await?;

    let highlight = state
        .db
        .get_highlight(&highlight_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Highlight {} not found", highlight_id)))?;

    let cfg = &state.config.points;
    let qualifies = comment_qualifies(&payload.text, cfg.min_comment_chars);

    // The paired award: commenter first (capped), owner only when the
    // commenter's award went through, so deletion can reverse both sides.
    let points_status = if qualifies {
        let outcome = state
            .db
            .award_points(
                &user.user_id,
                cfg.comment_points,
                ActivityKind::CommentGiven,
                Some(cfg.comment_daily_max),
                state.clock.as_ref(),
            )
            .await?;

        match outcome {
            AwardOutcome::Awarded { .. } => {
                if highlight.user_id != user.user_id {
                    state
                        .db
                        .award_creator_points(&highlight.user_id, cfg.comment_points)
                        .await?;
                }
                "awarded"
            }
            AwardOutcome::LimitReached { .. } => "limit_reached",
        }
    } else {
        "too_short"
    };

    let comment = CommentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        highlight_id: highlight_id.clone(),
        user_id: user.user_id.clone(),
        text: payload.text.trim().to_string(),
        qualified_for_points: points_status == "awarded",
        created_at: state.clock.now_rfc3339(),
    };
    state.db.create_comment(&comment).await?;

    tracing::info!(
        user_id = %user.user_id,
        highlight_id = %highlight_id,
        points = points_status,
        "Comment posted"
    );

    Ok(Json(CreateCommentResponse {
        comment: comment.into(),
        points: points_status,
    }))
}

#[derive(Deserialize)]
struct CommentsQuery {
    #[serde(default = "default_comments_limit")]
    limit: u32,
}

fn default_comments_limit() -> u32 {
    50
}

#[derive(Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentSummary>,
}

/// Comments on a highlight, newest first.
async fn get_comments(
    State(state): State<Arc<AppState>>,
    Path(highlight_id): Path<String>,
    Query(params): Query<CommentsQuery>,
) -> Result<Json<CommentsResponse>> {
    let limit = params.limit.min(MAX_COMMENTS_PAGE).max(1);
    let comments = state.db.get_comments(&highlight_id, limit).await?;
    Ok(Json(CommentsResponse {
        comments: comments.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Serialize)]
pub struct DeleteCommentResponse {
    pub deleted: bool,
}

/// Delete a comment (author or highlight owner), reversing the paired
/// award if the comment had earned one.
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((highlight_id, comment_id)): Path<(String, String)>,
) -> Result<Json<DeleteCommentResponse>> {
    let comment = state
        .db
        .get_comment(&comment_id)
        .await?
        .filter(|c| c.highlight_id == highlight_id)
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

    let highlight = state
        .db
        .get_highlight(&highlight_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Highlight {} not found", highlight_id)))?;

    if comment.user_id != user.user_id && highlight.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "Only the author or the highlight owner can delete a comment".to_string(),
        ));
    }

    state.db.delete_comment(&comment).await?;

    if comment.qualified_for_points {
        state
            .db
            .deduct_comment_points(
                &comment.user_id,
                &highlight.user_id,
                state.config.points.comment_points,
            )
            .await?;
    }

    Ok(Json(DeleteCommentResponse { deleted: true }))
}
