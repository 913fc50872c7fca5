// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Highlight video models for storage and API.

use serde::{Deserialize, Serialize};

/// Stored highlight record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightRecord {
    /// Highlight ID (also used as document ID)
    pub id: String,
    /// Owner's user ID
    pub user_id: String,
    /// Video title
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// CDN URL of the uploaded video
    pub video_url: String,
    /// CDN URL of the thumbnail
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Denormalized like counter; the `likes` collection is the source of
    /// truth, this is kept in the same transaction as the like write
    #[serde(default)]
    pub upvotes: u32,
    /// Denormalized comment counter
    #[serde(default)]
    pub comments_count: u32,
    /// When the highlight was posted (RFC3339)
    pub created_at: String,
}

/// Like join record for idempotent set membership.
///
/// Document ID is `{highlight_id}_{user_id}`, so a user appears at most
/// once per highlight by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightLike {
    pub highlight_id: String,
    pub user_id: String,
    /// When the like was placed (RFC3339)
    pub liked_at: String,
}

impl HighlightLike {
    pub fn doc_id(highlight_id: &str, user_id: &str) -> String {
        format!("{}_{}", highlight_id, user_id)
    }
}

/// Comment on a highlight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Comment ID (also used as document ID)
    pub id: String,
    pub highlight_id: String,
    /// Commenter's user ID
    pub user_id: String,
    pub text: String,
    /// Whether this comment earned the paired award at creation time,
    /// so deletion knows whether to reverse it
    #[serde(default)]
    pub qualified_for_points: bool,
    /// When the comment was posted (RFC3339)
    pub created_at: String,
}
