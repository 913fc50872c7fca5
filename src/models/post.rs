// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media feed post model.

use serde::{Deserialize, Serialize};

/// Feed post stored in Firestore. Plain CRUD, no point accrual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    /// Post ID (also used as document ID)
    pub id: String,
    /// Author's user ID
    pub user_id: String,
    #[serde(default)]
    pub caption: Option<String>,
    /// CDN URL of the attached media
    pub media_url: String,
    /// "image" or "video"
    pub media_kind: String,
    /// When the post was created (RFC3339; feed cursor sort key)
    pub created_at: String,
}
