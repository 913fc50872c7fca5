// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod chat;
pub mod highlight;
pub mod post;
pub mod user;

pub use chat::{ChatRecord, MessageRecord};
pub use highlight::{CommentRecord, HighlightLike, HighlightRecord};
pub use post::PostRecord;
pub use user::{
    AdminAttributes, AdminRole, AthleteAttributes, CoachAttributes, DailyActivity,
    MatchPreferences, Role, UserRecord,
};
