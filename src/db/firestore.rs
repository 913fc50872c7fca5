// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles, points, daily activity, username reservations)
//! - Highlights (videos, normalized likes, comments)
//! - Posts (media feed)
//! - Chats and messages
//!
//! Point accrual and like toggling are transactional read-modify-writes:
//! if another device mutates the same user concurrently, Firestore retries
//! with fresh data, preventing lost updates.

use crate::clock::Clock;
use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    ChatRecord, CommentRecord, DailyActivity, HighlightLike, HighlightRecord, MessageRecord,
    PostRecord, UserRecord,
};
use crate::services::points::{self, ActivityKind, AwardOutcome};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Username reservation document, keyed by lowercase handle.
#[derive(Debug, Serialize, Deserialize)]
struct UsernameReservation {
    user_id: String,
}

/// Result of a like toggle, carrying the counter after the flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked { upvotes: u32 },
    Unliked { upvotes: u32 },
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by account ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &UserRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a user, erroring if absent. For operations that presume existence.
    async fn require_user(&self, user_id: &str) -> Result<UserRecord, AppError> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Top users by points, for the leaderboard.
    pub async fn get_leaderboard(&self, limit: u32) -> Result<Vec<UserRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("points", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Candidate pool for matchmaking: users flagged ready to match.
    ///
    /// The heuristic filters and scores client-side; this just bounds the
    /// bulk fetch.
    pub async fn get_match_pool(&self, limit: u32) -> Result<Vec<UserRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| {
                q.for_all([q
                    .field("match_preferences.ready_to_match")
                    .eq(true)])
            })
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Username Reservations ───────────────────────────────────

    /// Atomically claim a username (case-insensitive) for a user and
    /// release their previous reservation.
    ///
    /// Returns `false` if the handle is already held by someone else;
    /// that is a business outcome, not an error.
    pub async fn reserve_username(
        &self,
        user_id: &str,
        username_key: &str,
        previous_key: Option<&str>,
    ) -> Result<bool, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // The read sits outside the transaction's conflict scope: two
        // concurrent first claims of the same handle can both pass this
        // check, and the later commit wins.
        let existing: Option<UsernameReservation> = client
            .fluent()
            .select()
            .by_id_in(collections::USERNAMES)
            .obj()
            .one(username_key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(reservation) = existing {
            let _ = transaction.rollback().await;
            // Re-claiming your own handle (case change) is allowed
            return Ok(reservation.user_id == user_id);
        }

        client
            .fluent()
            .update()
            .in_col(collections::USERNAMES)
            .document_id(username_key)
            .object(&UsernameReservation {
                user_id: user_id.to_string(),
            })
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add reservation to transaction: {}", e))
            })?;

        if let Some(previous) = previous_key {
            if previous != username_key {
                client
                    .fluent()
                    .delete()
                    .from(collections::USERNAMES)
                    .document_id(previous)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add reservation release to transaction: {}",
                            e
                        ))
                    })?;
            }
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(user_id, username = username_key, "Username reserved");
        Ok(true)
    }

    // ─── Points Accrual ──────────────────────────────────────────

    /// Load the user's daily activity, lazily resetting it when the stored
    /// Eastern date is not today. The reset is persisted before returning,
    /// as a transactional read-modify-write so it cannot clobber a point
    /// award committed concurrently from another device.
    pub async fn get_daily_activity(
        &self,
        user_id: &str,
        clock: &dyn Clock,
    ) -> Result<DailyActivity, AppError> {
        let client = self.get_client()?;
        let today = clock.eastern_date_string();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let user = self.require_user(user_id).await?;

        if user.daily_activity.date == today {
            let _ = transaction.rollback().await;
            return Ok(user.daily_activity);
        }

        let rolled = points::rolled_activity(&user.daily_activity, &today);
        let mut updated = user;
        updated.daily_activity = rolled.clone();

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&updated.id)
            .object(&updated)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add reset to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(user_id, date = %today, "Daily activity reset for new day");
        Ok(rolled)
    }

    /// Award points for an actor's own action, enforcing an optional daily
    /// cap, as one transactional read-modify-write on the user document.
    pub async fn award_points(
        &self,
        user_id: &str,
        amount: u32,
        kind: ActivityKind,
        limit: Option<u32>,
        clock: &dyn Clock,
    ) -> Result<AwardOutcome, AppError> {
        let client = self.get_client()?;
        let today = clock.eastern_date_string();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Read the user within the transaction scope to register the
        // document for conflict detection
        let user = self.require_user(user_id).await?;
        let decision = points::decide_award(&user, amount, kind, limit, &today);

        if !decision.outcome.is_awarded() {
            // Nothing to write
            let _ = transaction.rollback().await;
            tracing::debug!(
                user_id,
                activity = kind.as_str(),
                "Daily limit reached, no points awarded"
            );
            return Ok(decision.outcome);
        }

        let mut updated = user;
        updated.points = decision.points;
        updated.daily_activity = decision.daily_activity;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&updated.id)
            .object(&updated)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add award to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id,
            amount,
            activity = kind.as_str(),
            new_total = decision.points,
            "Points awarded"
        );
        Ok(decision.outcome)
    }

    /// Unconditional increment of the content owner's points when someone
    /// else engages with their content. No cap, no counter interaction.
    pub async fn award_creator_points(
        &self,
        creator_id: &str,
        amount: u32,
    ) -> Result<u32, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut user = self.require_user(creator_id).await?;
        user.points = user.points.saturating_add(amount);

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add award to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(creator_id, amount, new_total = user.points, "Creator points awarded");
        Ok(user.points)
    }

    /// Deduct points, clamped at zero.
    pub async fn deduct_points(&self, user_id: &str, amount: u32) -> Result<u32, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut user = self.require_user(user_id).await?;
        user.points = points::deduct(user.points, amount);

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add deduction to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(user_id, amount, new_total = user.points, "Points deducted");
        Ok(user.points)
    }

    /// Reverse a comment's paired award: deduct from the commenter and,
    /// if different, from the content owner.
    pub async fn deduct_comment_points(
        &self,
        commenter_id: &str,
        creator_id: &str,
        amount: u32,
    ) -> Result<(), AppError> {
        self.deduct_points(commenter_id, amount).await?;
        if creator_id != commenter_id {
            self.deduct_points(creator_id, amount).await?;
        }
        Ok(())
    }

    // ─── Highlight Operations ────────────────────────────────────

    pub async fn get_highlight(
        &self,
        highlight_id: &str,
    ) -> Result<Option<HighlightRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::HIGHLIGHTS)
            .obj()
            .one(highlight_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn set_highlight(&self, highlight: &HighlightRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::HIGHLIGHTS)
            .document_id(&highlight.id)
            .object(highlight)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Recent highlights, newest first, optionally older than a cursor.
    pub async fn get_highlights(
        &self,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<HighlightRecord>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::HIGHLIGHTS);

        let query = if let Some(before) = before {
            let before = before.to_string();
            query.filter(move |q| q.for_all([q.field("created_at").less_than(before.clone())]))
        } else {
            query
        };

        query
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Toggle a like keyed by (highlight, user) in a single transaction.
    ///
    /// The like relation is the source of truth; `upvotes` is the
    /// denormalized counter updated in the same commit, so the two cannot
    /// drift and toggling twice in rapid succession converges instead of
    /// double-counting.
    pub async fn toggle_like(
        &self,
        highlight_id: &str,
        user_id: &str,
        clock: &dyn Clock,
    ) -> Result<LikeToggle, AppError> {
        let client = self.get_client()?;
        let doc_id = HighlightLike::doc_id(highlight_id, user_id);

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let existing: Option<HighlightLike> = client
            .fluent()
            .select()
            .by_id_in(collections::LIKES)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut highlight = self.get_highlight(highlight_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Highlight {} not found", highlight_id))
        })?;

        let toggle = if existing.is_none() {
            highlight.upvotes += 1;

            client
                .fluent()
                .update()
                .in_col(collections::LIKES)
                .document_id(&doc_id)
                .object(&HighlightLike {
                    highlight_id: highlight_id.to_string(),
                    user_id: user_id.to_string(),
                    liked_at: clock.now_rfc3339(),
                })
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add like to transaction: {}", e))
                })?;

            LikeToggle::Liked {
                upvotes: highlight.upvotes,
            }
        } else {
            highlight.upvotes = highlight.upvotes.saturating_sub(1);

            client
                .fluent()
                .delete()
                .from(collections::LIKES)
                .document_id(&doc_id)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add unlike to transaction: {}", e))
                })?;

            LikeToggle::Unliked {
                upvotes: highlight.upvotes,
            }
        };

        client
            .fluent()
            .update()
            .in_col(collections::HIGHLIGHTS)
            .document_id(&highlight.id)
            .object(&highlight)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add counter to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(highlight_id, user_id, ?toggle, "Like toggled");
        Ok(toggle)
    }

    /// Delete a highlight and cascade to its likes and comments.
    ///
    /// Returns the deleted like and comment records so the caller can
    /// reverse the matching point awards.
    pub async fn delete_highlight(
        &self,
        highlight_id: &str,
    ) -> Result<(Vec<HighlightLike>, Vec<CommentRecord>), AppError> {
        let client = self.get_client()?;

        let likes: Vec<HighlightLike> = client
            .fluent()
            .select()
            .from(collections::LIKES)
            .filter(|q| q.for_all([q.field("highlight_id").eq(highlight_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let comments: Vec<CommentRecord> = client
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(|q| q.for_all([q.field("highlight_id").eq(highlight_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.batch_delete(&likes, collections::LIKES, |like: &HighlightLike| {
            HighlightLike::doc_id(&like.highlight_id, &like.user_id)
        })
        .await?;

        self.batch_delete(&comments, collections::COMMENTS, |comment: &CommentRecord| {
            comment.id.clone()
        })
        .await?;

        client
            .fluent()
            .delete()
            .from(collections::HIGHLIGHTS)
            .document_id(highlight_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            highlight_id,
            likes = likes.len(),
            comments = comments.len(),
            "Highlight deleted with cascade"
        );

        Ok((likes, comments))
    }

    // ─── Comment Operations ──────────────────────────────────────

    /// Store a comment and bump the highlight's comment counter together.
    pub async fn create_comment(&self, comment: &CommentRecord) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut highlight = self
            .get_highlight(&comment.highlight_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Highlight {} not found", comment.highlight_id))
            })?;
        highlight.comments_count += 1;

        client
            .fluent()
            .update()
            .in_col(collections::COMMENTS)
            .document_id(&comment.id)
            .object(comment)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add comment to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::HIGHLIGHTS)
            .document_id(&highlight.id)
            .object(&highlight)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add counter to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    pub async fn get_comment(&self, comment_id: &str) -> Result<Option<CommentRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COMMENTS)
            .obj()
            .one(comment_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment and decrement the highlight's comment counter.
    pub async fn delete_comment(&self, comment: &CommentRecord) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .delete()
            .from(collections::COMMENTS)
            .document_id(&comment.id)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add deletion to transaction: {}", e))
            })?;

        // The highlight may already be gone if the comment is deleted during
        // a cascade; only decrement when it still exists.
        if let Some(mut highlight) = self.get_highlight(&comment.highlight_id).await? {
            highlight.comments_count = highlight.comments_count.saturating_sub(1);
            client
                .fluent()
                .update()
                .in_col(collections::HIGHLIGHTS)
                .document_id(&highlight.id)
                .object(&highlight)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add counter to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    /// Comments on a highlight, newest first.
    pub async fn get_comments(
        &self,
        highlight_id: &str,
        limit: u32,
    ) -> Result<Vec<CommentRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(|q| q.for_all([q.field("highlight_id").eq(highlight_id)]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Post / Feed Operations ──────────────────────────────────

    pub async fn set_post(&self, post: &PostRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::POSTS)
            .document_id(&post.id)
            .object(post)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Option<PostRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::POSTS)
            .obj()
            .one(post_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::POSTS)
            .document_id(post_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Feed page, newest first, optionally older than a cursor timestamp.
    pub async fn get_feed(
        &self,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PostRecord>, AppError> {
        let query = self.get_client()?.fluent().select().from(collections::POSTS);

        let query = if let Some(before) = before {
            let before = before.to_string();
            query.filter(move |q| q.for_all([q.field("created_at").less_than(before.clone())]))
        } else {
            query
        };

        query
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Chat / Message Operations ───────────────────────────────

    pub async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHATS)
            .obj()
            .one(chat_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn set_chat(&self, chat: &ChatRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHATS)
            .document_id(&chat.id)
            .object(chat)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All chats a user belongs to, most recently active first.
    pub async fn get_chats_for_user(&self, user_id: &str) -> Result<Vec<ChatRecord>, AppError> {
        let client = self.get_client()?;

        // Membership is a sorted pair, so one query per side
        let as_a: Vec<ChatRecord> = client
            .fluent()
            .select()
            .from(collections::CHATS)
            .filter(|q| q.for_all([q.field("member_a").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let as_b: Vec<ChatRecord> = client
            .fluent()
            .select()
            .from(collections::CHATS)
            .filter(|q| q.for_all([q.field("member_b").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut chats: Vec<ChatRecord> = as_a.into_iter().chain(as_b).collect();
        chats.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(chats)
    }

    /// Store a message and update the chat preview in one transaction.
    pub async fn create_message(&self, message: &MessageRecord) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut chat = self
            .get_chat(&message.chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Chat {} not found", message.chat_id)))?;
        chat.last_message = Some(message.text.clone());
        chat.last_message_at = Some(message.sent_at.clone());

        client
            .fluent()
            .update()
            .in_col(collections::MESSAGES)
            .document_id(&message.id)
            .object(message)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add message to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::CHATS)
            .document_id(&chat.id)
            .object(&chat)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add chat update to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    /// Messages in a chat, newest first, optionally older than a cursor.
    pub async fn get_messages(
        &self,
        chat_id: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, AppError> {
        let chat_id = chat_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES);

        let query = if let Some(before) = before {
            let before = before.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("chat_id").eq(chat_id.clone()),
                    q.field("sent_at").less_than(before.clone()),
                ])
            })
        } else {
            query.filter(move |q| q.for_all([q.field("chat_id").eq(chat_id.clone())]))
        };

        query
            .order_by([("sent_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    /// Concurrently store a set of like records (backfill/repair tooling).
    pub async fn batch_set_likes(&self, records: &[HighlightLike]) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(records.to_vec())
            .map(|record| async move {
                let doc_id = HighlightLike::doc_id(&record.highlight_id, &record.user_id);

                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::LIKES)
                    .document_id(&doc_id)
                    .object(&record)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }
}
