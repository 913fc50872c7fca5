// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, matchmaking and leaderboard routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    AdminAttributes, AdminRole, AthleteAttributes, CoachAttributes, DailyActivity,
    MatchPreferences, Role, UserRecord,
};
use crate::services::{compute_matches, is_complete, profile};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const MATCH_POOL_FETCH_LIMIT: u32 = 500;
const DEFAULT_LEADERBOARD_SIZE: u32 = 25;
const MAX_LEADERBOARD_SIZE: u32 = 100;

/// Profile, matching and leaderboard routes (require authentication).
/// The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/me/complete", get(get_completeness))
        .route("/api/matches", get(get_matches))
        .route("/api/leaderboard", get(get_leaderboard))
}

// ─── User Profile ────────────────────────────────────────────

/// Profile as returned to its owner.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub name: String,
    pub user_type: String,
    pub points: u32,
    pub daily_activity: DailyActivity,
    pub match_preferences: Option<MatchPreferences>,
    /// Whether the profile passes the completeness gate
    pub complete: bool,
}

impl ProfileResponse {
    fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            username: record.username.clone(),
            name: record.name.clone(),
            user_type: record.role.user_type().to_string(),
            points: record.points,
            daily_activity: record.daily_activity.clone(),
            match_preferences: record.match_preferences.clone(),
            complete: is_complete(Some(record)),
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let record = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(ProfileResponse::from_record(&record)))
}

/// Profile update payload. Every field optional; on first save the role
/// tag (`user_type`) is required.
#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = profile::validate_username))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// "athlete" | "mentor" | "coach" | "admin"
    pub user_type: Option<String>,
    pub admin_role: Option<AdminRole>,

    // Role-shaped attributes; which ones apply depends on the role tag
    #[validate(length(max = 100))]
    pub team: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub position: Option<String>,
    #[validate(length(max = 50))]
    pub sport: Option<String>,
    #[validate(length(max = 20))]
    pub height: Option<String>,
    #[validate(length(max = 20))]
    pub vertical: Option<String>,
    #[validate(length(max = 20))]
    pub weight: Option<String>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
    #[validate(length(max = 100))]
    pub division: Option<String>,

    #[validate(range(min = 1, max = 12))]
    pub birth_month: Option<u32>,
    #[validate(range(min = 1900, max = 2100))]
    pub birth_year: Option<i32>,

    pub match_preferences: Option<MatchPreferences>,
}

/// Response for profile updates. "Username unavailable" is a business
/// outcome reported here, not an HTTP error.
#[derive(Serialize)]
pub struct UpdateProfileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileResponse>,
}

/// Create or update the current user's profile.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let now = state.clock.now_rfc3339();

    let mut record = match state.db.get_user(&user.user_id).await? {
        Some(record) => record,
        None => {
            // First save: the role tag decides the profile shape
            let user_type = payload
                .user_type
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("user_type is required".to_string()))?;
            UserRecord::placeholder(&user.user_id, role_for(user_type, &payload)?, &now)
        }
    };

    // Switching role replaces the attribute set with the new shape
    if let Some(user_type) = payload.user_type.as_deref() {
        if user_type != record.role.user_type() {
            record.role = role_for(user_type, &payload)?;
        }
    }

    if let Some(name) = &payload.name {
        record.name = name.trim().to_string();
    }

    apply_attributes(&mut record.role, &payload);

    if let Some(month) = payload.birth_month {
        record.birth_month = Some(month);
    }
    if let Some(year) = payload.birth_year {
        record.birth_year = Some(year);
    }

    if let Some(prefs) = &payload.match_preferences {
        if !matches!(record.role, Role::Athlete(_) | Role::Coach(_)) {
            return Err(AppError::BadRequest(
                "Match preferences are only available to athletes and coaches".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (prefs.min_age, prefs.max_age) {
            if min > max {
                return Err(AppError::BadRequest(
                    "min_age must not exceed max_age".to_string(),
                ));
            }
        }
        record.match_preferences = Some(prefs.clone());
    }

    // Username change goes through the case-insensitive reservation
    if let Some(username) = &payload.username {
        let new_key = profile::username_key(username);
        let old_key = (!record.username.is_empty())
            .then(|| profile::username_key(&record.username));

        if old_key.as_deref() != Some(new_key.as_str()) || *username != record.username {
            let reserved = state
                .db
                .reserve_username(&user.user_id, &new_key, old_key.as_deref())
                .await?;
            if !reserved {
                tracing::debug!(user_id = %user.user_id, username = %username, "Username unavailable");
                return Ok(Json(UpdateProfileResponse {
                    success: false,
                    reason: Some("username_unavailable".to_string()),
                    profile: None,
                }));
            }
            record.username = username.clone();
        }
    }

    record.last_active = now;
    state.db.upsert_user(&record).await?;

    tracing::info!(user_id = %user.user_id, "Profile updated");

    Ok(Json(UpdateProfileResponse {
        success: true,
        reason: None,
        profile: Some(ProfileResponse::from_record(&record)),
    }))
}

fn role_for(user_type: &str, payload: &UpdateProfileRequest) -> Result<Role> {
    match user_type {
        "athlete" => Ok(Role::Athlete(AthleteAttributes::default())),
        "mentor" => Ok(Role::Mentor(AthleteAttributes::default())),
        "coach" => Ok(Role::Coach(CoachAttributes::default())),
        "admin" => Ok(Role::Admin(AdminAttributes {
            admin_role: payload.admin_role.unwrap_or_default(),
            attributes: AthleteAttributes::default(),
        })),
        other => Err(AppError::BadRequest(format!(
            "Unknown user_type: {}",
            other
        ))),
    }
}

fn apply_attributes(role: &mut Role, payload: &UpdateProfileRequest) {
    fn set(field: &mut Option<String>, value: &Option<String>) {
        if let Some(value) = value {
            *field = Some(value.trim().to_string());
        }
    }

    match role {
        Role::Athlete(a) | Role::Mentor(a) => {
            set(&mut a.team, &payload.team);
            set(&mut a.city, &payload.city);
            set(&mut a.position, &payload.position);
            set(&mut a.sport, &payload.sport);
            set(&mut a.height, &payload.height);
            set(&mut a.vertical, &payload.vertical);
            set(&mut a.weight, &payload.weight);
        }
        Role::Admin(admin) => {
            if let Some(admin_role) = payload.admin_role {
                admin.admin_role = admin_role;
            }
            let a = &mut admin.attributes;
            set(&mut a.team, &payload.team);
            set(&mut a.city, &payload.city);
            set(&mut a.position, &payload.position);
            set(&mut a.sport, &payload.sport);
            set(&mut a.height, &payload.height);
            set(&mut a.vertical, &payload.vertical);
            set(&mut a.weight, &payload.weight);
        }
        Role::Coach(c) => {
            set(&mut c.team, &payload.team);
            set(&mut c.city, &payload.city);
            set(&mut c.region, &payload.region);
            set(&mut c.division, &payload.division);
        }
    }
}

// ─── Completeness Gate ───────────────────────────────────────

#[derive(Serialize)]
pub struct CompletenessResponse {
    pub complete: bool,
}

/// Recompute the completeness gate over the latest record snapshot.
/// The UI calls this on every live profile update.
async fn get_completeness(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CompletenessResponse>> {
    let record = state.db.get_user(&user.user_id).await?;
    Ok(Json(CompletenessResponse {
        complete: is_complete(record.as_ref()),
    }))
}

// ─── Matchmaking ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct MatchesResponse {
    pub matches: Vec<MatchSummary>,
}

#[derive(Serialize)]
pub struct MatchSummary {
    pub user_id: String,
    pub username: String,
    pub name: String,
    pub user_type: String,
    pub position: Option<String>,
    pub city: Option<String>,
    pub age: Option<u32>,
    pub score: u32,
}

/// Rank the "ready to match" pool against the current user.
async fn get_matches(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MatchesResponse>> {
    let viewer = require_complete_profile(&state, &user.user_id).await?;

    if !matches!(viewer.role, Role::Athlete(_) | Role::Coach(_)) {
        return Err(AppError::Forbidden(
            "Matchmaking is only available to athletes and coaches".to_string(),
        ));
    }

    let today = state.clock.eastern_date();
    let pool = state.db.get_match_pool(MATCH_POOL_FETCH_LIMIT).await?;

    tracing::debug!(
        user_id = %user.user_id,
        pool_size = pool.len(),
        "Computing matches"
    );

    let matches = compute_matches(&viewer, viewer.match_preferences.as_ref(), today, &pool)
        .into_iter()
        .map(|result| MatchSummary {
            user_id: result.user.id.clone(),
            username: result.user.username.clone(),
            name: result.user.name.clone(),
            user_type: result.user.role.user_type().to_string(),
            position: result.user.role.position().map(String::from),
            city: result.user.role.city().map(String::from),
            age: result.user.age_on(today),
            score: result.score,
        })
        .collect();

    Ok(Json(MatchesResponse { matches }))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    #[serde(default = "default_leaderboard_limit")]
    limit: u32,
}

fn default_leaderboard_limit() -> u32 {
    DEFAULT_LEADERBOARD_SIZE
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub username: String,
    pub name: String,
    pub points: u32,
}

/// Top users by points.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
    if params.limit < 1 {
        return Err(AppError::BadRequest(
            "Limit must be greater than 0".to_string(),
        ));
    }
    let limit = params.limit.min(MAX_LEADERBOARD_SIZE);

    let entries = state
        .db
        .get_leaderboard(limit)
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, record)| LeaderboardEntry {
            rank: i as u32 + 1,
            user_id: record.id,
            username: record.username,
            name: record.name,
            points: record.points,
        })
        .collect();

    Ok(Json(LeaderboardResponse { entries }))
}

// ─── Shared Helpers ──────────────────────────────────────────

/// Load the user's record, requiring it to pass the completeness gate.
pub(crate) async fn require_complete_profile(
    state: &AppState,
    user_id: &str,
) -> Result<UserRecord> {
    let record = state.db.get_user(user_id).await?;
    if !is_complete(record.as_ref()) {
        return Err(AppError::Forbidden(
            "Complete your profile to use this feature".to_string(),
        ));
    }
    // is_complete only passes for present records
    record.ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}
