//! User model for storage and API.
//!
//! The same account document carries different required fields depending
//! on `user_type`, so the role is a tagged union rather than a pile of
//! optional fields probed ad hoc.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account ID assigned by the auth provider (also the document ID)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Unique handle, case-insensitive (3-20 chars, alphanumeric + underscore)
    #[serde(default)]
    pub username: String,
    /// Role tag plus role-specific profile attributes
    #[serde(flatten)]
    pub role: Role,
    /// Leaderboard score; never persisted negative
    #[serde(default)]
    pub points: u32,
    /// Single daily-activity snapshot, lazily reset on Eastern date change
    #[serde(default)]
    pub daily_activity: DailyActivity,
    /// Matchmaking preferences (athletes/coaches only)
    #[serde(default)]
    pub match_preferences: Option<MatchPreferences>,
    /// Birth month (1-12), for age-based matching
    #[serde(default)]
    pub birth_month: Option<u32>,
    /// Birth year, for age-based matching
    #[serde(default)]
    pub birth_year: Option<i32>,
    /// When the account was created (RFC3339)
    pub created_at: String,
    /// Last activity timestamp (RFC3339)
    pub last_active: String,
}

/// Role tag with the profile attributes that role carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "user_type", rename_all = "snake_case")]
pub enum Role {
    Athlete(AthleteAttributes),
    Mentor(AthleteAttributes),
    Coach(CoachAttributes),
    Admin(AdminAttributes),
}

/// Profile attributes for athletes, mentors and admins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteAttributes {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Court position (Setter, Outside Hitter, Libero, ...)
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    /// Height, as entered (e.g. "6'1\"")
    #[serde(default)]
    pub height: Option<String>,
    /// Standing vertical, as entered
    #[serde(default)]
    pub vertical: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
}

/// Profile attributes for coaches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachAttributes {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
}

/// Admin accounts carry a sub-role plus the athlete-shaped attribute set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminAttributes {
    #[serde(default)]
    pub admin_role: AdminRole,
    #[serde(flatten)]
    pub attributes: AthleteAttributes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Parent,
    ClubAdmin,
}

/// Per-day activity counters, a single snapshot keyed to the US-Eastern
/// calendar date. Implicitly reset whenever the stored date is not today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    /// Eastern calendar date this snapshot belongs to ("YYYY-MM-DD")
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub highlights_posted: u32,
    #[serde(default)]
    pub comments_given: u32,
    #[serde(default)]
    pub likes_given: u32,
}

/// Matchmaking preferences for athletes and coaches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchPreferences {
    /// Positions this user is looking for; empty means no constraint
    #[serde(default)]
    pub looking_for_position: Vec<String>,
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub preferred_city: Option<String>,
    /// Willingness to appear in the matching pool
    #[serde(default)]
    pub ready_to_match: bool,
}

impl Role {
    pub fn user_type(&self) -> &'static str {
        match self {
            Role::Athlete(_) => "athlete",
            Role::Mentor(_) => "mentor",
            Role::Coach(_) => "coach",
            Role::Admin(_) => "admin",
        }
    }

    /// Court position, where the role has one.
    pub fn position(&self) -> Option<&str> {
        match self {
            Role::Athlete(a) | Role::Mentor(a) => a.position.as_deref(),
            Role::Admin(a) => a.attributes.position.as_deref(),
            Role::Coach(_) => None,
        }
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            Role::Athlete(a) | Role::Mentor(a) => a.city.as_deref(),
            Role::Admin(a) => a.attributes.city.as_deref(),
            Role::Coach(c) => c.city.as_deref(),
        }
    }
}

impl UserRecord {
    /// Placeholder record created on first sign-in; profile forms fill in
    /// the rest before the completeness gate opens.
    pub fn placeholder(id: &str, role: Role, now: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            username: String::new(),
            role,
            points: 0,
            daily_activity: DailyActivity::default(),
            match_preferences: None,
            birth_month: None,
            birth_year: None,
            created_at: now.to_string(),
            last_active: now.to_string(),
        }
    }

    /// Age in whole years on the given civil date, if birth data is set.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let year = self.birth_year?;
        let month = self.birth_month?;
        if !(1..=12).contains(&month) {
            return None;
        }
        let mut age = today.year() - year;
        if today.month() < month {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_counts_birth_month() {
        let mut user = UserRecord::placeholder(
            "u1",
            Role::Athlete(AthleteAttributes::default()),
            "2024-01-01T00:00:00Z",
        );
        user.birth_year = Some(2007);
        user.birth_month = Some(6);

        let before_birthday = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(user.age_on(before_birthday), Some(16));

        let after_birthday = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(user.age_on(after_birthday), Some(17));
    }

    #[test]
    fn test_age_requires_both_fields() {
        let mut user = UserRecord::placeholder(
            "u1",
            Role::Athlete(AthleteAttributes::default()),
            "2024-01-01T00:00:00Z",
        );
        user.birth_year = Some(2007);

        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(user.age_on(today), None);
    }

    #[test]
    fn test_role_round_trips_with_tag() {
        let user = UserRecord::placeholder(
            "u1",
            Role::Coach(CoachAttributes {
                team: Some("Bay Breakers".to_string()),
                city: Some("Oakland".to_string()),
                region: None,
                division: None,
            }),
            "2024-01-01T00:00:00Z",
        );

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_type"], "coach");
        assert_eq!(json["team"], "Bay Breakers");

        let back: UserRecord = serde_json::from_value(json).unwrap();
        assert!(matches!(back.role, Role::Coach(_)));
    }
}
