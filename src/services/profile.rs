// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile-completeness gate and username validation.
//!
//! The gate is a pure function over the latest record snapshot. The UI
//! subscribes to live profile updates and recomputes on every change, so
//! this must not cache or error: an absent or partial record is simply
//! incomplete.

use validator::ValidationError;

use crate::models::{Role, UserRecord};

/// Decide whether an account may access gated areas of the product.
///
/// Required always: non-empty `username` and `name`. Coaches additionally
/// need `team` and `city`; every other role needs the full athlete-shaped
/// attribute set.
pub fn is_complete(record: Option<&UserRecord>) -> bool {
    let Some(record) = record else {
        return false;
    };

    if record.username.trim().is_empty() || record.name.trim().is_empty() {
        return false;
    }

    match &record.role {
        Role::Coach(c) => filled(&c.team) && filled(&c.city),
        Role::Athlete(a) | Role::Mentor(a) => athlete_fields_filled(a),
        Role::Admin(a) => athlete_fields_filled(&a.attributes),
    }
}

fn athlete_fields_filled(a: &crate::models::AthleteAttributes) -> bool {
    filled(&a.team)
        && filled(&a.city)
        && filled(&a.position)
        && filled(&a.sport)
        && filled(&a.height)
        && filled(&a.vertical)
        && filled(&a.weight)
}

fn filled(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Username charset rule: 3-20 chars, ASCII alphanumeric or underscore.
///
/// Used as a `validator` custom rule on the profile-update payload.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err(ValidationError::new("username_length"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::new("username_charset"));
    }
    Ok(())
}

/// Usernames are unique case-insensitively; this is the reservation key.
pub fn username_key(username: &str) -> String {
    username.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminAttributes, AthleteAttributes, CoachAttributes};

    fn base_user(role: Role) -> UserRecord {
        let mut user = UserRecord::placeholder("u1", role, "2024-01-01T00:00:00Z");
        user.username = "setter_17".to_string();
        user.name = "Jordan Vega".to_string();
        user
    }

    fn full_athlete_attributes() -> AthleteAttributes {
        AthleteAttributes {
            team: Some("Bay Breakers".to_string()),
            city: Some("Oakland".to_string()),
            position: Some("Setter".to_string()),
            sport: Some("Volleyball".to_string()),
            height: Some("6'1\"".to_string()),
            vertical: Some("28\"".to_string()),
            weight: Some("170".to_string()),
        }
    }

    #[test]
    fn test_absent_record_is_incomplete() {
        assert!(!is_complete(None));
    }

    #[test]
    fn test_coach_missing_city_then_fixed() {
        let mut user = base_user(Role::Coach(CoachAttributes {
            team: Some("Bay Breakers".to_string()),
            city: None,
            region: None,
            division: None,
        }));
        assert!(!is_complete(Some(&user)));

        if let Role::Coach(c) = &mut user.role {
            c.city = Some("Oakland".to_string());
        }
        assert!(is_complete(Some(&user)));
    }

    #[test]
    fn test_athlete_missing_any_field_is_incomplete() {
        let complete = base_user(Role::Athlete(full_athlete_attributes()));
        assert!(is_complete(Some(&complete)));

        let clear: [fn(&mut AthleteAttributes); 7] = [
            |a| a.team = None,
            |a| a.city = None,
            |a| a.position = None,
            |a| a.sport = None,
            |a| a.height = None,
            |a| a.vertical = None,
            |a| a.weight = None,
        ];

        for clear_field in clear {
            let mut attrs = full_athlete_attributes();
            clear_field(&mut attrs);
            let user = base_user(Role::Athlete(attrs));
            assert!(!is_complete(Some(&user)));
        }
    }

    #[test]
    fn test_admin_uses_athlete_shaped_fields() {
        let user = base_user(Role::Admin(AdminAttributes {
            admin_role: crate::models::AdminRole::ClubAdmin,
            attributes: full_athlete_attributes(),
        }));
        assert!(is_complete(Some(&user)));

        let mut incomplete = user.clone();
        if let Role::Admin(a) = &mut incomplete.role {
            a.attributes.vertical = None;
        }
        assert!(!is_complete(Some(&incomplete)));
    }

    #[test]
    fn test_whitespace_fields_do_not_count() {
        let mut attrs = full_athlete_attributes();
        attrs.team = Some("   ".to_string());
        let user = base_user(Role::Athlete(attrs));
        assert!(!is_complete(Some(&user)));
    }

    #[test]
    fn test_missing_username_blocks_every_role() {
        let mut user = base_user(Role::Athlete(full_athlete_attributes()));
        user.username = String::new();
        assert!(!is_complete(Some(&user)));
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("dots.bad").is_err());
        assert!(validate_username("Setter_17").is_ok());
    }

    #[test]
    fn test_username_key_is_case_insensitive() {
        assert_eq!(username_key("Setter_17"), username_key("SETTER_17"));
    }
}
