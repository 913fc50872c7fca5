// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Matchmaking heuristic: rank "ready to match" candidates against the
//! viewer's preferences and profile.
//!
//! Scoring is symmetric and mutually gated: position and age are checked
//! in both directions and either side can reject, while a one-sided
//! missing criterion is treated as "no constraint" and simply skipped.
//! That asymmetry is long-standing product behavior; the seeded fixtures
//! below depend on it literally, so do not "fix" it here.

use chrono::NaiveDate;

use crate::models::{MatchPreferences, UserRecord};

const POSITION_POINTS: u32 = 30;
const AGE_POINTS: u32 = 20;
const CITY_BONUS: u32 = 20;

/// A kept candidate with its compatibility score.
#[derive(Debug)]
pub struct MatchResult<'a> {
    pub user: &'a UserRecord,
    pub score: u32,
}

/// Rank the candidate pool for a viewer.
///
/// Filters to candidates with `ready_to_match` set (excluding the viewer),
/// scores each pairing, drops rejected or zero-score candidates, and
/// returns the rest ordered by score descending. Ties keep input order.
pub fn compute_matches<'a>(
    viewer: &UserRecord,
    viewer_prefs: Option<&MatchPreferences>,
    today: NaiveDate,
    pool: &'a [UserRecord],
) -> Vec<MatchResult<'a>> {
    let mut results: Vec<MatchResult<'a>> = pool
        .iter()
        .filter(|candidate| candidate.id != viewer.id)
        .filter(|candidate| {
            candidate
                .match_preferences
                .as_ref()
                .is_some_and(|p| p.ready_to_match)
        })
        .filter_map(|candidate| {
            score_pairing(viewer, viewer_prefs, candidate, today)
                .map(|score| MatchResult { user: candidate, score })
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

/// Score one viewer/candidate pairing. `None` means rejected.
fn score_pairing(
    viewer: &UserRecord,
    viewer_prefs: Option<&MatchPreferences>,
    candidate: &UserRecord,
    today: NaiveDate,
) -> Option<u32> {
    let candidate_prefs = candidate.match_preferences.as_ref();
    let mut score = 0;

    // Candidate's wanted positions vs viewer's position
    if let (Some(prefs), Some(position)) = (candidate_prefs, viewer.role.position()) {
        if !prefs.looking_for_position.is_empty() {
            if prefs.looking_for_position.iter().any(|p| p == position) {
                score += POSITION_POINTS;
            } else {
                return None;
            }
        }
    }

    // Viewer's wanted positions vs candidate's position
    if let (Some(prefs), Some(position)) = (viewer_prefs, candidate.role.position()) {
        if !prefs.looking_for_position.is_empty() {
            if prefs.looking_for_position.iter().any(|p| p == position) {
                score += POSITION_POINTS;
            } else {
                return None;
            }
        }
    }

    // Candidate's age range vs viewer's age
    if let Some(prefs) = candidate_prefs {
        if let (Some(min), Some(max), Some(age)) =
            (prefs.min_age, prefs.max_age, viewer.age_on(today))
        {
            if (min..=max).contains(&age) {
                score += AGE_POINTS;
            } else {
                return None;
            }
        }
    }

    // Viewer's age range vs candidate's age
    if let Some(prefs) = viewer_prefs {
        if let (Some(min), Some(max), Some(age)) =
            (prefs.min_age, prefs.max_age, candidate.age_on(today))
        {
            if (min..=max).contains(&age) {
                score += AGE_POINTS;
            } else {
                return None;
            }
        }
    }

    // Preferred city: bonus only, never rejects
    if let Some(prefs) = viewer_prefs {
        if let (Some(wanted), Some(city)) = (prefs.preferred_city.as_deref(), candidate.role.city())
        {
            if wanted.eq_ignore_ascii_case(city) {
                score += CITY_BONUS;
            }
        }
    }

    (score > 0).then_some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AthleteAttributes, Role};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    fn athlete(id: &str, position: Option<&str>, age: Option<u32>) -> UserRecord {
        let mut user = UserRecord::placeholder(
            id,
            Role::Athlete(AthleteAttributes {
                position: position.map(String::from),
                city: Some("Oakland".to_string()),
                ..Default::default()
            }),
            "2024-01-01T00:00:00Z",
        );
        user.username = id.to_string();
        user.name = id.to_string();
        if let Some(age) = age {
            // Birth month of January: age is exact all year
            user.birth_year = Some(2024 - age as i32);
            user.birth_month = Some(1);
        }
        user
    }

    fn prefs(positions: &[&str], min_age: Option<u32>, max_age: Option<u32>) -> MatchPreferences {
        MatchPreferences {
            looking_for_position: positions.iter().map(|p| p.to_string()).collect(),
            min_age,
            max_age,
            preferred_city: None,
            ready_to_match: true,
        }
    }

    #[test]
    fn test_mutual_match_scores_100() {
        let viewer = athlete("self", Some("Setter"), Some(17));
        let viewer_prefs = prefs(&["Outside Hitter"], Some(15), Some(19));

        let mut candidate = athlete("a", Some("Outside Hitter"), Some(17));
        candidate.match_preferences = Some(prefs(&["Setter"], Some(16), Some(20)));

        let pool = vec![candidate];
        let results = compute_matches(&viewer, Some(&viewer_prefs), today(), &pool);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 100); // 30 + 30 + 20 + 20, no city bonus
    }

    #[test]
    fn test_candidate_not_wanting_viewer_position_is_rejected() {
        let viewer = athlete("self", Some("Setter"), Some(17));
        let viewer_prefs = prefs(&["Outside Hitter"], Some(15), Some(19));

        let mut candidate = athlete("b", Some("Outside Hitter"), Some(17));
        candidate.match_preferences = Some(prefs(&["Libero"], Some(16), Some(20)));

        let pool = vec![candidate];
        let results = compute_matches(&viewer, Some(&viewer_prefs), today(), &pool);
        assert!(results.is_empty());
    }

    #[test]
    fn test_not_ready_candidates_are_filtered() {
        let viewer = athlete("self", Some("Setter"), Some(17));

        let mut candidate = athlete("a", Some("Outside Hitter"), Some(17));
        let mut p = prefs(&["Setter"], None, None);
        p.ready_to_match = false;
        candidate.match_preferences = Some(p);

        let pool = vec![candidate];
        let results = compute_matches(&viewer, None, today(), &pool);
        assert!(results.is_empty());
    }

    #[test]
    fn test_viewer_is_excluded_from_pool() {
        let mut viewer = athlete("self", Some("Setter"), Some(17));
        viewer.match_preferences = Some(prefs(&["Setter"], None, None));

        let pool = vec![viewer.clone()];
        let results = compute_matches(&viewer, viewer.match_preferences.as_ref(), today(), &pool);
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_criterion_is_no_constraint() {
        // Candidate wants Setters but the viewer never set a position:
        // the criterion is skipped, not a rejection.
        let viewer = athlete("self", None, Some(17));

        let mut candidate = athlete("a", Some("Outside Hitter"), Some(17));
        candidate.match_preferences = Some(prefs(&["Setter"], Some(16), Some(20)));

        let pool = vec![candidate];
        let results = compute_matches(&viewer, None, today(), &pool);

        // Only the candidate's age gate fires: +20
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 20);
    }

    #[test]
    fn test_partial_age_range_is_no_constraint() {
        // min without max is not "fully specified", so no gate and no points
        let viewer = athlete("self", Some("Setter"), Some(40));

        let mut candidate = athlete("a", Some("Outside Hitter"), Some(17));
        candidate.match_preferences = Some(prefs(&["Setter"], Some(15), None));

        let pool = vec![candidate];
        let results = compute_matches(&viewer, None, today(), &pool);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 30);
    }

    #[test]
    fn test_age_range_is_inclusive() {
        let viewer = athlete("self", None, Some(19));

        let mut candidate = athlete("a", None, Some(17));
        candidate.match_preferences = Some(prefs(&[], Some(15), Some(19)));

        let pool = vec![candidate];
        let results = compute_matches(&viewer, None, today(), &pool);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 20);
    }

    #[test]
    fn test_age_outside_range_rejects() {
        let viewer = athlete("self", None, Some(22));

        let mut candidate = athlete("a", None, Some(17));
        candidate.match_preferences = Some(prefs(&[], Some(15), Some(19)));

        let pool = vec![candidate];
        assert!(compute_matches(&viewer, None, today(), &pool).is_empty());
    }

    #[test]
    fn test_city_bonus_is_case_insensitive_and_never_rejects() {
        let viewer = athlete("self", None, Some(17));
        let mut viewer_prefs = prefs(&[], None, None);
        viewer_prefs.preferred_city = Some("OAKLAND".to_string());

        let mut near = athlete("near", None, Some(17));
        near.match_preferences = Some(prefs(&[], Some(15), Some(19)));

        let mut far = athlete("far", None, Some(17));
        if let Role::Athlete(a) = &mut far.role {
            a.city = Some("Denver".to_string());
        }
        far.match_preferences = Some(prefs(&[], Some(15), Some(19)));

        let pool = vec![near, far];
        let results = compute_matches(&viewer, Some(&viewer_prefs), today(), &pool);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].user.id, "near");
        assert_eq!(results[0].score, 40); // 20 age + 20 city
        assert_eq!(results[1].user.id, "far");
        assert_eq!(results[1].score, 20); // city mismatch only loses the bonus
    }

    #[test]
    fn test_zero_score_candidates_are_dropped() {
        // No criteria on either side: nothing scores, nothing matches
        let viewer = athlete("self", None, None);

        let mut candidate = athlete("a", None, None);
        candidate.match_preferences = Some(prefs(&[], None, None));

        let pool = vec![candidate];
        assert!(compute_matches(&viewer, None, today(), &pool).is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let viewer = athlete("self", None, Some(17));

        let mut first = athlete("first", None, Some(17));
        first.match_preferences = Some(prefs(&[], Some(15), Some(19)));
        let mut second = athlete("second", None, Some(17));
        second.match_preferences = Some(prefs(&[], Some(15), Some(19)));

        let pool = vec![first, second];
        let results = compute_matches(&viewer, None, today(), &pool);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].user.id, "first");
        assert_eq!(results[1].user.id, "second");
    }
}
