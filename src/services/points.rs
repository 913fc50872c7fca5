// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Points accrual: pure decision logic over a `(points, daily_activity)`
//! snapshot.
//!
//! The functions here never touch the store. The db layer reads the user
//! inside a Firestore transaction, applies a decision, and commits the
//! resulting fields together, so concurrent actions from multiple devices
//! cannot lose updates. "Limit reached" is an expected outcome, not an
//! error.

use serde::Serialize;

use crate::models::{DailyActivity, UserRecord};

/// Score-granting action types with per-day counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    HighlightPosted,
    CommentGiven,
    LikeGiven,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::HighlightPosted => "highlight_posted",
            ActivityKind::CommentGiven => "comment_given",
            ActivityKind::LikeGiven => "like_given",
        }
    }

    fn count(&self, activity: &DailyActivity) -> u32 {
        match self {
            ActivityKind::HighlightPosted => activity.highlights_posted,
            ActivityKind::CommentGiven => activity.comments_given,
            ActivityKind::LikeGiven => activity.likes_given,
        }
    }

    fn increment(&self, activity: &mut DailyActivity) {
        match self {
            ActivityKind::HighlightPosted => activity.highlights_posted += 1,
            ActivityKind::CommentGiven => activity.comments_given += 1,
            ActivityKind::LikeGiven => activity.likes_given += 1,
        }
    }
}

/// Outcome of an award attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AwardOutcome {
    Awarded {
        points_awarded: u32,
        new_total: u32,
    },
    /// Daily cap hit: nothing was mutated.
    LimitReached {
        activity: ActivityKind,
        max_daily: u32,
    },
}

impl AwardOutcome {
    pub fn is_awarded(&self) -> bool {
        matches!(self, AwardOutcome::Awarded { .. })
    }
}

/// Fields to persist after an award decision, applied in one write.
#[derive(Debug)]
pub struct AwardDecision {
    pub outcome: AwardOutcome,
    pub points: u32,
    pub daily_activity: DailyActivity,
}

/// The stored activity snapshot, rolled over to `today` if it is stale.
///
/// This is the lazy reset: there is no scheduled job, the first read on a
/// new Eastern calendar day zeroes the counters.
pub fn rolled_activity(activity: &DailyActivity, today: &str) -> DailyActivity {
    if activity.date == today {
        activity.clone()
    } else {
        DailyActivity {
            date: today.to_string(),
            ..DailyActivity::default()
        }
    }
}

/// Decide an award against the user's current snapshot.
///
/// `limit` caps the day's count for `kind`; `None` means uncapped (the
/// counter is still incremented for reporting).
pub fn decide_award(
    record: &UserRecord,
    amount: u32,
    kind: ActivityKind,
    limit: Option<u32>,
    today: &str,
) -> AwardDecision {
    let mut activity = rolled_activity(&record.daily_activity, today);

    if let Some(max_daily) = limit {
        if kind.count(&activity) >= max_daily {
            return AwardDecision {
                outcome: AwardOutcome::LimitReached {
                    activity: kind,
                    max_daily,
                },
                points: record.points,
                daily_activity: record.daily_activity.clone(),
            };
        }
    }

    kind.increment(&mut activity);
    // Saturating on both sides: deduction clamps at zero, accrual at max
    let new_total = record.points.saturating_add(amount);

    AwardDecision {
        outcome: AwardOutcome::Awarded {
            points_awarded: amount,
            new_total,
        },
        points: new_total,
        daily_activity: activity,
    }
}

/// Deduct points, clamped at zero; never persists negative.
pub fn deduct(points: u32, amount: u32) -> u32 {
    points.saturating_sub(amount)
}

/// Whether a comment qualifies for points: trimmed length at or above the
/// configured minimum. A caller-side precondition, not enforced by the
/// accrual path itself.
pub fn comment_qualifies(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AthleteAttributes, Role};

    const TODAY: &str = "2024-09-01";
    const YESTERDAY: &str = "2024-08-31";

    fn user_with(points: u32, activity: DailyActivity) -> UserRecord {
        let mut user = UserRecord::placeholder(
            "u1",
            Role::Athlete(AthleteAttributes::default()),
            "2024-01-01T00:00:00Z",
        );
        user.points = points;
        user.daily_activity = activity;
        user
    }

    #[test]
    fn test_highlight_cap_two_per_day() {
        let mut user = user_with(0, DailyActivity::default());

        for expected_total in [10, 20] {
            let decision =
                decide_award(&user, 10, ActivityKind::HighlightPosted, Some(2), TODAY);
            assert!(decision.outcome.is_awarded());
            assert_eq!(decision.points, expected_total);
            user.points = decision.points;
            user.daily_activity = decision.daily_activity;
        }
        assert_eq!(user.daily_activity.highlights_posted, 2);

        // Third attempt the same day: rejected, nothing changes
        let decision = decide_award(&user, 10, ActivityKind::HighlightPosted, Some(2), TODAY);
        match decision.outcome {
            AwardOutcome::LimitReached {
                activity,
                max_daily,
            } => {
                assert_eq!(activity, ActivityKind::HighlightPosted);
                assert_eq!(max_daily, 2);
            }
            AwardOutcome::Awarded { .. } => panic!("third highlight should hit the cap"),
        }
        assert_eq!(decision.points, 20);
        assert_eq!(decision.daily_activity.highlights_posted, 2);
    }

    #[test]
    fn test_stale_snapshot_resets_before_limit_check() {
        let user = user_with(
            20,
            DailyActivity {
                date: YESTERDAY.to_string(),
                highlights_posted: 2,
                comments_given: 5,
                likes_given: 9,
            },
        );

        // Yesterday's counters do not count against today's cap
        let decision = decide_award(&user, 10, ActivityKind::HighlightPosted, Some(2), TODAY);
        assert!(decision.outcome.is_awarded());
        assert_eq!(decision.daily_activity.date, TODAY);
        assert_eq!(decision.daily_activity.highlights_posted, 1);
        assert_eq!(decision.daily_activity.comments_given, 0);
        assert_eq!(decision.daily_activity.likes_given, 0);
        assert_eq!(decision.points, 30);
    }

    #[test]
    fn test_rollover_does_not_touch_points() {
        let activity = DailyActivity {
            date: YESTERDAY.to_string(),
            highlights_posted: 1,
            comments_given: 2,
            likes_given: 3,
        };
        let rolled = rolled_activity(&activity, TODAY);
        assert_eq!(
            rolled,
            DailyActivity {
                date: TODAY.to_string(),
                highlights_posted: 0,
                comments_given: 0,
                likes_given: 0,
            }
        );

        // Same-day snapshot passes through untouched
        let same = rolled_activity(&rolled, TODAY);
        assert_eq!(same, rolled);
    }

    #[test]
    fn test_uncapped_awards_still_count() {
        let user = user_with(0, DailyActivity::default());
        let decision = decide_award(&user, 2, ActivityKind::LikeGiven, None, TODAY);
        assert!(decision.outcome.is_awarded());
        assert_eq!(decision.daily_activity.likes_given, 1);
        assert_eq!(decision.points, 2);
    }

    #[test]
    fn test_award_saturates_at_max() {
        let user = user_with(u32::MAX - 1, DailyActivity::default());
        let decision = decide_award(&user, 10, ActivityKind::LikeGiven, None, TODAY);
        assert!(decision.outcome.is_awarded());
        assert_eq!(decision.points, u32::MAX);
    }

    #[test]
    fn test_deduction_floors_at_zero() {
        assert_eq!(deduct(3, 10), 0);
        assert_eq!(deduct(10, 3), 7);
        assert_eq!(deduct(0, 5), 0);
    }

    #[test]
    fn test_comment_length_gate() {
        assert!(!comment_qualifies("short", 15));
        assert!(comment_qualifies("this is long enough", 15));
        // Whitespace padding does not help
        assert!(!comment_qualifies("   short        ", 15));
        // Exactly at the minimum qualifies
        assert!(comment_qualifies("123456789012345", 15));
    }
}
