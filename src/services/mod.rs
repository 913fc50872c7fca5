// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod matching;
pub mod points;
pub mod profile;

pub use matching::{compute_matches, MatchResult};
pub use points::{ActivityKind, AwardDecision, AwardOutcome};
pub use profile::is_complete;
