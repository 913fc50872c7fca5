// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! LockerLink: social networking backend for volleyball athletes and coaches.
//!
//! This crate provides the backend API for profiles, the highlight feed,
//! the points leaderboard, athlete/coach matchmaking, and direct messaging.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use clock::Clock;
use config::Config;
use dashmap::DashMap;
use db::FirestoreDb;
use tokio::sync::Mutex;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub clock: Arc<dyn Clock>,
    /// Per-(highlight, user) locks serializing like toggles from this
    /// instance, so a rapid double-tap cannot race its own transaction.
    pub toggle_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    /// Lock guarding like-toggle for one (highlight, user) pair.
    pub fn toggle_lock(&self, highlight_id: &str, user_id: &str) -> Arc<Mutex<()>> {
        self.toggle_locks
            .entry(format!("{}_{}", highlight_id, user_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
