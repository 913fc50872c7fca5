// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod chats;
pub mod feed;
pub mod highlights;

use crate::middleware::auth::require_auth;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_check));

    // Protected routes (auth required)
    let protected_routes = api::routes()
        .merge(highlights::routes())
        .merge(feed::routes())
        .merge(chats::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// ─── Pagination Cursors ──────────────────────────────────────

/// Opaque forward-pagination cursor over (sort key, document id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// RFC3339 timestamp of the last item on the previous page
    pub sort_key: String,
    /// Document ID of the last item on the previous page
    pub doc_id: String,
}

pub fn encode_cursor(cursor: &PageCursor) -> String {
    // RFC3339 contains ':' so the separator must be something else
    let payload = format!("{}|{}", cursor.sort_key, cursor.doc_id);
    URL_SAFE_NO_PAD.encode(payload)
}

pub fn parse_cursor(cursor: Option<&str>) -> crate::error::Result<Option<PageCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || crate::error::AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let (sort_key, doc_id) = decoded_str.split_once('|').ok_or_else(invalid_cursor)?;
            if sort_key.is_empty() || doc_id.is_empty() {
                return Err(invalid_cursor());
            }
            chrono::DateTime::parse_from_rfc3339(sort_key).map_err(|_| invalid_cursor())?;

            Ok(PageCursor {
                sort_key: sort_key.to_string(),
                doc_id: doc_id.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let cursor = PageCursor {
            sort_key: "2024-01-15T10:30:00Z".to_string(),
            doc_id: "post_42".to_string(),
        };

        let encoded = encode_cursor(&cursor);
        let decoded = parse_cursor(Some(&encoded)).unwrap().unwrap();

        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_cursor_rejects_invalid_input() {
        let err = parse_cursor(Some("not-base64!")).unwrap_err();
        assert!(matches!(err, crate::error::AppError::BadRequest(_)));

        let bogus_date = URL_SAFE_NO_PAD.encode("yesterday|post_42");
        let err = parse_cursor(Some(&bogus_date)).unwrap_err();
        assert!(matches!(err, crate::error::AppError::BadRequest(_)));
    }

    #[test]
    fn test_absent_cursor_is_none() {
        assert!(parse_cursor(None).unwrap().is_none());
    }
}
