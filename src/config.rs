//! Application configuration loaded from environment variables.
//!
//! Point values and daily caps are configuration, not constants: product
//! has tuned them before and will again.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Point award values and daily caps
    pub points: PointsConfig,
}

/// Point values and per-day caps for score-granting actions.
#[derive(Debug, Clone)]
pub struct PointsConfig {
    /// Points awarded for posting a highlight
    pub highlight_points: u32,
    /// Max highlight posts that earn points per Eastern calendar day
    pub highlight_daily_max: u32,
    /// Points awarded to the liker and to the liked content's owner
    pub like_points: u32,
    /// Points awarded to the commenter and to the content's owner
    pub comment_points: u32,
    /// Max comments that earn points per Eastern calendar day
    pub comment_daily_max: u32,
    /// Minimum trimmed comment length to qualify for points
    pub min_comment_chars: usize,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            highlight_points: 10,
            highlight_daily_max: 2,
            like_points: 2,
            comment_points: 5,
            comment_daily_max: 5,
            min_comment_chars: 15,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, secrets can be set in a `.env` file. In
    /// production, Cloud Run injects them via secret bindings.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = PointsConfig::default();

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            points: PointsConfig {
                highlight_points: env_u32("POINTS_HIGHLIGHT", defaults.highlight_points),
                highlight_daily_max: env_u32(
                    "POINTS_HIGHLIGHT_DAILY_MAX",
                    defaults.highlight_daily_max,
                ),
                like_points: env_u32("POINTS_LIKE", defaults.like_points),
                comment_points: env_u32("POINTS_COMMENT", defaults.comment_points),
                comment_daily_max: env_u32("POINTS_COMMENT_DAILY_MAX", defaults.comment_daily_max),
                min_comment_chars: env_u32("POINTS_MIN_COMMENT_CHARS", 15) as usize,
            },
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            points: PointsConfig::default(),
        }
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("POINTS_HIGHLIGHT_DAILY_MAX", "3");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.points.highlight_daily_max, 3);
        assert_eq!(config.points.comment_points, 5);

        env::remove_var("POINTS_HIGHLIGHT_DAILY_MAX");
    }

    #[test]
    fn test_points_defaults() {
        let points = PointsConfig::default();
        assert_eq!(points.highlight_points, 10);
        assert_eq!(points.highlight_daily_max, 2);
        assert_eq!(points.like_points, 2);
        assert_eq!(points.comment_points, 5);
        assert_eq!(points.comment_daily_max, 5);
        assert_eq!(points.min_comment_chars, 15);
    }
}
