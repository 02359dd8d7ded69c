use std::env::{self, VarError};

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_MAX_SEARCH_RESULTS: usize = 10;
const DEFAULT_MAX_FIELD_LENGTH: usize = 4096;

/// Represents the application configuration.
#[derive(Debug)]
pub struct Config {
    /// The Telegram bot token.
    pub telegram_bot_token: String,
    /// The URL of the PostGIS database holding `spatial_ref_sys`.
    pub database_url: String,
    /// The directory where export files are written.
    pub output_dir: String,
    /// The maximum number of search results shown to a user.
    pub max_search_results: usize,
    /// The maximum accepted length of a single text field (WKT, proj4) during
    /// export validation.
    pub max_field_length: usize,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    pub fn from_env() -> Result<Self, VarError> {
        Ok(Self {
            telegram_bot_token: env::var("TELOXIDE_TOKEN")?,
            database_url: env::var("DATABASE_URL")?,
            output_dir: env::var("OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
            max_search_results: env::var("MAX_SEARCH_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SEARCH_RESULTS),
            max_field_length: env::var("MAX_FIELD_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_FIELD_LENGTH),
        })
    }
}

#[cfg(test)]
mod tests {
    use temp_env::with_vars;

    use super::*;

    #[test]
    fn test_from_env() {
        with_vars(
            [
                ("TELOXIDE_TOKEN", Some("test telegram bot token")),
                ("DATABASE_URL", Some("postgres://localhost/crs")),
                ("OUTPUT_DIR", Some("/tmp/exports")),
                ("MAX_SEARCH_RESULTS", Some("25")),
                ("MAX_FIELD_LENGTH", Some("2048")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.telegram_bot_token, "test telegram bot token");
                assert_eq!(config.database_url, "postgres://localhost/crs");
                assert_eq!(config.output_dir, "/tmp/exports");
                assert_eq!(config.max_search_results, 25);
                assert_eq!(config.max_field_length, 2048);
            },
        );
    }

    #[test]
    fn test_missing_telegram_bot_token_error() {
        with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/crs")),
                ("TELOXIDE_TOKEN", None),
            ],
            || {
                let config = Config::from_env();
                assert!(config.is_err());
            },
        );
    }

    #[test]
    fn test_missing_database_url_error() {
        with_vars(
            [
                ("TELOXIDE_TOKEN", Some("test telegram bot token")),
                ("DATABASE_URL", None),
            ],
            || {
                let config = Config::from_env();
                assert!(config.is_err());
            },
        );
    }

    #[test]
    fn test_defaults() {
        with_vars(
            [
                ("TELOXIDE_TOKEN", Some("test telegram bot token")),
                ("DATABASE_URL", Some("postgres://localhost/crs")),
                ("OUTPUT_DIR", None),
                ("MAX_SEARCH_RESULTS", None),
                ("MAX_FIELD_LENGTH", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
                assert_eq!(config.max_search_results, DEFAULT_MAX_SEARCH_RESULTS);
                assert_eq!(config.max_field_length, DEFAULT_MAX_FIELD_LENGTH);
            },
        );
    }
}
