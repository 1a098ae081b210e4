//! Environment configuration, read once at startup.

use std::env;

use tracing::warn;

use crate::database::connection::get_database_url;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Reserved for a future authenticated admin surface.
    pub secret_key: String,
}

impl Config {
    /// Load configuration from the environment, reading a `.env` file if one
    /// is present. A missing `DATABASE_URL` falls back to the local sqlite
    /// file store; a missing `SECRET_KEY` gets a development default. Both
    /// fallbacks are logged.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                let fallback = get_database_url(None);
                warn!("DATABASE_URL is not set, falling back to {}", fallback);
                fallback
            }
        };

        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| {
            warn!("SECRET_KEY is not set, using a development default");
            "dev-secret-key".to_string()
        });

        Self {
            database_url,
            secret_key,
        }
    }
}
