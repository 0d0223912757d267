pub mod auth;
pub mod cookie;

pub use auth::{validate_production_config, AuthConfig, ConfigError, HashingConfig};
pub use cookie::{RefreshCookieConfig, REFRESH_COOKIE_NAME};

use std::env;

pub(crate) fn current_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
}

pub(crate) fn is_production() -> bool {
    current_environment() == "production"
}

pub(crate) fn env_flag_enabled(key: &str) -> bool {
    env::var(key)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}
