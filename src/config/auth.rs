use std::{env, fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Duration;
use rand::{rngs::OsRng, RngCore};
use tracing::warn;

use super::{env_flag_enabled, is_production};

const MIN_PRODUCTION_SECRET_LEN: usize = 32;
const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 24 * 60;
const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 365;
const MAX_ACTIVATION_TOKEN_TTL_MINUTES: i64 = 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("Insecure configuration: {0}")]
    Insecure(String),
}

/// Argon2id cost parameters shared by password and activation-code hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Process-wide auth settings, loaded once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub activation_ttl_minutes: i64,
    pub hashing: HashingConfig,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("activation_ttl_minutes", &self.activation_ttl_minutes)
            .field("hashing", &self.hashing)
            .finish()
    }
}

impl AuthConfig {
    /// Default lifetimes: 15 minute access tokens, 7 day refresh tokens, 15 minute codes.
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
            activation_ttl_minutes: 15,
            hashing: HashingConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => decode_secret_bytes(&secret),
            _ if is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            _ => {
                warn!("JWT_SECRET not set; generating ephemeral signing key (development only)");
                let mut bytes = vec![0u8; 64];
                OsRng.fill_bytes(&mut bytes);
                bytes
            }
        };

        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: parse_env("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_env("ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: parse_env("ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        let access_token_ttl = parse_ttl(
            "ACCESS_TOKEN_TTL_MINUTES",
            15,
            MAX_ACCESS_TOKEN_TTL_MINUTES,
            Duration::try_minutes,
        )?;
        let refresh_token_ttl = parse_ttl(
            "REFRESH_TOKEN_TTL_DAYS",
            7,
            MAX_REFRESH_TOKEN_TTL_DAYS,
            Duration::try_days,
        )?;
        if refresh_token_ttl <= access_token_ttl {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_TTL_DAYS",
                value: refresh_token_ttl.num_days().to_string(),
            });
        }

        let activation_ttl_minutes: i64 = parse_env("ACTIVATION_TOKEN_TTL_MINUTES", 15)?;
        if !(1..=MAX_ACTIVATION_TOKEN_TTL_MINUTES).contains(&activation_ttl_minutes) {
            return Err(ConfigError::Invalid {
                key: "ACTIVATION_TOKEN_TTL_MINUTES",
                value: activation_ttl_minutes.to_string(),
            });
        }

        Ok(Self {
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            activation_ttl_minutes,
            hashing,
        })
    }
}

/// Refuses to start a production deployment with a weak signing secret or without HTTPS.
pub fn validate_production_config(config: &AuthConfig) -> Result<(), ConfigError> {
    if !is_production() {
        return Ok(());
    }

    if !env_flag_enabled("FORCE_HTTPS") {
        return Err(ConfigError::Insecure(
            "production requires HTTPS; set FORCE_HTTPS=true".to_string(),
        ));
    }

    if config.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
        return Err(ConfigError::Insecure(format!(
            "JWT_SECRET must be at least {} bytes in production",
            MIN_PRODUCTION_SECRET_LEN
        )));
    }

    let lowered = String::from_utf8_lossy(&config.jwt_secret).to_ascii_lowercase();
    if lowered.contains("example") || lowered.contains("changeme") || lowered.contains("default")
    {
        return Err(ConfigError::Insecure(
            "JWT_SECRET appears to be a default value".to_string(),
        ));
    }

    Ok(())
}

fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

/// Reads a positive lifetime no larger than `max`, in the unit `to_duration` converts from.
fn parse_ttl(
    key: &'static str,
    default: i64,
    max: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    let amount: i64 = parse_env(key, default)?;
    if !(1..=max).contains(&amount) {
        return Err(ConfigError::Invalid {
            key,
            value: amount.to_string(),
        });
    }
    to_duration(amount).ok_or(ConfigError::Invalid {
        key,
        value: amount.to_string(),
    })
}

fn decode_secret_bytes(secret: &str) -> Vec<u8> {
    STANDARD
        .decode(secret.as_bytes())
        .unwrap_or_else(|_| secret.as_bytes().to_vec())
}
