use std::{collections::HashMap, env};

use axum::{
    body::Body,
    http::{header, Request},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use retailpro_auth::{
    build_router,
    config::{validate_production_config, AuthConfig, ConfigError, RefreshCookieConfig},
    test_utils::test_helpers::{self, RecordingEmailSender},
};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use tower::ServiceExt;

const AUTH_ENV_KEYS: &[&str] = &[
    "ENVIRONMENT",
    "FORCE_HTTPS",
    "JWT_SECRET",
    "ACCESS_TOKEN_TTL_MINUTES",
    "REFRESH_TOKEN_TTL_DAYS",
    "ACTIVATION_TOKEN_TTL_MINUTES",
    "ARGON2_MEMORY_KIB",
    "ARGON2_ITERATIONS",
    "ARGON2_PARALLELISM",
];

#[derive(Default)]
struct EnvGuard {
    original: HashMap<String, Option<String>>,
}

impl EnvGuard {
    /// Starts from a clean slate for every auth-related variable.
    fn clean() -> Self {
        let mut guard = Self::default();
        for key in AUTH_ENV_KEYS {
            guard.remove(key);
        }
        guard
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::set_var(key, value.into());
    }

    fn remove(&mut self, key: &str) {
        self.original
            .entry(key.to_string())
            .or_insert_with(|| env::var(key).ok());
        env::remove_var(key);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.original.drain() {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }
    }
}

#[test]
#[serial]
fn development_generates_ephemeral_secret() {
    let _env_guard = EnvGuard::clean();

    let first = AuthConfig::from_env().unwrap();
    let second = AuthConfig::from_env().unwrap();

    assert_eq!(first.jwt_secret.len(), 64);
    assert_ne!(first.jwt_secret, second.jwt_secret);
    assert_eq!(first.access_token_ttl, chrono::Duration::minutes(15));
    assert_eq!(first.refresh_token_ttl, chrono::Duration::days(7));
    assert_eq!(first.activation_ttl_minutes, 15);
}

#[test]
#[serial]
fn production_requires_secret() {
    let mut env_guard = EnvGuard::clean();
    env_guard.set("ENVIRONMENT", "production");

    let result = AuthConfig::from_env();
    assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
}

#[test]
#[serial]
fn ttl_overrides_are_applied_and_validated() {
    let mut env_guard = EnvGuard::clean();
    env_guard.set("ACCESS_TOKEN_TTL_MINUTES", "5");
    env_guard.set("REFRESH_TOKEN_TTL_DAYS", "30");
    env_guard.set("ACTIVATION_TOKEN_TTL_MINUTES", "10");

    let config = AuthConfig::from_env().unwrap();
    assert_eq!(config.access_token_ttl, chrono::Duration::minutes(5));
    assert_eq!(config.refresh_token_ttl, chrono::Duration::days(30));
    assert_eq!(config.activation_ttl_minutes, 10);

    env_guard.set("ACCESS_TOKEN_TTL_MINUTES", "0");
    assert!(matches!(
        AuthConfig::from_env(),
        Err(ConfigError::Invalid {
            key: "ACCESS_TOKEN_TTL_MINUTES",
            ..
        })
    ));

    env_guard.set("ACCESS_TOKEN_TTL_MINUTES", "fifteen");
    assert!(AuthConfig::from_env().is_err());
}

#[test]
#[serial]
fn oversized_ttls_are_rejected_at_startup() {
    let mut env_guard = EnvGuard::clean();

    env_guard.set("REFRESH_TOKEN_TTL_DAYS", "100000000");
    assert!(matches!(
        AuthConfig::from_env(),
        Err(ConfigError::Invalid {
            key: "REFRESH_TOKEN_TTL_DAYS",
            ..
        })
    ));

    env_guard.set("REFRESH_TOKEN_TTL_DAYS", i64::MAX.to_string());
    assert!(AuthConfig::from_env().is_err());

    env_guard.set("REFRESH_TOKEN_TTL_DAYS", "365");
    let config = AuthConfig::from_env().unwrap();
    assert_eq!(config.refresh_token_ttl, chrono::Duration::days(365));

    env_guard.set("ACCESS_TOKEN_TTL_MINUTES", "99999999999");
    assert!(matches!(
        AuthConfig::from_env(),
        Err(ConfigError::Invalid {
            key: "ACCESS_TOKEN_TTL_MINUTES",
            ..
        })
    ));
    env_guard.remove("ACCESS_TOKEN_TTL_MINUTES");

    env_guard.set("ACTIVATION_TOKEN_TTL_MINUTES", "9223372036854775807");
    assert!(matches!(
        AuthConfig::from_env(),
        Err(ConfigError::Invalid {
            key: "ACTIVATION_TOKEN_TTL_MINUTES",
            ..
        })
    ));
}

#[test]
#[serial]
fn production_validation_rejects_weak_settings() {
    let mut env_guard = EnvGuard::clean();
    env_guard.set("ENVIRONMENT", "production");
    env_guard.set("JWT_SECRET", STANDARD.encode([42u8; 64]));

    let config = AuthConfig::from_env().unwrap();
    assert!(matches!(
        validate_production_config(&config),
        Err(ConfigError::Insecure(_))
    ));

    env_guard.set("FORCE_HTTPS", "true");
    assert!(validate_production_config(&config).is_ok());

    let short = AuthConfig::new("too-short");
    assert!(validate_production_config(&short).is_err());

    let placeholder = AuthConfig::new("changeme-changeme-changeme-changeme-changeme");
    assert!(validate_production_config(&placeholder).is_err());
}

#[test]
#[serial]
fn development_skips_production_validation() {
    let _env_guard = EnvGuard::clean();

    let short = AuthConfig::new("dev");
    assert!(validate_production_config(&short).is_ok());
}

#[tokio::test]
#[serial]
async fn refresh_cookie_flags_are_secure_in_production() {
    let mut env_guard = EnvGuard::clean();
    env_guard.set("ENVIRONMENT", "production");
    env_guard.set("FORCE_HTTPS", "true");

    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::insert_test_user(&pool, "ann@example.com", "Ann Lee", "s3cretpass")
        .await
        .unwrap();
    let state = test_helpers::build_test_state(
        pool,
        &test_helpers::test_auth_config(),
        Arc::new(RecordingEmailSender::default()),
    );
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "ann@example.com", "password": "s3cretpass" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets the refresh cookie")
        .to_str()
        .unwrap()
        .to_string();

    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/auth"));
}

#[test]
#[serial]
fn refresh_cookie_is_relaxed_in_development() {
    let _env_guard = EnvGuard::clean();

    let config = RefreshCookieConfig::from_env();
    assert!(!config.secure);

    let cookie = config.build("token".to_string(), chrono::Duration::days(7));
    assert!(cookie.http_only().unwrap_or(false));
    assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    assert_eq!(cookie.path(), Some("/auth"));
}
