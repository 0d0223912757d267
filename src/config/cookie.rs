use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Duration;

use super::is_production;

/// The refresh endpoint reads the refresh token from this cookie only.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

#[derive(Debug, Clone)]
pub struct RefreshCookieConfig {
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl RefreshCookieConfig {
    pub fn from_env() -> Self {
        if is_production() {
            RefreshCookieConfig {
                secure: true,
                same_site: SameSite::Strict,
                path: "/auth".to_string(),
            }
        } else {
            RefreshCookieConfig {
                secure: false,
                same_site: SameSite::Lax,
                path: "/auth".to_string(),
            }
        }
    }

    pub fn build(&self, refresh_token: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((REFRESH_COOKIE_NAME, refresh_token))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path(self.path.clone())
            .max_age(time::Duration::seconds(max_age.num_seconds()))
            .build()
    }
}
