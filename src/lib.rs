pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<services::auth_service::AuthService>,
    pub refresh_cookie: config::RefreshCookieConfig,
}

pub fn build_router(app_state: AppState) -> Router {
    auth::auth_routes(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
