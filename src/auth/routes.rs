use crate::auth::{handlers, middleware::require_access_token};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn auth_routes(app_state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::me_handler))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            require_access_token,
        ));

    Router::new()
        .route("/auth/token/{type}", post(handlers::request_token_handler))
        .route("/auth/register", post(handlers::register_handler))
        .route("/auth/login", post(handlers::login_handler))
        .route(
            "/auth/forget-password",
            post(handlers::forget_password_handler),
        )
        .route("/auth/refresh-token", get(handlers::refresh_token_handler))
        .merge(protected_routes)
}
