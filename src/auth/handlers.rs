use crate::auth::models::{
    CurrentUser, DataResponse, ForgetPasswordPayload, JwtResponseData, LoginPayload,
    MessageResponse, RegisterPayload, TokenPayload,
};
use crate::config::REFRESH_COOKIE_NAME;
use crate::error::AppError;
use crate::models::{ActivationPurpose, SessionClaims, TokenPair};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Duration;

pub async fn request_token_handler(
    State(app_state): State<AppState>,
    Path(token_type): Path<String>,
    payload: Result<Json<TokenPayload>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    // Checked before the body so an unknown type never reaches the domain
    let purpose = token_type
        .parse::<ActivationPurpose>()
        .map_err(|_| AppError::bad_request("Invalid token type"))?;
    let Json(payload) = payload?;

    app_state
        .auth_service
        .request_activation(&payload.email, purpose)
        .await?;

    Ok(Json(MessageResponse::new(
        "Activation code has been sent to your email",
    )))
}

pub async fn register_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let Json(payload) = payload?;

    app_state.auth_service.register(payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful, please log in")),
    ))
}

pub async fn login_handler(
    State(app_state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;

    let pair = app_state.auth_service.login(payload.into()).await?;

    Ok(session_response(&app_state, jar, &pair, "Login successful"))
}

pub async fn forget_password_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<ForgetPasswordPayload>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload?;

    app_state.auth_service.reset_password(payload.into()).await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Reads the refresh token from the `refresh_token` cookie, never from the body.
pub async fn refresh_token_handler(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let refresh_token = jar
        .get(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("Refresh token not found in cookies"))?;

    let pair = app_state.auth_service.refresh(&refresh_token).await?;

    Ok(session_response(
        &app_state,
        jar,
        &pair,
        "Token refreshed successfully",
    ))
}

pub async fn me_handler(
    Extension(claims): Extension<SessionClaims>,
) -> Json<DataResponse<CurrentUser>> {
    Json(DataResponse {
        message: "Authenticated".to_string(),
        data: CurrentUser {
            user_id: claims.user_id,
            email: claims.email,
        },
    })
}

fn session_response(
    app_state: &AppState,
    jar: CookieJar,
    pair: &TokenPair,
    message: &str,
) -> Response {
    let cookie = app_state.refresh_cookie.build(
        pair.refresh_token.clone(),
        Duration::seconds(pair.refresh_expires_in),
    );

    let body = DataResponse {
        message: message.to_string(),
        data: JwtResponseData::from(pair),
    };

    (jar.add(cookie), Json(body)).into_response()
}
