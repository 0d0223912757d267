//! Request and response bodies for the auth endpoints.

use serde::{Deserialize, Serialize};

use crate::models::TokenPair;
use crate::services::{LoginRequest, RegisterRequest, ResetPasswordRequest};

#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub fullname: String,
    pub password: String,
    pub password_confirmation: String,
    pub activation_code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgetPasswordPayload {
    pub email: String,
    pub activation_code: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

impl From<RegisterPayload> for RegisterRequest {
    fn from(payload: RegisterPayload) -> Self {
        RegisterRequest {
            email: payload.email,
            fullname: payload.fullname,
            password: payload.password,
            password_confirmation: payload.password_confirmation,
            activation_code: payload.activation_code,
        }
    }
}

impl From<LoginPayload> for LoginRequest {
    fn from(payload: LoginPayload) -> Self {
        LoginRequest {
            email: payload.email,
            password: payload.password,
        }
    }
}

impl From<ForgetPasswordPayload> for ResetPasswordRequest {
    fn from(payload: ForgetPasswordPayload) -> Self {
        ResetPasswordRequest {
            email: payload.email,
            activation_code: payload.activation_code,
            new_password: payload.new_password,
            new_password_confirmation: payload.new_password_confirmation,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtResponseData {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<&TokenPair> for JwtResponseData {
    fn from(pair: &TokenPair) -> Self {
        JwtResponseData {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: pair.expires_in,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: String,
}
