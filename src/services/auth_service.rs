use crate::config::AuthConfig;
use crate::error::{AppError, Result};
use crate::models::{ActivationPurpose, SessionClaims, TokenPair, User};
use crate::repositories::{ActivationRepository, RepositoryError, UserRepository};
use crate::services::email_service::EmailSender;
use crate::services::email_templates::activation_email;
use crate::services::hashing_service::{HashError, HashingService};
use crate::services::token_service::TokenService;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").unwrap());

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
const MAX_EMAIL_LEN: usize = 254;
const MAX_FULLNAME_LEN: usize = 100;

pub struct RegisterRequest {
    pub email: String,
    pub fullname: String,
    pub password: String,
    pub password_confirmation: String,
    pub activation_code: String,
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct ResetPasswordRequest {
    pub email: String,
    pub activation_code: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

/// Orchestrates activation codes, accounts and session tokens.
///
/// Holds no mutable state: everything durable lives behind the repositories, and the hashing
/// and signing configuration is fixed at construction.
pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    activation_repository: Arc<dyn ActivationRepository>,
    email_sender: Arc<dyn EmailSender>,
    hasher: HashingService,
    tokens: TokenService,
    activation_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(
        config: &AuthConfig,
        user_repository: Arc<dyn UserRepository>,
        activation_repository: Arc<dyn ActivationRepository>,
        email_sender: Arc<dyn EmailSender>,
    ) -> std::result::Result<Self, HashError> {
        Ok(Self {
            user_repository,
            activation_repository,
            email_sender,
            hasher: HashingService::new(&config.hashing)?,
            tokens: TokenService::new(config),
            activation_ttl_minutes: config.activation_ttl_minutes,
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn validate_email(&self, email: &str) -> Result<()> {
        if email.is_empty() || email.len() > MAX_EMAIL_LEN || !EMAIL_PATTERN.is_match(email) {
            return Err(AppError::bad_request("Invalid email address"));
        }
        Ok(())
    }

    pub fn validate_registration_input(&self, request: &RegisterRequest) -> Result<()> {
        self.validate_email(&normalize_email(&request.email))?;

        let fullname = request.fullname.trim();
        if fullname.is_empty() {
            return Err(AppError::bad_request("Full name is required"));
        }
        if fullname.chars().count() > MAX_FULLNAME_LEN {
            return Err(AppError::bad_request(format!(
                "Full name must be at most {} characters",
                MAX_FULLNAME_LEN
            )));
        }

        self.validate_password_input(&request.password, &request.password_confirmation)
    }

    pub fn validate_password_input(&self, password: &str, confirmation: &str) -> Result<()> {
        if password != confirmation {
            return Err(AppError::bad_request("Passwords do not match"));
        }
        let len = password.chars().count();
        if len < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if len > MAX_PASSWORD_LEN {
            return Err(AppError::bad_request(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    /// Full token-request flow: address check, account precondition, issue, email.
    ///
    /// Registration codes are refused for emails that already own an account; reset codes
    /// are refused for emails that do not.
    pub async fn request_activation(&self, email: &str, purpose: ActivationPurpose) -> Result<()> {
        let email = normalize_email(email);
        self.validate_email(&email)?;

        let existing = self.user_repository.find_by_email(&email).await?;
        match (purpose, existing.is_some()) {
            (ActivationPurpose::Registration, true) => {
                return Err(AppError::conflict("Email already registered"));
            }
            (ActivationPurpose::ForgetPassword, false) => {
                return Err(AppError::not_found("Email is not registered"));
            }
            _ => {}
        }

        let code = self.issue_activation(&email, purpose).await?;

        // The stored code stays valid if delivery fails; a new request overwrites it.
        let message = activation_email(purpose, &email, &code, self.activation_ttl_minutes);
        self.email_sender
            .send(&message.html_body, message.subject, &[email.clone()])
            .await?;

        tracing::info!(email = %email, purpose = %purpose, "Activation code sent");
        Ok(())
    }

    /// Generates, hashes and stores a fresh code, superseding any previous one for the pair.
    /// Returns the plaintext code for delivery; it is not kept anywhere else.
    pub async fn issue_activation(&self, email: &str, purpose: ActivationPurpose) -> Result<String> {
        let code = self.tokens.generate_activation_code()?;
        let code_hash = self.hasher.hash(&code)?;

        self.activation_repository
            .save(email, purpose, &code_hash, self.activation_ttl_minutes)
            .await?;

        Ok(code)
    }

    pub async fn verify_activation(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        candidate_code: &str,
    ) -> Result<()> {
        self.matching_code_hash(email, purpose, candidate_code)
            .await
            .map(|_| ())
    }

    /// Creates the account. No session is issued; the caller logs in separately.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        self.validate_registration_input(&request)?;

        let email = normalize_email(&request.email);
        let purpose = ActivationPurpose::Registration;
        let code_hash = self
            .claim_activation(&email, purpose, &request.activation_code)
            .await?;

        let created = match self.hasher.hash(&request.password) {
            Ok(password_hash) => self
                .user_repository
                .create_user(&email, request.fullname.trim(), &password_hash)
                .await
                .map_err(AppError::from),
            Err(e) => Err(e.into()),
        };

        let user = match created {
            Ok(user) => user,
            Err(e) => {
                self.release_activation(&email, purpose, &code_hash).await;
                return Err(e);
            }
        };

        tracing::info!(user_id = %user.id, email = %user.email, "User registered");
        Ok(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair> {
        let email = normalize_email(&request.email);

        let user = self
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_login)?;

        self.hasher
            .verify(&user.password_hash, &request.password)
            .map_err(|e| match e {
                HashError::Mismatch => invalid_login(),
                other => other.into(),
            })?;

        let pair = self.tokens.issue_session(&user.id, &user.email)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(pair)
    }

    /// Exchanges a refresh token for a new pair. The old refresh token stays valid until it
    /// expires.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.tokens.parse_refresh_claims(refresh_token).map_err(|e| {
            tracing::debug!(error = %e, "Refresh token rejected");
            AppError::from(e)
        })?;

        Ok(self.tokens.issue_session(&claims.user_id, &claims.email)?)
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        self.validate_password_input(&request.new_password, &request.new_password_confirmation)?;

        let email = normalize_email(&request.email);
        let purpose = ActivationPurpose::ForgetPassword;
        let code_hash = self
            .claim_activation(&email, purpose, &request.activation_code)
            .await?;

        let updated = match self.hasher.hash(&request.new_password) {
            Ok(password_hash) => match self
                .user_repository
                .update_password(&email, &password_hash)
                .await
            {
                Ok(()) => Ok(()),
                Err(RepositoryError::NotFound) => Err(AppError::not_found("Email is not registered")),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        };

        if let Err(e) = updated {
            self.release_activation(&email, purpose, &code_hash).await;
            return Err(e);
        }

        tracing::info!(email = %email, "Password reset");
        Ok(())
    }

    pub fn authenticate_access(&self, access_token: &str) -> Result<SessionClaims> {
        Ok(self.tokens.parse_access_claims(access_token)?)
    }

    /// Checks the candidate against the live stored code and returns the stored hash.
    async fn matching_code_hash(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        candidate_code: &str,
    ) -> Result<String> {
        let token = match self.activation_repository.get(email, purpose).await {
            Ok(token) => token,
            Err(RepositoryError::NotFound) => return Err(activation_missing()),
            Err(e) => return Err(e.into()),
        };

        if !token.is_live(Utc::now()) {
            return Err(activation_missing());
        }

        let candidate = candidate_code.trim().to_ascii_uppercase();
        self.hasher
            .verify(&token.code_hash, &candidate)
            .map_err(|e| match e {
                HashError::Mismatch => AppError::unauthorized("Invalid activation code"),
                other => other.into(),
            })?;

        Ok(token.code_hash)
    }

    // Verification is a read; the conditional update in `consume` is what makes a code
    // single-use when two requests race on it.
    async fn claim_activation(
        &self,
        email: &str,
        purpose: ActivationPurpose,
        candidate_code: &str,
    ) -> Result<String> {
        let code_hash = self
            .matching_code_hash(email, purpose, candidate_code)
            .await?;

        match self
            .activation_repository
            .consume(email, purpose, &code_hash)
            .await
        {
            Ok(()) => Ok(code_hash),
            Err(RepositoryError::NotFound) => Err(activation_missing()),
            Err(e) => Err(e.into()),
        }
    }

    // The account change failed after the code was claimed; hand the code back so the user
    // can retry with it.
    async fn release_activation(&self, email: &str, purpose: ActivationPurpose, code_hash: &str) {
        if let Err(e) = self
            .activation_repository
            .release(email, purpose, code_hash)
            .await
        {
            tracing::warn!(email = %email, purpose = %purpose, error = %e, "Failed to release activation code");
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn activation_missing() -> AppError {
    AppError::not_found("Activation code not found or expired")
}

fn invalid_login() -> AppError {
    AppError::unauthorized("Invalid email or password")
}
