use crate::config::AuthConfig;
use crate::models::{SessionClaims, TokenKind, TokenPair};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

/// Unambiguous characters only (no 0/O, 1/I); 32 symbols so a masked byte maps uniformly.
const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ACTIVATION_CODE_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token is malformed or has an invalid signature")]
    Invalid,
    #[error("Token has expired")]
    Expired,
    #[error("Token was presented for the wrong purpose")]
    WrongType,
    #[error("Token signing failed: {0}")]
    Signing(String),
    #[error("Entropy source failed: {0}")]
    Entropy(String),
}

/// Issues activation codes and signs/parses the stateless session JWTs.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.jwt_secret),
            decoding_key: DecodingKey::from_secret(&config.jwt_secret),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    pub fn generate_activation_code(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; ACTIVATION_CODE_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| TokenError::Entropy(e.to_string()))?;

        Ok(bytes
            .iter()
            .map(|b| CODE_ALPHABET[(b & 31) as usize] as char)
            .collect())
    }

    pub fn issue_session(&self, user_id: &str, email: &str) -> Result<TokenPair, TokenError> {
        let access_token = self.sign(user_id, email, TokenKind::Access, self.access_ttl)?;
        let refresh_token = self.sign(user_id, email, TokenKind::Refresh, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl.num_seconds(),
            refresh_expires_in: self.refresh_ttl.num_seconds(),
        })
    }

    pub fn parse_refresh_claims(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.parse(token, TokenKind::Refresh)
    }

    pub fn parse_access_claims(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.parse(token, TokenKind::Access)
    }

    fn sign(
        &self,
        user_id: &str,
        email: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing(format!("{:?} token lifetime out of range", kind)))?;
        let claims = SessionClaims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            kind,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn parse(&self, token: &str, expected: TokenKind) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            },
        )?;

        if data.claims.kind != expected {
            return Err(TokenError::WrongType);
        }

        Ok(data.claims)
    }
}
