use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// What an activation code unlocks. Codes for one purpose never verify for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivationPurpose {
    Registration,
    ForgetPassword,
}

impl ActivationPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivationPurpose::Registration => "registration",
            ActivationPurpose::ForgetPassword => "forget-password",
        }
    }
}

impl fmt::Display for ActivationPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown activation purpose: {0}")]
pub struct UnknownPurpose(pub String);

impl FromStr for ActivationPurpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(ActivationPurpose::Registration),
            "forget-password" => Ok(ActivationPurpose::ForgetPassword),
            other => Err(UnknownPurpose(other.to_string())),
        }
    }
}

/// The single stored activation code for an (email, purpose) pair. Only the hash is kept.
#[derive(Debug, Clone)]
pub struct ActivationToken {
    pub email: String,
    pub purpose: ActivationPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl ActivationToken {
    /// Expired or already-used tokens must never verify again.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && now < self.expires_at
    }
}
