use crate::config::HashingConfig;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, PasswordVerifier, Version,
};

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Secret does not match")]
    Mismatch,
    #[error("Hashing failed: {0}")]
    Hashing(String),
}

/// Salted Argon2id hashing for passwords and activation codes alike.
#[derive(Clone)]
pub struct HashingService {
    argon2: Argon2<'static>,
}

impl HashingService {
    pub fn new(config: &HashingConfig) -> Result<Self, HashError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| HashError::Hashing(format!("invalid argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Returns a PHC string; a fresh salt makes every call produce a different digest.
    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    pub fn verify(&self, hashed: &str, candidate: &str) -> Result<(), HashError> {
        let parsed_hash = match PasswordHash::new(hashed) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(HashError::Hashing(format!(
                    "stored hash is not a valid PHC string: {}",
                    e
                )))
            }
        };

        self.argon2
            .verify_password(candidate.as_bytes(), &parsed_hash)
            .map_err(|_| HashError::Mismatch)
    }
}
