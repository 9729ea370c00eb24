use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::config::PasswordConfig;

/// Argon2id hasher with a configurable work factor.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a random throwaway password, built with the same params. Logins for
    /// unknown emails verify against it so both failure paths cost one Argon2 run.
    decoy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(config: PasswordConfig) -> Result<Self, String> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| format!("Invalid params: {e}"))?;
        let throwaway = SaltString::generate(&mut OsRng);
        let decoy_hash = Arc::from(hash_with(&params, throwaway.as_str())?);
        Ok(Self { params, decoy_hash })
    }

    pub fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }

    /// Hash a password with a fresh random salt. Output is a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, String> {
        hash_with(&self.params, password)
    }

    /// Verify a password against a stored hash, using the parameters encoded in the hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, String> {
        let parsed = PasswordHash::new(hash).map_err(|e| format!("Invalid hash: {e}"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}
