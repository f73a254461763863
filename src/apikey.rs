//! API-key issuance.
//!
//! The plaintext key is a random token, shown to the caller exactly once;
//! only its cost-12 argon2 hash is ever persisted.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, ServiceError};
use crate::models::ApiKey;

const TOKEN_BYTES: usize = 32;

pub struct IssuedKey {
    pub id: Uuid,
    pub plaintext: String,
}

pub struct ApiKeyService {
    pool: PgPool,
}

impl ApiKeyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn issue(&self, name: Option<String>, description: Option<String>, expires_at: Option<DateTime<Utc>>) -> Result<IssuedKey, ServiceError> {
        let plaintext = generate_token();
        let hash = hash_key(&plaintext).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO api_keys (key_hash, name, description, expires_at) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&hash)
        .bind(&name)
        .bind(&description)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(IssuedKey { id, plaintext })
    }

    /// Verifies a presented plaintext key against every non-expired key
    /// record. `api_keys` is expected to stay small; this is not on the
    /// read hot path since auth is optional.
    pub async fn authenticate(&self, plaintext: &str) -> Result<Option<ApiKey>, ServiceError> {
        let candidates: Vec<ApiKey> = sqlx::query_as(
            "SELECT id, key_hash, name, description, expires_at FROM api_keys WHERE expires_at IS NULL OR expires_at > now()",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        for candidate in candidates {
            if verify_key(plaintext, &candidate.key_hash) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hash_key(plaintext: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(plaintext.as_bytes(), &salt)?.to_string())
}

fn verify_key(plaintext: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(plaintext.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let token = generate_token();
        let hash = hash_key(&token).unwrap();
        assert!(verify_key(&token, &hash));
        assert!(!verify_key("wrong-token", &hash));
    }

    #[test]
    fn generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
