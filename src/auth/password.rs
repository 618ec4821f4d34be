use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{ServiceError, ServiceResult};

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            ServiceError::PasswordHashing
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; errors only when `hash` is not a valid PHC string.
pub fn verify_password(plain: &str, hash: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        ServiceError::PasswordHashing
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// A valid hash nobody knows the password for, verified in place of a missing
/// user's hash. Same parameters as `Argon2::default()`, so it costs one normal verify.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZWNvdGVjaGR1bW15c2FsdA$/gRjcHEZ8hFYQo/7ArqVu/9tDCoRfN41sl8p4a53vvQ";

/// Hashes on the blocking pool.
pub async fn hash_password_blocking(plain: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| {
            error!("spawn_blocking failed (hash_password): {:?}", e);
            ServiceError::Internal("password hashing task failed".into())
        })?
}

/// Verifies on the blocking pool. With no stored hash, burns one verification
/// against the dummy hash and reports a mismatch.
pub async fn verify_password_blocking(plain: String, stored: Option<String>) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || match stored {
        Some(hash) => verify_password(&plain, &hash),
        None => {
            let _ = verify_password(&plain, DUMMY_HASH)?;
            Ok(false)
        }
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking failed (verify_password): {:?}", e);
        ServiceError::Internal("password verification task failed".into())
    })?
}
