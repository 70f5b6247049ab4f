use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};

use crate::error::{ApiError, AuthError};
use crate::store::ConfigDocument;

/// Minimum length accepted for a new admin password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password with Argon2id and a fresh random salt. Not deterministic:
/// the same input produces a different PHC string each call.
pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("argon2 with default params accepts any input")
        .to_string()
}

/// Verify a password against a stored PHC hash string.
/// Returns false (never errors) on malformed hash input.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Replace the admin password hash, requiring the current password.
/// Returns the updated document; the caller is responsible for persisting it.
pub fn change_password(
    old_password: &str,
    new_password: &str,
    mut doc: ConfigDocument,
) -> Result<ConfigDocument, ApiError> {
    if !verify_password(old_password, &doc.admin.password_hash) {
        return Err(AuthError::InvalidCredential.into());
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    doc.admin.password_hash = hash_password(new_password);
    Ok(doc)
}
