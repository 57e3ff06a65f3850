//! Username normalisation and password hashing.
//!
//! Passwords are stored as bcrypt hashes in the modular crypt format
//! (`$2b$<cost>$<salt+digest>`).

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

const BCRYPT_COST: u32 = 10;
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;

/// The form usernames are stored and looked up in.
pub fn canonical_username(raw: &str) -> String {
    raw.trim().nfc().collect()
}

/// [`canonical_username`] plus a length check in chars.
pub fn normalize_username(raw: &str) -> ResultEngine<String> {
    let username = canonical_username(raw);
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(EngineError::InvalidInput(format!(
            "username must be {USERNAME_MIN} to {USERNAME_MAX} characters long"
        )));
    }
    Ok(username)
}

pub fn validate_password(password: &str) -> ResultEngine<()> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(EngineError::InvalidInput(format!(
            "password must be at least {PASSWORD_MIN} characters long"
        )));
    }
    Ok(())
}

/// Salts and hashes `password` with bcrypt.
pub fn hash_password(password: &str) -> ResultEngine<String> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|err| {
        tracing::error!("password hashing failed: {err}");
        EngineError::OperationFailed("hash password".to_string())
    })
}

/// Returns false for malformed hashes too.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}
