use anyhow::{Context, Result};

/// Hash a password with bcrypt at the given cost
///
/// bcrypt generates a fresh random salt for every call, so hashing the same
/// password twice never yields the same string.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Check a password against a stored bcrypt hash
///
/// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    bcrypt::verify(password, password_hash).context("Failed to verify password hash")
}
