//! Expiry gate

use super::value_objects::Timestamp;

/// Result of checking a token's validity window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpiryStatus {
    Valid,
    Expired,
}

/// `now > expires_at` is expired; a token is still valid at its expiry instant.
pub fn check_expiry(expires_at: Timestamp, now: Timestamp) -> ExpiryStatus {
    if now > expires_at {
        ExpiryStatus::Expired
    } else {
        ExpiryStatus::Valid
    }
}
