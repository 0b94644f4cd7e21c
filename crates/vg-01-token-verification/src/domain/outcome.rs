//! Terminal scan outcomes

use super::value_objects::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the booth shows after a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyOutcome {
    Success,
    InvalidToken,
    TokenExpired,
    /// The voter was already verified for this election. Not a failure: the
    /// dedup guarantee working as intended.
    AlreadyVerified,
}

impl VerifyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyOutcome::Success => "SUCCESS",
            VerifyOutcome::InvalidToken => "INVALID_TOKEN",
            VerifyOutcome::TokenExpired => "TOKEN_EXPIRED",
            VerifyOutcome::AlreadyVerified => "ALREADY_VERIFIED",
        }
    }
}

impl fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a scan was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    EmptyToken,
    MalformedToken,
    TokenNotFound,
    VoterNotRegistered,
    ElectionNotActive,
    TokenExpired,
    AlreadyVerified,
}

impl RejectReason {
    pub fn outcome(&self) -> VerifyOutcome {
        match self {
            RejectReason::EmptyToken
            | RejectReason::MalformedToken
            | RejectReason::TokenNotFound
            | RejectReason::VoterNotRegistered
            | RejectReason::ElectionNotActive => VerifyOutcome::InvalidToken,
            RejectReason::TokenExpired => VerifyOutcome::TokenExpired,
            RejectReason::AlreadyVerified => VerifyOutcome::AlreadyVerified,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::EmptyToken => "empty token",
            RejectReason::MalformedToken => "malformed token",
            RejectReason::TokenNotFound => "token not found",
            RejectReason::VoterNotRegistered => "voter not registered",
            RejectReason::ElectionNotActive => "election not active",
            RejectReason::TokenExpired => "token expired",
            RejectReason::AlreadyVerified => "voter has already been verified for this election",
        }
    }
}

/// Response returned to the scanning booth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub outcome: VerifyOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voter_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    /// When the voter was (first) verified, for SUCCESS and ALREADY_VERIFIED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<Timestamp>,
}

impl VerifyResponse {
    pub fn success(voter_display_name: String, verified_at: Timestamp) -> Self {
        Self {
            outcome: VerifyOutcome::Success,
            voter_display_name: Some(voter_display_name),
            reason: None,
            verified_at: Some(verified_at),
        }
    }

    pub fn already_verified(first_verified_at: Timestamp) -> Self {
        Self {
            outcome: VerifyOutcome::AlreadyVerified,
            voter_display_name: None,
            reason: Some(RejectReason::AlreadyVerified),
            verified_at: Some(first_verified_at),
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            outcome: reason.outcome(),
            voter_display_name: None,
            reason: Some(reason),
            verified_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == VerifyOutcome::Success
    }
}
