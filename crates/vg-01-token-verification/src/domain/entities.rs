//! Core domain entities for Token Verification

use super::audit_chain;
use super::value_objects::{
    Credential, CredentialKind, ElectionId, Hash, LedgerKey, Timestamp, VoterId,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Registered voter. Created at registration; read-only here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub id: VoterId,
    pub display_name: String,
}

impl Voter {
    pub fn new(id: VoterId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Election scope a token is issued for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub name: String,
    pub active: bool,
}

impl Election {
    pub fn new(id: ElectionId, name: impl Into<String>, active: bool) -> Self {
        Self {
            id,
            name: name.into(),
            active,
        }
    }
}

/// Issued credential binding one voter to one election until `expires_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub credential: Credential,
    pub voter_id: VoterId,
    pub election_id: ElectionId,
    pub expires_at: Timestamp,
    pub issued_at: Timestamp,
}

/// A successfully resolved credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
    pub voter_id: VoterId,
    pub election_id: ElectionId,
    pub expires_at: Timestamp,
    pub voter_display_name: String,
}

/// The permanent "has voted" fact. Never updated, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: Uuid,
    pub voter_id: VoterId,
    pub election_id: ElectionId,
    pub verified_at: Timestamp,
    pub source_ip: Option<String>,
}

impl VerificationRecord {
    pub fn new(
        voter_id: VoterId,
        election_id: ElectionId,
        verified_at: Timestamp,
        source_ip: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            voter_id,
            election_id,
            verified_at,
            source_ip,
        }
    }

    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey::new(self.voter_id.clone(), self.election_id.clone())
    }
}

/// Audit action recorded for a scan attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    VerifySuccess,
    VerifyFail,
    AlreadyVerified,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::VerifySuccess => "VERIFY_SUCCESS",
            AuditAction::VerifyFail => "VERIFY_FAIL",
            AuditAction::AlreadyVerified => "ALREADY_VERIFIED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reason attached to an audit entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDetail {
    EmptyToken,
    MalformedToken {
        kind: CredentialKind,
        length: usize,
    },
    TokenNotFound {
        kind: CredentialKind,
        fingerprint: String,
    },
    VoterNotRegistered {
        voter_id: VoterId,
    },
    ElectionNotActive {
        election_id: ElectionId,
    },
    TokenExpired {
        voter_id: VoterId,
        election_id: ElectionId,
        expires_at: Timestamp,
    },
    Verified {
        voter_id: VoterId,
        election_id: ElectionId,
        record_id: Uuid,
    },
    AlreadyVerified {
        voter_id: VoterId,
        election_id: ElectionId,
        first_verified_at: Timestamp,
    },
    StorageUnavailable {
        message: String,
    },
}

impl AuditDetail {
    /// Human-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            AuditDetail::EmptyToken => "empty token",
            AuditDetail::MalformedToken { .. } => "malformed token",
            AuditDetail::TokenNotFound { .. } => "token not found",
            AuditDetail::VoterNotRegistered { .. } => "voter not registered",
            AuditDetail::ElectionNotActive { .. } => "election not active",
            AuditDetail::TokenExpired { .. } => "token expired",
            AuditDetail::Verified { .. } => "verified",
            AuditDetail::AlreadyVerified { .. } => "already verified",
            AuditDetail::StorageUnavailable { .. } => "storage unavailable",
        }
    }

    /// Stable text form fed into the audit hash chain.
    pub fn canonical(&self) -> String {
        match self {
            AuditDetail::EmptyToken => "empty_token".to_string(),
            AuditDetail::MalformedToken { kind, length } => {
                format!("malformed_token|{}|{}", kind.as_str(), length)
            }
            AuditDetail::TokenNotFound { kind, fingerprint } => {
                format!("token_not_found|{}|{}", kind.as_str(), fingerprint)
            }
            AuditDetail::VoterNotRegistered { voter_id } => {
                format!("voter_not_registered|{}", voter_id)
            }
            AuditDetail::ElectionNotActive { election_id } => {
                format!("election_not_active|{}", election_id)
            }
            AuditDetail::TokenExpired {
                voter_id,
                election_id,
                expires_at,
            } => format!("token_expired|{}|{}|{}", voter_id, election_id, expires_at),
            AuditDetail::Verified {
                voter_id,
                election_id,
                record_id,
            } => format!("verified|{}|{}|{}", voter_id, election_id, record_id),
            AuditDetail::AlreadyVerified {
                voter_id,
                election_id,
                first_verified_at,
            } => format!(
                "already_verified|{}|{}|{}",
                voter_id, election_id, first_verified_at
            ),
            AuditDetail::StorageUnavailable { message } => {
                format!("storage_unavailable|{}", message)
            }
        }
    }
}

/// An audit entry before the sink assigns its sequence and chain hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: AuditAction,
    /// Voter the attempt concerned, when it could be resolved.
    pub subject_ref: Option<String>,
    pub detail: AuditDetail,
    pub source_ip: Option<String>,
    pub recorded_at: Timestamp,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        subject_ref: Option<String>,
        detail: AuditDetail,
        source_ip: Option<String>,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            action,
            subject_ref,
            detail,
            source_ip,
            recorded_at,
        }
    }
}

/// Sealed, append-only audit entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// 1-based insertion order within the sink. Concurrent scans may be
    /// appended out of scan order, so this need not follow `recorded_at`.
    pub sequence: u64,
    pub action: AuditAction,
    pub subject_ref: Option<String>,
    pub detail: AuditDetail,
    pub source_ip: Option<String>,
    /// Scan time, taken once when the scan started.
    pub recorded_at: Timestamp,
    pub prev_hash: Hash,
    pub entry_hash: Hash,
}

impl AuditEntry {
    /// Assign identity and link the record onto the chain after `prev_hash`.
    pub fn seal(record: AuditRecord, sequence: u64, prev_hash: Hash) -> Self {
        let mut entry = Self {
            id: Uuid::new_v4(),
            sequence,
            action: record.action,
            subject_ref: record.subject_ref,
            detail: record.detail,
            source_ip: record.source_ip,
            recorded_at: record.recorded_at,
            prev_hash,
            entry_hash: [0u8; 32],
        };
        entry.entry_hash = audit_chain::compute_entry_hash(&entry);
        entry
    }

    pub fn reason(&self) -> &'static str {
        self.detail.reason()
    }
}
