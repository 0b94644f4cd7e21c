//! Audit hash chain
//!
//! `entry_hash = SHA-256(prev_hash ‖ sequence ‖ id ‖ action ‖ subject ‖ detail ‖ source ‖ recorded_at)`
//! with every variable-length field length-prefixed. Any edit, deletion or
//! reordering of a sealed entry breaks the chain from that point on.

use super::entities::AuditEntry;
use super::value_objects::Hash;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Chain verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainViolation {
    #[error("sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },

    #[error("entry {sequence} does not link to its predecessor")]
    BrokenLink { sequence: u64 },

    #[error("entry {sequence} hash does not match its contents")]
    HashMismatch { sequence: u64 },
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

fn update_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            update_field(hasher, v.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

/// Hash over everything in the entry except `entry_hash` itself.
pub fn compute_entry_hash(entry: &AuditEntry) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(entry.prev_hash);
    hasher.update(entry.sequence.to_be_bytes());
    hasher.update(entry.id.as_bytes());
    update_field(&mut hasher, entry.action.as_str().as_bytes());
    update_optional(&mut hasher, entry.subject_ref.as_deref());
    update_field(&mut hasher, entry.detail.canonical().as_bytes());
    update_optional(&mut hasher, entry.source_ip.as_deref());
    hasher.update(entry.recorded_at.to_be_bytes());
    hasher.finalize().into()
}

/// Verify a contiguous run of entries starting after `anchor`.
///
/// `anchor` is `ZERO_HASH` when `entries` starts at sequence 1, otherwise the
/// `entry_hash` of the entry preceding the run.
pub fn verify_chain(entries: &[AuditEntry], anchor: Hash) -> Result<(), ChainViolation> {
    let mut prev = anchor;
    let mut expected_sequence = entries.first().map(|e| e.sequence).unwrap_or(1);

    for entry in entries {
        if entry.sequence != expected_sequence {
            return Err(ChainViolation::SequenceGap {
                expected: expected_sequence,
                found: entry.sequence,
            });
        }
        if entry.prev_hash != prev {
            return Err(ChainViolation::BrokenLink {
                sequence: entry.sequence,
            });
        }
        if compute_entry_hash(entry) != entry.entry_hash {
            return Err(ChainViolation::HashMismatch {
                sequence: entry.sequence,
            });
        }
        prev = entry.entry_hash;
        expected_sequence += 1;
    }

    Ok(())
}

/// Verify a complete log, which must start at sequence 1.
pub fn verify_audit_chain(entries: &[AuditEntry]) -> Result<(), ChainViolation> {
    if let Some(first) = entries.first() {
        if first.sequence != 1 {
            return Err(ChainViolation::SequenceGap {
                expected: 1,
                found: first.sequence,
            });
        }
    }
    verify_chain(entries, super::value_objects::ZERO_HASH)
}
