//! Domain invariants for Token Verification
//!
//! Checked by tests and by reconciliation tooling against a store snapshot.

use super::entities::{AuditAction, AuditDetail, AuditEntry, VerificationRecord};
use super::value_objects::LedgerKey;
use std::collections::HashSet;

/// INVARIANT-1: Single Verification
/// At most one ledger record exists per (voter, election).
pub fn invariant_single_verification(records: &[VerificationRecord]) -> bool {
    let mut seen = HashSet::new();
    records.iter().all(|r| seen.insert(r.ledger_key()))
}

/// INVARIANT-1 as seen from the audit trail: never two VERIFY_SUCCESS
/// entries for the same (voter, election).
pub fn invariant_single_success(entries: &[AuditEntry]) -> bool {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| e.action == AuditAction::VerifySuccess)
        .all(|e| match &e.detail {
            AuditDetail::Verified {
                voter_id,
                election_id,
                ..
            } => seen.insert(LedgerKey::new(voter_id.clone(), election_id.clone())),
            _ => false,
        })
}

/// Every VERIFY_SUCCESS entry points at a record that exists in the ledger.
pub fn invariant_success_backed_by_ledger(
    entries: &[AuditEntry],
    records: &[VerificationRecord],
) -> bool {
    let ids: HashSet<_> = records.iter().map(|r| r.id).collect();
    entries
        .iter()
        .filter(|e| e.action == AuditAction::VerifySuccess)
        .all(|e| matches!(&e.detail, AuditDetail::Verified { record_id, .. } if ids.contains(record_id)))
}
