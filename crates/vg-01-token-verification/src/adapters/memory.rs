//! In-memory stores
//!
//! Used by tests and by the node runtime when started with `VG_STORAGE=memory`.
//! Uniqueness comes from map keys written under a single write lock.

use crate::domain::entities::{AuditEntry, AuditRecord, Election, Token, VerificationRecord, Voter};
use crate::domain::errors::StoreError;
use crate::domain::value_objects::{
    Credential, ElectionId, Hash, LedgerKey, VoterId, ZERO_HASH,
};
use crate::ports::outbound::{
    AuditSink, LedgerDecision, RegistryWriter, TokenDirectory, VerificationLedger,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Default)]
struct RegistryState {
    voters: HashMap<VoterId, Voter>,
    elections: HashMap<ElectionId, Election>,
    tokens: HashMap<Credential, Token>,
}

/// Voters, elections and issued tokens.
#[derive(Default)]
pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_count(&self) -> usize {
        self.state.read().tokens.len()
    }
}

#[async_trait]
impl TokenDirectory for InMemoryRegistry {
    async fn find_token(&self, credential: &Credential) -> Result<Option<Token>, StoreError> {
        Ok(self.state.read().tokens.get(credential).cloned())
    }

    async fn find_voter(&self, id: &VoterId) -> Result<Option<Voter>, StoreError> {
        Ok(self.state.read().voters.get(id).cloned())
    }

    async fn find_election(&self, id: &ElectionId) -> Result<Option<Election>, StoreError> {
        Ok(self.state.read().elections.get(id).cloned())
    }
}

#[async_trait]
impl RegistryWriter for InMemoryRegistry {
    async fn register_voter(&self, voter: Voter) -> Result<(), StoreError> {
        self.state.write().voters.insert(voter.id.clone(), voter);
        Ok(())
    }

    async fn register_election(&self, election: Election) -> Result<(), StoreError> {
        self.state
            .write()
            .elections
            .insert(election.id.clone(), election);
        Ok(())
    }

    async fn issue_token(&self, token: Token) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.voters.contains_key(&token.voter_id) {
            return Err(StoreError::MissingReference {
                entity: "voter",
                id: token.voter_id.to_string(),
            });
        }
        if !state.elections.contains_key(&token.election_id) {
            return Err(StoreError::MissingReference {
                entity: "election",
                id: token.election_id.to_string(),
            });
        }
        match state.tokens.entry(token.credential.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateCredential(
                token.credential.to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(token);
                Ok(())
            }
        }
    }
}

// =============================================================================
// LEDGER
// =============================================================================

/// Verification ledger keyed by `(voter, election)`.
#[derive(Default)]
pub struct InMemoryLedger {
    records: RwLock<HashMap<LedgerKey, VerificationRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, ordered by key.
    pub fn snapshot(&self) -> Vec<VerificationRecord> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.ledger_key().cmp(&b.ledger_key()));
        records
    }
}

#[async_trait]
impl VerificationLedger for InMemoryLedger {
    async fn try_insert(&self, record: VerificationRecord) -> Result<LedgerDecision, StoreError> {
        let mut records = self.records.write();
        match records.entry(record.ledger_key()) {
            Entry::Occupied(existing) => Ok(LedgerDecision::AlreadyVerified(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(LedgerDecision::Committed(record))
            }
        }
    }

    async fn find(&self, key: &LedgerKey) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self.records.read().get(key).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().len())
    }
}

// =============================================================================
// AUDIT LOG
// =============================================================================

/// Append-only audit log. The mutex serializes sequence assignment and
/// chaining.
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    fn head_hash(entries: &[AuditEntry]) -> Hash {
        entries.last().map(|e| e.entry_hash).unwrap_or(ZERO_HASH)
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn append(&self, record: AuditRecord) -> Result<AuditEntry, StoreError> {
        let mut entries = self.entries.lock();
        let sequence = entries.len() as u64 + 1;
        let entry = AuditEntry::seal(record, sequence, Self::head_hash(&entries));
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn read_from(&self, start: u64, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
        let entries = self.entries.lock();
        let skip = start.saturating_sub(1) as usize;
        Ok(entries.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn tail(&self, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(limit);
        Ok(entries[skip..].to_vec())
    }

    async fn len(&self) -> Result<u64, StoreError> {
        Ok(self.entries.lock().len() as u64)
    }
}
