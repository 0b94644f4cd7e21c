//! Outbound Ports (Driven Ports / SPI)
//!
//! Adapters must be `Send + Sync`; the service holds them as `Arc<dyn _>`.

use crate::domain::entities::{AuditEntry, AuditRecord, Election, Token, VerificationRecord, Voter};
use crate::domain::errors::StoreError;
use crate::domain::value_objects::{Credential, ElectionId, LedgerKey, Timestamp, VoterId};
use async_trait::async_trait;

/// Read-only lookups over registered voters, elections and issued tokens.
#[async_trait]
pub trait TokenDirectory: Send + Sync {
    /// Exact match on the unique `(kind, value)` index.
    async fn find_token(&self, credential: &Credential) -> Result<Option<Token>, StoreError>;

    async fn find_voter(&self, id: &VoterId) -> Result<Option<Voter>, StoreError>;

    async fn find_election(&self, id: &ElectionId) -> Result<Option<Election>, StoreError>;
}

/// Result of a conditional ledger insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerDecision {
    /// This call created the record.
    Committed(VerificationRecord),
    /// A record already existed; carries the stored one unchanged.
    AlreadyVerified(VerificationRecord),
}

impl LedgerDecision {
    pub fn is_committed(&self) -> bool {
        matches!(self, LedgerDecision::Committed(_))
    }
}

/// Durable set of "has voted" facts keyed by `(voter, election)`.
///
/// `try_insert` must be atomic: of any number of concurrent calls for one
/// key, exactly one returns `Committed`. Records are never overwritten.
#[async_trait]
pub trait VerificationLedger: Send + Sync {
    async fn try_insert(&self, record: VerificationRecord) -> Result<LedgerDecision, StoreError>;

    async fn find(&self, key: &LedgerKey) -> Result<Option<VerificationRecord>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

/// Append-only, hash-chained audit log.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Assign the next sequence number, chain onto the head and persist.
    async fn append(&self, record: AuditRecord) -> Result<AuditEntry, StoreError>;

    /// Entries with `sequence >= start`, in order, at most `limit`.
    async fn read_from(&self, start: u64, limit: usize) -> Result<Vec<AuditEntry>, StoreError>;

    /// The last `limit` entries, oldest first.
    async fn tail(&self, limit: usize) -> Result<Vec<AuditEntry>, StoreError>;

    async fn len(&self) -> Result<u64, StoreError>;
}

/// Wall clock in unix milliseconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Registration side of the directory. Used by seeding and tests; the
/// verification pipeline never writes through it.
#[async_trait]
pub trait RegistryWriter: Send + Sync {
    async fn register_voter(&self, voter: Voter) -> Result<(), StoreError>;

    async fn register_election(&self, election: Election) -> Result<(), StoreError>;

    /// Fails with `DuplicateCredential` if the credential is already issued
    /// and `MissingReference` if the voter or election is unknown.
    async fn issue_token(&self, token: Token) -> Result<(), StoreError>;
}
