//! # RocksDB Storage Adapter
//!
//! Durable implementation of every verification store port on a single
//! RocksDB `TransactionDB`.
//!
//! ## Column Families
//!
//! - `voters` - voter id → Voter
//! - `elections` - election id → Election
//! - `tokens` - `<kind>:<value>` → Token (unique credential index)
//! - `verifications` - length-prefixed (voter, election) → VerificationRecord
//! - `audit` - big-endian sequence → AuditEntry
//!
//! ## Uniqueness
//!
//! Ledger inserts and token issuance run in a pessimistic transaction that
//! takes an exclusive `get_for_update` lock on the key before writing, so two
//! writers of the same key are serialized by RocksDB itself. Lock timeouts
//! and busy conflicts are retried up to `max_conflict_retries` times.
//!
//! All RocksDB calls run on the blocking thread pool.

use parking_lot::Mutex;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, ErrorKind, IteratorMode, Options,
    TransactionDB, TransactionDBOptions, TransactionOptions, WriteOptions,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vg_01_token_verification::{
    AuditEntry, AuditRecord, AuditSink, Credential, Election, ElectionId, Hash, LedgerDecision,
    LedgerKey, RegistryWriter, StoreError, Token, TokenDirectory, VerificationLedger,
    VerificationRecord, Voter, VoterId, ZERO_HASH,
};

/// Column family names
pub const CF_VOTERS: &str = "voters";
pub const CF_ELECTIONS: &str = "elections";
pub const CF_TOKENS: &str = "tokens";
pub const CF_VERIFICATIONS: &str = "verifications";
pub const CF_AUDIT: &str = "audit";

/// All column families used by the booth store
pub const COLUMN_FAMILIES: &[&str] = &[
    CF_VOTERS,
    CF_ELECTIONS,
    CF_TOKENS,
    CF_VERIFICATIONS,
    CF_AUDIT,
];

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// How long a transaction waits for a row lock (default: 1s)
    pub lock_timeout_ms: i64,
    /// Retries after a lock timeout or busy conflict (default: 5)
    pub max_conflict_retries: u32,
    /// Base backoff between retries, multiplied by the attempt number
    pub retry_backoff_ms: u64,
    /// fsync on every commit (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/booth"),
            lock_timeout_ms: 1_000,
            max_conflict_retries: 5,
            retry_backoff_ms: 10,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (short timeouts, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: 500,
            max_conflict_retries: 10,
            retry_backoff_ms: 1,
            sync_writes: false,
        }
    }
}

/// Head of the audit chain: last sequence and its hash.
#[derive(Debug, Clone, Copy)]
struct AuditHead {
    sequence: u64,
    hash: Hash,
}

/// Transaction failure, split by whether a retry can help.
enum TxnFailure {
    Contention(rocksdb::Error),
    Fatal(StoreError),
}

impl From<rocksdb::Error> for TxnFailure {
    fn from(e: rocksdb::Error) -> Self {
        match e.kind() {
            ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => {
                TxnFailure::Contention(e)
            }
            _ => TxnFailure::Fatal(unavailable(e)),
        }
    }
}

impl From<StoreError> for TxnFailure {
    fn from(e: StoreError) -> Self {
        TxnFailure::Fatal(e)
    }
}

fn unavailable(e: rocksdb::Error) -> StoreError {
    StoreError::Unavailable(format!("RocksDB: {}", e))
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

struct StoreInner {
    db: TransactionDB,
    config: RocksDbConfig,
    /// Serializes audit appends: sequence assignment, chaining and the put.
    audit_head: Mutex<AuditHead>,
}

/// RocksDB-backed booth store. Clones share one database handle.
#[derive(Clone)]
pub struct RocksDbVerificationStore {
    inner: Arc<StoreInner>,
}

impl RocksDbVerificationStore {
    /// Open or create the database and recover the audit chain head.
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut txn_db_opts = TransactionDBOptions::default();
        txn_db_opts.set_txn_lock_timeout(config.lock_timeout_ms);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = TransactionDB::open_cf_descriptors(&opts, &txn_db_opts, &config.path, cf_descriptors)
            .map_err(|e| StoreError::Unavailable(format!("Failed to open RocksDB: {}", e)))?;

        let mut inner = StoreInner {
            db,
            config,
            audit_head: Mutex::new(AuditHead {
                sequence: 0,
                hash: ZERO_HASH,
            }),
        };
        let head = inner.recover_audit_head()?;
        *inner.audit_head.get_mut() = head;

        info!(
            path = %inner.config.path.display(),
            audit_entries = head.sequence,
            "Opened RocksDB verification store"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&StoreInner) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| StoreError::Unavailable(format!("storage task failed: {}", e)))?
    }
}

impl StoreInner {
    fn cf(&self, name: &'static str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Unavailable(format!("missing column family {}", name)))
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }

    fn get<T: DeserializeOwned>(&self, cf_name: &'static str, key: &[u8]) -> Result<Option<T>, StoreError> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key).map_err(unavailable)? {
            Some(bytes) => decode(cf_name, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, cf_name: &'static str, key: &[u8], value: &T) -> Result<(), StoreError> {
        let cf = self.cf(cf_name)?;
        let bytes = encode(cf_name, value)?;
        self.db
            .put_cf_opt(cf, key, bytes, &self.write_options())
            .map_err(unavailable)
    }

    /// Run `op` in fresh transactions until it commits, fails fatally, or
    /// the retry budget for lock contention is spent.
    fn with_retry<T>(
        &self,
        key: &str,
        mut op: impl FnMut() -> Result<T, TxnFailure>,
    ) -> Result<T, StoreError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(TxnFailure::Fatal(e)) => return Err(e),
                Err(TxnFailure::Contention(e)) => {
                    if attempt > self.config.max_conflict_retries {
                        warn!(key, attempts = attempt, error = %e, "Write conflict retries exhausted");
                        return Err(StoreError::ConflictRetriesExhausted {
                            key: key.to_string(),
                            attempts: attempt,
                        });
                    }
                    debug!(key, attempt, error = %e, "Write conflict, retrying");
                    std::thread::sleep(Duration::from_millis(
                        self.config.retry_backoff_ms * u64::from(attempt),
                    ));
                }
            }
        }
    }

    fn try_insert_once(&self, record: &VerificationRecord) -> Result<LedgerDecision, TxnFailure> {
        let cf = self.cf(CF_VERIFICATIONS)?;
        let key = record.ledger_key().to_bytes();
        let txn = self
            .db
            .transaction_opt(&self.write_options(), &TransactionOptions::default());

        if let Some(bytes) = txn.get_for_update_cf(cf, &key, true)? {
            let existing: VerificationRecord = decode(CF_VERIFICATIONS, &bytes)?;
            txn.rollback()?;
            return Ok(LedgerDecision::AlreadyVerified(existing));
        }

        txn.put_cf(cf, &key, encode(CF_VERIFICATIONS, record)?)?;
        txn.commit()?;
        Ok(LedgerDecision::Committed(record.clone()))
    }

    fn issue_token_once(&self, token: &Token) -> Result<(), TxnFailure> {
        let tokens = self.cf(CF_TOKENS)?;
        let voters = self.cf(CF_VOTERS)?;
        let elections = self.cf(CF_ELECTIONS)?;
        let key = token.credential.index_key();
        let txn = self
            .db
            .transaction_opt(&self.write_options(), &TransactionOptions::default());

        if txn.get_cf(voters, token.voter_id.as_str())?.is_none() {
            return Err(StoreError::MissingReference {
                entity: "voter",
                id: token.voter_id.to_string(),
            }
            .into());
        }
        if txn.get_cf(elections, token.election_id.as_str())?.is_none() {
            return Err(StoreError::MissingReference {
                entity: "election",
                id: token.election_id.to_string(),
            }
            .into());
        }
        if txn.get_for_update_cf(tokens, &key, true)?.is_some() {
            return Err(StoreError::DuplicateCredential(token.credential.to_string()).into());
        }

        txn.put_cf(tokens, &key, encode(CF_TOKENS, token)?)?;
        txn.commit()?;
        Ok(())
    }

    fn count_verifications(&self) -> Result<usize, StoreError> {
        let cf = self.cf(CF_VERIFICATIONS)?;
        let mut count = 0usize;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item.map_err(unavailable)?;
            count += 1;
        }
        Ok(count)
    }

    fn recover_audit_head(&self) -> Result<AuditHead, StoreError> {
        let cf = self.cf(CF_AUDIT)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (_, value) = item.map_err(unavailable)?;
                let entry: AuditEntry = decode(CF_AUDIT, &value)?;
                Ok(AuditHead {
                    sequence: entry.sequence,
                    hash: entry.entry_hash,
                })
            }
            None => Ok(AuditHead {
                sequence: 0,
                hash: ZERO_HASH,
            }),
        }
    }

    fn append_audit(&self, record: AuditRecord) -> Result<AuditEntry, StoreError> {
        let mut head = self.audit_head.lock();
        let entry = AuditEntry::seal(record, head.sequence + 1, head.hash);
        self.put(CF_AUDIT, &entry.sequence.to_be_bytes(), &entry)?;
        head.sequence = entry.sequence;
        head.hash = entry.entry_hash;
        Ok(entry)
    }

    fn read_audit(&self, start: u64, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
        let cf = self.cf(CF_AUDIT)?;
        let start_key = start.max(1).to_be_bytes();
        let mut entries = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(&start_key[..], Direction::Forward))
            .take(limit)
        {
            let (_, value) = item.map_err(unavailable)?;
            entries.push(decode(CF_AUDIT, &value)?);
        }
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl TokenDirectory for RocksDbVerificationStore {
    async fn find_token(&self, credential: &Credential) -> Result<Option<Token>, StoreError> {
        let key = credential.index_key();
        self.blocking(move |s| s.get(CF_TOKENS, &key)).await
    }

    async fn find_voter(&self, id: &VoterId) -> Result<Option<Voter>, StoreError> {
        let key = id.as_str().as_bytes().to_vec();
        self.blocking(move |s| s.get(CF_VOTERS, &key)).await
    }

    async fn find_election(&self, id: &ElectionId) -> Result<Option<Election>, StoreError> {
        let key = id.as_str().as_bytes().to_vec();
        self.blocking(move |s| s.get(CF_ELECTIONS, &key)).await
    }
}

#[async_trait::async_trait]
impl RegistryWriter for RocksDbVerificationStore {
    async fn register_voter(&self, voter: Voter) -> Result<(), StoreError> {
        self.blocking(move |s| s.put(CF_VOTERS, voter.id.as_str().as_bytes(), &voter))
            .await
    }

    async fn register_election(&self, election: Election) -> Result<(), StoreError> {
        self.blocking(move |s| s.put(CF_ELECTIONS, election.id.as_str().as_bytes(), &election))
            .await
    }

    async fn issue_token(&self, token: Token) -> Result<(), StoreError> {
        self.blocking(move |s| {
            let key = token.credential.to_string();
            s.with_retry(&key, || s.issue_token_once(&token))
        })
        .await
    }
}

#[async_trait::async_trait]
impl VerificationLedger for RocksDbVerificationStore {
    async fn try_insert(&self, record: VerificationRecord) -> Result<LedgerDecision, StoreError> {
        self.blocking(move |s| {
            let key = record.ledger_key().to_string();
            s.with_retry(&key, || s.try_insert_once(&record))
        })
        .await
    }

    async fn find(&self, key: &LedgerKey) -> Result<Option<VerificationRecord>, StoreError> {
        let key = key.to_bytes();
        self.blocking(move |s| s.get(CF_VERIFICATIONS, &key)).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.blocking(|s| s.count_verifications()).await
    }
}

#[async_trait::async_trait]
impl AuditSink for RocksDbVerificationStore {
    async fn append(&self, record: AuditRecord) -> Result<AuditEntry, StoreError> {
        self.blocking(move |s| s.append_audit(record)).await
    }

    async fn read_from(&self, start: u64, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
        self.blocking(move |s| s.read_audit(start, limit)).await
    }

    async fn tail(&self, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
        self.blocking(move |s| {
            let last = s.audit_head.lock().sequence;
            let start = last.saturating_sub(limit as u64) + 1;
            s.read_audit(start, limit)
        })
        .await
    }

    async fn len(&self) -> Result<u64, StoreError> {
        Ok(self.inner.audit_head.lock().sequence)
    }
}
