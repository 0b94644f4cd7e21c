//! Value objects for Token Verification

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Wall-clock time in milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// SHA-256 digest.
pub type Hash = [u8; 32];

/// Anchor for the first audit entry in a chain.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Milliseconds per second, for expressing token windows.
pub const MILLIS_PER_SEC: u64 = 1_000;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Registered voter identifier.
    VoterId
);

string_id!(
    /// Election identifier.
    ElectionId
);

/// How a credential was presented at the booth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CredentialKind {
    /// Opaque token string encoded in the voter's QR code.
    QrToken,
    /// Tag identifier read from an RFID card.
    Rfid,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::QrToken => "qr",
            CredentialKind::Rfid => "rfid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "qr" => Some(CredentialKind::QrToken),
            "rfid" => Some(CredentialKind::Rfid),
            _ => None,
        }
    }
}

/// A presented credential, looked up by exact match on `(kind, value)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Credential {
    pub kind: CredentialKind,
    pub value: String,
}

impl Credential {
    pub fn new(kind: CredentialKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn qr_token(value: impl Into<String>) -> Self {
        Self::new(CredentialKind::QrToken, value)
    }

    pub fn rfid(value: impl Into<String>) -> Self {
        Self::new(CredentialKind::Rfid, value)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Unique index key: `<kind>:<value>`.
    pub fn index_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.kind.as_str().len() + 1 + self.value.len());
        key.extend_from_slice(self.kind.as_str().as_bytes());
        key.push(b':');
        key.extend_from_slice(self.value.as_bytes());
        key
    }

    /// Short SHA-256 prefix so audit entries can correlate repeated bad scans
    /// without storing the raw credential.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.index_key());
        hex::encode(&digest[..8])
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.fingerprint())
    }
}

/// Uniqueness key of the verification ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub voter_id: VoterId,
    pub election_id: ElectionId,
}

impl LedgerKey {
    pub fn new(voter_id: VoterId, election_id: ElectionId) -> Self {
        Self {
            voter_id,
            election_id,
        }
    }

    /// Length-prefixed encoding, so no pair of ids can collide.
    pub fn to_bytes(&self) -> Vec<u8> {
        let voter = self.voter_id.as_str().as_bytes();
        let election = self.election_id.as_str().as_bytes();
        let mut key = Vec::with_capacity(8 + voter.len() + election.len());
        key.extend_from_slice(&(voter.len() as u32).to_be_bytes());
        key.extend_from_slice(voter);
        key.extend_from_slice(&(election.len() as u32).to_be_bytes());
        key.extend_from_slice(election);
        key
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.voter_id, self.election_id)
    }
}
