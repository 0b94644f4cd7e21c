//! # Domain Layer
//!
//! Pure domain logic for the Token Verification subsystem.
//!
//! ## Modules
//!
//! - `value_objects` - Identifiers, credentials, ledger keys, timestamps
//! - `entities` - Voter, Election, Token, VerificationRecord, AuditEntry
//! - `expiry` - Expiry gate (pure comparison)
//! - `audit_chain` - Hash chaining of audit entries
//! - `pipeline` - Scan state machine
//! - `outcome` - Terminal outcomes returned to callers
//! - `invariants` - Checkable domain invariants
//! - `errors` - Domain error types

pub mod audit_chain;
pub mod entities;
pub mod errors;
pub mod expiry;
pub mod invariants;
pub mod outcome;
pub mod pipeline;
pub mod value_objects;
