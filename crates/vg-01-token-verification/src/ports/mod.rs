//! Ports module for Token Verification
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::VerificationApi;
pub use outbound::{
    AuditSink, LedgerDecision, RegistryWriter, TimeSource, TokenDirectory, VerificationLedger,
};
