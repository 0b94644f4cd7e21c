//! Application layer: the scan pipeline and its collaborators.

pub mod recorder;
pub mod resolver;
pub mod service;

pub use recorder::AuditRecorder;
pub use resolver::{Resolution, TokenResolver};
pub use service::{ServicePorts, VerificationService};
