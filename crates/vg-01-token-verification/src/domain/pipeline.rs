//! Scan state machine
//!
//! ```text
//! Start ──→ TokenResolved ──→ ExpiryChecked ──→ LedgerDecided ──→ Audited ──→ End
//!   │             │                 │                                ↑
//!   └─────────────┴─────────────────┴── rejected / store failure ────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanStage {
    Start,
    TokenResolved,
    ExpiryChecked,
    LedgerDecided,
    Audited,
    End,
}

impl ScanStage {
    /// Legal forward transitions. Every path passes through `Audited`.
    pub fn can_advance_to(self, next: ScanStage) -> bool {
        use ScanStage::*;
        matches!(
            (self, next),
            (Start, TokenResolved)
                | (Start, Audited)
                | (TokenResolved, ExpiryChecked)
                | (TokenResolved, Audited)
                | (ExpiryChecked, LedgerDecided)
                | (ExpiryChecked, Audited)
                | (LedgerDecided, Audited)
                | (Audited, End)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStage::Start => "start",
            ScanStage::TokenResolved => "token_resolved",
            ScanStage::ExpiryChecked => "expiry_checked",
            ScanStage::LedgerDecided => "ledger_decided",
            ScanStage::Audited => "audited",
            ScanStage::End => "end",
        }
    }
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one scan through the state machine.
#[derive(Debug)]
pub struct ScanProgress {
    stage: ScanStage,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            stage: ScanStage::Start,
        }
    }

    pub fn stage(&self) -> ScanStage {
        self.stage
    }

    pub fn advance(&mut self, next: ScanStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal scan transition {} -> {}",
            self.stage,
            next
        );
        self.stage = next;
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}
