//! # Booth Node
//!
//! Runtime for a single polling booth.
//!
//! ## Modules
//!
//! - `adapters/` - Storage adapters for the verification ports
//! - `container/` - Configuration and dependency wiring
//! - `logging` - Tracing subscriber setup
//! - `scan` - Line-oriented scan input and JSON responses
//! - `seed` - Demo voter, election and credentials
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `VG_*` environment)
//! 2. Initialize logging
//! 3. Open stores and build the verification service
//! 4. Seed the demo fixture (if enabled)
//! 5. Process scans until input closes or Ctrl+C
//! 6. Flush any parked audit entries

pub mod adapters;
pub mod container;
pub mod logging;
pub mod scan;
pub mod seed;

pub use container::{BoothContainer, NodeConfig};
pub use scan::{parse_scan_line, run_scan_loop, ScanRequest, ScanStats};
