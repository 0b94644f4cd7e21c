//! Port implementations wired in by the booth runtime.

pub mod storage;
