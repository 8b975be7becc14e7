//! Durable OTA state store
//!
//! One JSON document holds the whole persisted state: firmware builds
//! keyed by id, per-device assignments, and the append-only fallback
//! event log. Every mutation rewrites the document atomically
//! (write-temp-then-rename); the in-memory state stays authoritative
//! for the running process even when a save fails.
//!
//! [`OtaStore`] is the only way the rest of the system touches this
//! state. Its mutation helper holds the write lock across
//! "mutate → persist", so concurrent writers serialize on one critical
//! section and the on-disk file has a single writer.

pub mod error;
pub mod state;
pub mod storage;
pub mod store;

pub use error::StoreError;
pub use state::{Assignment, AssignmentStatus, FallbackEvent, StoreState, EVENT_WINDOW};
pub use store::OtaStore;
