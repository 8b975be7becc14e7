//! Firmware registry, assignment state machine and delivery protocols
//!
//! This crate implements the OTA core on top of [`openfleet_store`]:
//!
//! - [`registry::FirmwareRegistry`]: resolves build ids to readable
//!   artifacts, validated at delivery time
//! - [`assignments::AssignmentLedger`]: the per-device
//!   pending/completed state machine
//! - [`events::EventLog`]: the bounded-view fallback audit trail
//! - [`delivery::DeliveryService`]: the two delivery protocols
//!   (pull-download and push-stream)
//! - [`compiler::FirmwareCompiler`]: the capability trait for the
//!   external compiler collaborator
//!
//! Pull and push deliberately differ in their effect on assignment
//! state: pull is direct retrieval by build id and never transitions
//! anything, while a fully streamed push is the authoritative delivery
//! that completes the assignment.

pub mod assignments;
pub mod compiler;
pub mod delivery;
pub mod error;
pub mod events;
pub mod prelude;
pub mod registry;

pub use assignments::AssignmentLedger;
pub use compiler::{CompileOutcome, FirmwareCompiler};
pub use delivery::{DeliveryService, PullArtifact, PushDelivery, PUSH_CHUNK_SIZE};
pub use error::DeliveryError;
pub use events::EventLog;
pub use registry::{FirmwareRegistry, ResolvedArtifact};
