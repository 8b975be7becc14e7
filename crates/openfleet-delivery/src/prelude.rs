//! Convenience re-exports for downstream crates

pub use crate::assignments::AssignmentLedger;
pub use crate::compiler::{CompileOutcome, FirmwareCompiler};
pub use crate::delivery::{DeliveryService, PullArtifact, PushDelivery, PUSH_CHUNK_SIZE};
pub use crate::error::DeliveryError;
pub use crate::events::EventLog;
pub use crate::registry::{FirmwareRegistry, ResolvedArtifact};
