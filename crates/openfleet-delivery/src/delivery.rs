//! Pull-download and push-stream delivery
//!
//! Pull is direct retrieval by build id, not gated by any assignment;
//! it never transitions state. Push requires a pending assignment,
//! streams the artifact in fixed 4096-byte chunks, and records the
//! completion only after the final chunk has been produced; a dropped
//! stream leaves the assignment pending and closes the artifact
//! handle.

use crate::assignments::AssignmentLedger;
use crate::error::DeliveryError;
use crate::registry::FirmwareRegistry;
use fleet_ota_schemas::{BuildId, DeviceId};
use futures::stream::BoxStream;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// Fixed chunk size for push-stream transfers
pub const PUSH_CHUNK_SIZE: usize = 4096;

/// A fully-buffered pull-download response
#[derive(Debug, Clone)]
pub struct PullArtifact {
    pub build_id: BuildId,
    /// Download filename derived from the artifact path
    pub filename: String,
    /// The complete artifact bytes
    pub bytes: Vec<u8>,
}

impl PullArtifact {
    /// Content length in bytes
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the artifact is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A push-stream in flight
///
/// `stream` yields the artifact in [`PUSH_CHUNK_SIZE`] chunks,
/// order-exact, and marks the assignment completed after the final
/// chunk. Dropping the stream before exhaustion records nothing.
pub struct PushDelivery {
    pub build_id: BuildId,
    /// Total bytes the stream will produce
    pub content_length: u64,
    pub stream: BoxStream<'static, std::io::Result<Vec<u8>>>,
}

/// The two delivery protocols over registry and state machine
#[derive(Debug, Clone)]
pub struct DeliveryService {
    registry: FirmwareRegistry,
    assignments: AssignmentLedger,
}

impl DeliveryService {
    /// Create the delivery service
    pub fn new(registry: FirmwareRegistry, assignments: AssignmentLedger) -> Self {
        Self {
            registry,
            assignments,
        }
    }

    /// Pull-download: fetch an artifact by build id
    ///
    /// Fails with a not-found variant when the build is unknown or its
    /// artifact is missing. No state transition occurs; a device that
    /// pulled successfully still polls as pending until a push
    /// completes (intentional asymmetry).
    pub async fn pull_download(&self, build_id: &BuildId) -> Result<PullArtifact, DeliveryError> {
        let resolved = self.registry.resolve(build_id).await?;

        let bytes = tokio::fs::read(&resolved.path).await?;
        debug!(build_id = %build_id, len = bytes.len(), "Pull-download served");

        Ok(PullArtifact {
            filename: resolved.filename(),
            build_id: resolved.build_id,
            bytes,
        })
    }

    /// Push-stream: stream the device's pending build
    ///
    /// Preconditions are checked up front: a pending assignment must
    /// exist and its build must resolve to a present artifact. The
    /// returned stream owns the open file handle; only after producing
    /// the final chunk does it call `deliver_success` and persist.
    pub async fn push_stream(&self, device_id: &DeviceId) -> Result<PushDelivery, DeliveryError> {
        let assignment = self.assignments.pending(device_id).await?;
        let resolved = self.registry.resolve(&assignment.build_id).await?;

        let mut file = File::open(&resolved.path)
            .await
            .map_err(|_| DeliveryError::ArtifactMissing {
                build_id: resolved.build_id.clone(),
                path: resolved.path.clone(),
            })?;

        info!(
            device_id = %device_id,
            build_id = %resolved.build_id,
            content_length = resolved.size,
            "Push-stream started"
        );

        let ledger = self.assignments.clone();
        let device_id = device_id.clone();
        let build_id = resolved.build_id.clone();
        let total = resolved.size;

        let stream = async_stream::try_stream! {
            let mut remaining = total;
            while remaining > 0 {
                let take = remaining.min(PUSH_CHUNK_SIZE as u64) as usize;
                let mut chunk = vec![0u8; take];
                file.read_exact(&mut chunk).await?;
                remaining -= take as u64;
                yield chunk;
            }

            // The full byte sequence has been produced; only now is
            // the delivery authoritative.
            match ledger.deliver_success(&device_id).await {
                Ok(()) => {
                    info!(device_id = %device_id, build_id = %build_id, "Push-stream delivery completed");
                }
                Err(e) => {
                    warn!(
                        device_id = %device_id,
                        build_id = %build_id,
                        error = %e,
                        "Push-stream finished but completion was not recorded"
                    );
                }
            }
        };

        Ok(PushDelivery {
            build_id: resolved.build_id,
            content_length: total,
            stream: Box::pin(stream),
        })
    }
}
