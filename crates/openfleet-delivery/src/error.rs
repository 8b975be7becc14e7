//! Delivery error taxonomy
//!
//! Not-found conditions are deliberately fine-grained so callers can
//! tell "never assigned" apart from "assigned but the binary
//! disappeared".

use fleet_ota_schemas::{BuildId, DeviceId};
use openfleet_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from registry lookups, assignment transitions and delivery
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The build id was never registered
    #[error("Unknown firmware build: {0}")]
    UnknownBuild(BuildId),

    /// The build is registered but its artifact is gone from storage.
    /// Storage and registry are allowed to desynchronize; this is a
    /// delivery-time failure, not a registration-time one.
    #[error("Firmware artifact missing for build {build_id} at {path:?}")]
    ArtifactMissing {
        /// The registered build
        build_id: BuildId,
        /// Where the artifact was expected
        path: PathBuf,
    },

    /// The device has never been assigned a build
    #[error("Device never assigned a build: {0}")]
    NeverAssigned(DeviceId),

    /// The device has an assignment but it is not pending
    #[error("No pending assignment for device {device_id} (status: {status})")]
    NotPending {
        /// The polling/pushed device
        device_id: DeviceId,
        /// Current assignment status
        status: &'static str,
    },

    /// The store could not be persisted; the in-memory mutation was
    /// kept but this request must surface the failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Reading the artifact from durable storage failed
    #[error("Firmware artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeliveryError {
    /// Whether the error is a not-found condition (caller-visible 404)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DeliveryError::UnknownBuild(_)
                | DeliveryError::ArtifactMissing { .. }
                | DeliveryError::NeverAssigned(_)
                | DeliveryError::NotPending { .. }
        )
    }
}
