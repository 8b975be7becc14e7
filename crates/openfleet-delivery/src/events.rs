//! Fallback event log
//!
//! Devices report their fallback delivery attempts here
//! (started/success/failed by convention). Appends are unconditional:
//! no status validation, no deduplication, no relationship enforced to
//! live assignments. Storage is unbounded; reads are capped to the
//! most recent window.

use fleet_ota_schemas::{BuildId, DeviceId};
use openfleet_store::{FallbackEvent, OtaStore, EVENT_WINDOW};
use std::sync::Arc;
use tracing::info;

/// Append-only audit trail of device-reported fallback events
#[derive(Debug, Clone)]
pub struct EventLog {
    store: Arc<OtaStore>,
}

impl EventLog {
    /// Create an event log view over the store
    pub fn new(store: Arc<OtaStore>) -> Self {
        Self { store }
    }

    /// Append a device-reported event with a server-assigned timestamp
    ///
    /// Best-effort: the event is always kept in memory; a failed save
    /// is logged but not surfaced, since event reporting never fails
    /// for the device.
    pub async fn append(
        &self,
        device_id: DeviceId,
        build_id: BuildId,
        status: String,
        reason: String,
    ) -> FallbackEvent {
        let event = FallbackEvent {
            device_id,
            build_id,
            status,
            reason,
            timestamp: chrono::Utc::now(),
        };

        info!(
            device_id = %event.device_id,
            build_id = %event.build_id,
            status = %event.status,
            "Fallback event logged"
        );

        self.store
            .mutate_best_effort(|state| {
                state.events.push(event.clone());
            })
            .await;

        event
    }

    /// The most recent events, append order, capped to the read window
    pub async fn recent(&self) -> Vec<FallbackEvent> {
        self.store
            .read(|state| state.recent_events(EVENT_WINDOW))
            .await
    }

    /// Total number of events ever logged
    pub async fn len(&self) -> usize {
        self.store.read(|state| state.events.len()).await
    }

    /// Whether no events have been logged yet
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
