//! Assignment state machine
//!
//! Two states, `pending` and `completed`. `assign` always overwrites
//! and re-enters `pending`; only a completing push-stream calls
//! `deliver_success`. Polling is read-only and idempotent: a device
//! that already completed its update stops being told to update.

use crate::error::DeliveryError;
use fleet_ota_schemas::{BuildId, DeviceId};
use openfleet_store::{Assignment, OtaStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-device OTA assignment records
#[derive(Debug, Clone)]
pub struct AssignmentLedger {
    store: Arc<OtaStore>,
}

impl AssignmentLedger {
    /// Create a ledger view over the store
    pub fn new(store: Arc<OtaStore>) -> Self {
        Self { store }
    }

    /// Assign a build to a device
    ///
    /// Always permitted from any state; unconditionally overwrites the
    /// previous assignment and stamps `assigned_at`. Build existence
    /// is deliberately not checked here; a later delivery fails
    /// gracefully instead.
    pub async fn assign(
        &self,
        device_id: DeviceId,
        build_id: BuildId,
    ) -> Result<(), DeliveryError> {
        info!(device_id = %device_id, build_id = %build_id, "Assigning build to device");

        self.store
            .mutate(|state| {
                state
                    .assignments
                    .insert(device_id.clone(), Assignment::pending(build_id.clone()));
            })
            .await?;

        Ok(())
    }

    /// What a polling device should be told
    ///
    /// Returns the pending build id, or `None` for devices that were
    /// never assigned or have already completed. Never fails.
    pub async fn poll(&self, device_id: &DeviceId) -> Option<BuildId> {
        self.store
            .read(|state| {
                state
                    .assignments
                    .get(device_id)
                    .filter(|a| a.is_pending())
                    .map(|a| a.build_id.clone())
            })
            .await
    }

    /// The device's current assignment record, regardless of status
    pub async fn get(&self, device_id: &DeviceId) -> Option<Assignment> {
        self.store
            .read(|state| state.assignments.get(device_id).cloned())
            .await
    }

    /// The device's pending assignment, with fine-grained not-found
    /// errors for the push precondition check
    pub async fn pending(&self, device_id: &DeviceId) -> Result<Assignment, DeliveryError> {
        let assignment = self
            .get(device_id)
            .await
            .ok_or_else(|| DeliveryError::NeverAssigned(device_id.clone()))?;

        if !assignment.is_pending() {
            return Err(DeliveryError::NotPending {
                device_id: device_id.clone(),
                status: assignment.status.as_str(),
            });
        }

        Ok(assignment)
    }

    /// Record a successful push-stream delivery
    ///
    /// Transitions `pending` → `completed`, stamps `completed_at` and
    /// persists. The check and the transition happen in one critical
    /// section so two racing completions cannot both succeed.
    pub async fn deliver_success(&self, device_id: &DeviceId) -> Result<(), DeliveryError> {
        let transition = self
            .store
            .mutate(|state| match state.assignments.get_mut(device_id) {
                Some(assignment) if assignment.is_pending() => {
                    assignment.complete();
                    Ok(assignment.build_id.clone())
                }
                Some(assignment) => Err(DeliveryError::NotPending {
                    device_id: device_id.clone(),
                    status: assignment.status.as_str(),
                }),
                None => Err(DeliveryError::NeverAssigned(device_id.clone())),
            })
            .await?;

        match transition {
            Ok(build_id) => {
                info!(device_id = %device_id, build_id = %build_id, "Assignment completed");
                Ok(())
            }
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Completion rejected");
                Err(e)
            }
        }
    }
}
