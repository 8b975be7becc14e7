//! The persisted OTA state document
//!
//! Exactly three collections make up the durable state: firmware
//! builds, device assignments, and fallback events. The document is
//! serialized as a whole and rewritten on every mutation; there is no
//! incremental patching.

use chrono::{DateTime, Utc};
use fleet_ota_schemas::{BuildId, DeviceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Assignment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    /// The device should fetch the assigned build
    Pending,
    /// A push-stream delivery completed for this assignment
    Completed,
}

impl AssignmentStatus {
    /// The wire label for this status
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Completed => "completed",
        }
    }
}

/// The record of which build a device should be running next
///
/// Exactly one assignment exists per device; a new assignment
/// unconditionally overwrites the previous one. There is no transition
/// out of `Completed` except a fresh assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub build_id: BuildId,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Create a fresh pending assignment stamped with the current time
    pub fn pending(build_id: BuildId) -> Self {
        Self {
            build_id,
            status: AssignmentStatus::Pending,
            assigned_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Whether a polling device should be told to update
    pub fn is_pending(&self) -> bool {
        self.status == AssignmentStatus::Pending
    }

    /// Mark the assignment delivered, stamping the completion time
    pub fn complete(&mut self) {
        self.status = AssignmentStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}

/// A device-reported record of a fallback delivery attempt
///
/// `status` is a free-form label (`started`/`success`/`failed` by
/// convention) and is deliberately not validated. Events may reference
/// builds or devices with no live assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackEvent {
    pub device_id: DeviceId,
    pub build_id: BuildId,
    pub status: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Read window for the event log
pub const EVENT_WINDOW: usize = 50;

/// The whole persisted state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    /// Firmware builds keyed by id, artifact path as an opaque string
    #[serde(default)]
    pub firmware: HashMap<BuildId, PathBuf>,
    /// Per-device assignment records
    #[serde(default)]
    pub assignments: HashMap<DeviceId, Assignment>,
    /// Append-only fallback event log
    #[serde(default)]
    pub events: Vec<FallbackEvent>,
}

impl StoreState {
    /// The most recent `n` events in append order (oldest of the
    /// window first), never more than currently logged.
    pub fn recent_events(&self, n: usize) -> Vec<FallbackEvent> {
        let start = self.events.len().saturating_sub(n);
        self.events.get(start..).unwrap_or_default().to_vec()
    }

    /// Parse a persisted document, upgrading any legacy assignment
    /// representation (a bare build-id string) into a full record.
    ///
    /// Returns the state and whether any record was migrated; a
    /// migrated state must be saved back immediately by the caller.
    pub fn from_json(json: &str) -> Result<(Self, bool), serde_json::Error> {
        let raw: RawDocument = serde_json::from_str(json)?;

        let mut migrated = false;
        let assignments = raw
            .assignments
            .into_iter()
            .map(|(device_id, record)| match record {
                RawAssignment::Record(assignment) => (device_id, assignment),
                RawAssignment::LegacyBuildId(build_id) => {
                    debug!(device_id = %device_id, build_id = %build_id, "Migrating legacy assignment");
                    migrated = true;
                    (device_id, Assignment::pending(build_id))
                }
            })
            .collect();

        Ok((
            Self {
                firmware: raw.firmware,
                assignments,
                events: raw.events,
            },
            migrated,
        ))
    }

    /// Serialize the full document for persistence
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    firmware: HashMap<BuildId, PathBuf>,
    #[serde(default)]
    assignments: HashMap<DeviceId, RawAssignment>,
    #[serde(default)]
    events: Vec<FallbackEvent>,
}

/// Pre-migration assignments were persisted as a bare build-id string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAssignment {
    Record(Assignment),
    LegacyBuildId(BuildId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str) -> DeviceId {
        id.parse().expect("valid device id")
    }

    fn build(id: &str) -> BuildId {
        id.parse().expect("valid build id")
    }

    fn event(device_id: &str, status: &str) -> FallbackEvent {
        FallbackEvent {
            device_id: device(device_id),
            build_id: build("b1"),
            status: status.to_string(),
            reason: String::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_document_round_trip() {
        let state = StoreState::default();
        let json = state.to_json().expect("serialize");
        let (loaded, migrated) = StoreState::from_json(&json).expect("parse");
        assert_eq!(loaded, state);
        assert!(!migrated);
    }

    #[test]
    fn test_full_round_trip_preserves_collections() {
        let mut state = StoreState::default();
        state
            .firmware
            .insert(build("b1"), PathBuf::from("firmware_bins/b1.ino.bin"));
        state
            .assignments
            .insert(device("dev-a"), Assignment::pending(build("b1")));
        state.events.push(event("dev-a", "started"));

        let json = state.to_json().expect("serialize");
        let (loaded, migrated) = StoreState::from_json(&json).expect("parse");

        assert!(!migrated);
        assert_eq!(loaded, state);
        assert_eq!(
            loaded.firmware.get(&build("b1")),
            Some(&PathBuf::from("firmware_bins/b1.ino.bin"))
        );
    }

    #[test]
    fn test_legacy_assignment_migrates_to_pending_record() {
        let json = r#"{
            "firmware": {},
            "assignments": {"dev-a": "b1"},
            "events": []
        }"#;

        let (state, migrated) = StoreState::from_json(json).expect("parse");

        assert!(migrated);
        let assignment = state
            .assignments
            .get(&device("dev-a"))
            .expect("assignment present");
        assert_eq!(assignment.build_id, build("b1"));
        assert_eq!(assignment.status, AssignmentStatus::Pending);
        assert!(assignment.completed_at.is_none());
    }

    #[test]
    fn test_modern_document_does_not_report_migration() {
        let state = StoreState {
            assignments: HashMap::from([(device("dev-a"), Assignment::pending(build("b1")))]),
            ..Default::default()
        };
        let json = state.to_json().expect("serialize");
        let (_, migrated) = StoreState::from_json(&json).expect("parse");
        assert!(!migrated);
    }

    #[test]
    fn test_missing_collections_synthesize_empty() {
        let (state, migrated) = StoreState::from_json("{}").expect("parse");
        assert!(state.firmware.is_empty());
        assert!(state.assignments.is_empty());
        assert!(state.events.is_empty());
        assert!(!migrated);
    }

    #[test]
    fn test_recent_events_caps_and_preserves_order() {
        let mut state = StoreState::default();
        for i in 0..120 {
            state.events.push(event("dev-a", &format!("status-{i}")));
        }

        let window = state.recent_events(EVENT_WINDOW);
        assert_eq!(window.len(), EVENT_WINDOW);
        assert_eq!(window.first().map(|e| e.status.as_str()), Some("status-70"));
        assert_eq!(window.last().map(|e| e.status.as_str()), Some("status-119"));
    }

    #[test]
    fn test_recent_events_returns_fewer_when_log_is_short() {
        let mut state = StoreState::default();
        state.events.push(event("dev-a", "started"));
        assert_eq!(state.recent_events(EVENT_WINDOW).len(), 1);
    }

    #[test]
    fn test_assignment_completion_stamps_time_after_assignment() {
        let mut assignment = Assignment::pending(build("b1"));
        assignment.complete();
        assert_eq!(assignment.status, AssignmentStatus::Completed);
        let completed_at = assignment.completed_at.expect("completion stamped");
        assert!(completed_at >= assignment.assigned_at);
    }
}
