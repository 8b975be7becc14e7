//! Request and response shapes for the OTA HTTP surface
//!
//! These are the wire contracts devices and operators depend on. Field
//! names are part of the protocol; renaming them breaks fielded
//! firmware.

use crate::domain::{BuildId, DeviceId};
use serde::{Deserialize, Serialize};

/// `POST /ota/assign` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRequest {
    pub device_id: DeviceId,
    pub build_id: BuildId,
}

/// `POST /ota/assign` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignResponse {
    pub status: String,
    pub device_id: DeviceId,
    pub build_id: BuildId,
}

impl AssignResponse {
    /// Build the canonical "assigned" acknowledgement
    pub fn assigned(device_id: DeviceId, build_id: BuildId) -> Self {
        Self {
            status: "assigned".to_string(),
            device_id,
            build_id,
        }
    }
}

/// `GET /ota/check` response
///
/// `build_id` is present exactly when `update` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<BuildId>,
}

impl PollResponse {
    /// No pending update for the device
    pub fn no_update() -> Self {
        Self {
            update: false,
            build_id: None,
        }
    }

    /// A pending update for the given build
    pub fn pending(build_id: BuildId) -> Self {
        Self {
            update: true,
            build_id: Some(build_id),
        }
    }
}

/// `POST /ota/events` request body
///
/// `status` is a free-form label; devices conventionally report
/// `started`, `success` or `failed` but nothing enforces that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventReport {
    pub device_id: DeviceId,
    pub build_id: BuildId,
    pub status: String,
    #[serde(default)]
    pub reason: String,
}

/// `POST /ota/events` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogged {
    pub status: String,
}

impl EventLogged {
    /// The canonical "logged" acknowledgement
    pub fn logged() -> Self {
        Self {
            status: "logged".to_string(),
        }
    }
}

/// `POST /firmware/compile` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    pub code: String,
}

/// `POST /firmware/compile` response
///
/// Mirrors the compiler collaborator's output contract: success flag,
/// the registered build id on success, and the toolchain logs either
/// way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<BuildId>,
    pub logs: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_response_omits_build_id_when_no_update() {
        let json = serde_json::to_value(PollResponse::no_update()).expect("serialize");
        assert_eq!(json, serde_json::json!({"update": false}));
    }

    #[test]
    fn test_poll_response_carries_build_id_when_pending() {
        let build: BuildId = "b1".parse().expect("valid id");
        let json = serde_json::to_value(PollResponse::pending(build)).expect("serialize");
        assert_eq!(json, serde_json::json!({"update": true, "build_id": "b1"}));
    }

    #[test]
    fn test_event_report_reason_defaults_to_empty() {
        let report: EventReport = serde_json::from_value(serde_json::json!({
            "device_id": "dev-a",
            "build_id": "b1",
            "status": "started"
        }))
        .expect("deserialize");
        assert_eq!(report.reason, "");
    }

    #[test]
    fn test_assign_request_rejects_malformed_ids() {
        let result: Result<AssignRequest, _> = serde_json::from_value(serde_json::json!({
            "device_id": "",
            "build_id": "b1"
        }));
        assert!(result.is_err());
    }
}
