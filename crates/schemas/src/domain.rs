//! Core domain types and value objects
//!
//! Identifier newtypes enforce their invariants at the type level. All
//! construction goes through `FromStr` or `TryFrom` so every id in the
//! system has been trimmed and charset-checked exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Domain errors for value object validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid device ID: {0} (must be non-empty, alphanumeric with '-', '_' or '.')")]
    InvalidDeviceId(String),

    #[error("Invalid build ID: {0} (must be non-empty, alphanumeric with '-', '_' or '.')")]
    InvalidBuildId(String),
}

fn is_valid_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Device identifier with validation
///
/// DeviceId enforces safe construction through validation only.
/// Devices choose their own identifiers; the server treats them as
/// opaque beyond the charset check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new DeviceId with validation
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        value.into().parse()
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for DeviceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !is_valid_id(trimmed) {
            return Err(DomainError::InvalidDeviceId(s.to_string()));
        }
        Ok(DeviceId(trimmed.to_string()))
    }
}

impl TryFrom<String> for DeviceId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&str> for DeviceId {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> String {
        id.0
    }
}

/// Firmware build identifier
///
/// Build ids are globally unique and opaque. New builds get a UUID v4
/// via [`BuildId::generate`]; ids arriving over the wire go through the
/// same charset validation as device ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildId(String);

impl BuildId {
    /// Create a new BuildId with validation
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        value.into().parse()
    }

    /// Generate a fresh unique build id
    pub fn generate() -> Self {
        BuildId(uuid::Uuid::new_v4().to_string())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BuildId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for BuildId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !is_valid_id(trimmed) {
            return Err(DomainError::InvalidBuildId(s.to_string()));
        }
        Ok(BuildId(trimmed.to_string()))
    }
}

impl TryFrom<String> for BuildId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&str> for BuildId {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BuildId> for String {
    fn from(id: BuildId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_trims_whitespace() {
        let id: DeviceId = "  dev-a  ".parse().expect("valid id");
        assert_eq!(id.as_str(), "dev-a");
    }

    #[test]
    fn test_device_id_rejects_empty() {
        assert!("".parse::<DeviceId>().is_err());
        assert!("   ".parse::<DeviceId>().is_err());
    }

    #[test]
    fn test_device_id_rejects_path_characters() {
        assert!("../etc/passwd".parse::<DeviceId>().is_err());
        assert!("dev/a".parse::<DeviceId>().is_err());
    }

    #[test]
    fn test_build_id_generate_is_unique_and_valid() {
        let a = BuildId::generate();
        let b = BuildId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().parse::<BuildId>().is_ok());
    }

    #[test]
    fn test_build_id_serde_round_trip() {
        let id = BuildId::generate();
        let json = serde_json::to_string(&id).expect("serialize");
        let back: BuildId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, back);
    }

    #[test]
    fn test_device_id_deserialization_validates() {
        let result: Result<DeviceId, _> = serde_json::from_str(r#""dev/../a""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_id_serializes_as_plain_string() {
        let id: BuildId = "b1".parse().expect("valid id");
        assert_eq!(
            serde_json::to_value(&id).expect("serialize"),
            serde_json::json!("b1")
        );
    }
}
