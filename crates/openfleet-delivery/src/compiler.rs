//! Compiler collaborator contract
//!
//! The toolchain that turns source text into a firmware image lives
//! outside this system. Only its output contract is modeled: success
//! or failure, the build id and artifact on success, and the toolchain
//! logs either way.

use async_trait::async_trait;
use fleet_ota_schemas::BuildId;
use std::path::PathBuf;

/// Result of one compile invocation
#[derive(Debug, Clone)]
pub enum CompileOutcome {
    /// The toolchain produced an application image
    Success {
        /// Freshly generated build id
        build_id: BuildId,
        /// Path to the produced artifact
        artifact: PathBuf,
        /// Toolchain stdout
        logs: String,
    },
    /// The toolchain failed or produced no usable image
    Failure {
        /// Toolchain stderr or a diagnostic message
        logs: String,
    },
}

impl CompileOutcome {
    /// Whether the invocation produced an artifact
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Success { .. })
    }
}

/// Capability interface for the external firmware compiler
#[async_trait]
pub trait FirmwareCompiler: Send + Sync {
    /// Compile source text into a firmware artifact
    ///
    /// # Errors
    ///
    /// Returns an error only when the collaborator itself cannot be
    /// invoked; a toolchain diagnostic is a [`CompileOutcome::Failure`],
    /// not an error.
    async fn compile(&self, source: &str) -> anyhow::Result<CompileOutcome>;
}
