//! Firmware registry
//!
//! In-memory view over the store's firmware section. Entries are
//! immutable once registered and are never deleted (no GC policy is
//! defined). Artifact presence is verified at resolve time, not at
//! registration time.

use crate::compiler::{CompileOutcome, FirmwareCompiler};
use crate::error::DeliveryError;
use fleet_ota_schemas::BuildId;
use openfleet_store::OtaStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// A build resolved to a readable artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub build_id: BuildId,
    pub path: PathBuf,
    /// Size in bytes, read from storage at resolve time, never cached
    pub size: u64,
}

impl ResolvedArtifact {
    /// Download filename for the artifact, falling back to the build id
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.bin", self.build_id))
    }
}

/// Registry of compiled firmware builds
#[derive(Debug, Clone)]
pub struct FirmwareRegistry {
    store: Arc<OtaStore>,
}

impl FirmwareRegistry {
    /// Create a registry view over the store
    pub fn new(store: Arc<OtaStore>) -> Self {
        Self { store }
    }

    /// Register a new immutable build entry and persist the store
    pub async fn register(
        &self,
        build_id: BuildId,
        artifact: PathBuf,
    ) -> Result<(), DeliveryError> {
        info!(build_id = %build_id, artifact = ?artifact, "Registering firmware build");

        self.store
            .mutate(|state| {
                state.firmware.insert(build_id.clone(), artifact.clone());
            })
            .await?;

        Ok(())
    }

    /// Resolve a build id to its artifact, verifying the bytes are
    /// still present at the registered location
    pub async fn resolve(&self, build_id: &BuildId) -> Result<ResolvedArtifact, DeliveryError> {
        let path = self
            .store
            .read(|state| state.firmware.get(build_id).cloned())
            .await
            .ok_or_else(|| DeliveryError::UnknownBuild(build_id.clone()))?;

        let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
            warn!(build_id = %build_id, path = ?path, error = %e, "Registered artifact missing from storage");
            DeliveryError::ArtifactMissing {
                build_id: build_id.clone(),
                path: path.clone(),
            }
        })?;

        Ok(ResolvedArtifact {
            build_id: build_id.clone(),
            path,
            size: metadata.len(),
        })
    }

    /// Compile source through the collaborator and register the
    /// resulting artifact on success
    ///
    /// The compiler itself is opaque; only its output contract matters
    /// here. A failed compile registers nothing.
    pub async fn register_compiled(
        &self,
        compiler: &dyn FirmwareCompiler,
        source: &str,
    ) -> anyhow::Result<CompileOutcome> {
        let outcome = compiler.compile(source).await?;

        if let CompileOutcome::Success {
            build_id, artifact, ..
        } = &outcome
        {
            self.register(build_id.clone(), artifact.clone()).await?;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn build(id: &str) -> BuildId {
        id.parse().expect("valid build id")
    }

    async fn registry_with_dir() -> (FirmwareRegistry, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let store = OtaStore::open(temp_dir.path().join("ota_store.json"))
            .await
            .expect("open store");
        (FirmwareRegistry::new(Arc::new(store)), temp_dir)
    }

    #[tokio::test]
    async fn test_resolve_unknown_build() {
        let (registry, _dir) = registry_with_dir().await;
        let result = registry.resolve(&build("nope")).await;
        assert!(matches!(result, Err(DeliveryError::UnknownBuild(_))));
    }

    #[tokio::test]
    async fn test_register_and_resolve_reads_size_from_storage() {
        let (registry, dir) = registry_with_dir().await;
        let artifact = dir.path().join("b1.ino.bin");
        tokio::fs::write(&artifact, vec![0xAB; 1234])
            .await
            .expect("write artifact");

        registry
            .register(build("b1"), artifact.clone())
            .await
            .expect("register");

        let resolved = registry.resolve(&build("b1")).await.expect("resolve");
        assert_eq!(resolved.path, artifact);
        assert_eq!(resolved.size, 1234);
        assert_eq!(resolved.filename(), "b1.ino.bin");

        // Size is derived at read time: growing the file is visible on
        // the next resolve.
        tokio::fs::write(&artifact, vec![0xAB; 2000])
            .await
            .expect("rewrite artifact");
        let resolved = registry.resolve(&build("b1")).await.expect("resolve again");
        assert_eq!(resolved.size, 2000);
    }

    #[tokio::test]
    async fn test_registered_build_with_missing_artifact_is_delivery_time_error() {
        let (registry, dir) = registry_with_dir().await;
        let artifact = dir.path().join("gone.bin");

        // Registration does not verify presence.
        registry
            .register(build("b1"), artifact)
            .await
            .expect("register succeeds without artifact");

        let result = registry.resolve(&build("b1")).await;
        assert!(matches!(
            result,
            Err(DeliveryError::ArtifactMissing { .. })
        ));
    }

    struct FakeCompiler {
        out_dir: PathBuf,
        succeed: bool,
    }

    #[async_trait]
    impl FirmwareCompiler for FakeCompiler {
        async fn compile(&self, source: &str) -> anyhow::Result<CompileOutcome> {
            if !self.succeed {
                return Ok(CompileOutcome::Failure {
                    logs: "compile error".to_string(),
                });
            }
            let build_id = BuildId::generate();
            let artifact = self.out_dir.join(format!("{build_id}.ino.bin"));
            tokio::fs::write(&artifact, source.as_bytes()).await?;
            Ok(CompileOutcome::Success {
                build_id,
                artifact,
                logs: "ok".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_successful_compile_registers_artifact() {
        let (registry, dir) = registry_with_dir().await;
        let compiler = FakeCompiler {
            out_dir: dir.path().to_path_buf(),
            succeed: true,
        };

        let outcome = registry
            .register_compiled(&compiler, "void loop() {}")
            .await
            .expect("compile");

        let build_id = match outcome {
            CompileOutcome::Success { build_id, .. } => Some(build_id),
            CompileOutcome::Failure { .. } => None,
        }
        .expect("successful outcome");
        let resolved = registry.resolve(&build_id).await.expect("resolve");
        assert_eq!(resolved.size, "void loop() {}".len() as u64);
    }

    #[tokio::test]
    async fn test_failed_compile_registers_nothing() {
        let (registry, dir) = registry_with_dir().await;
        let compiler = FakeCompiler {
            out_dir: dir.path().to_path_buf(),
            succeed: false,
        };

        let outcome = registry
            .register_compiled(&compiler, "broken")
            .await
            .expect("compile call itself succeeds");
        assert!(matches!(outcome, CompileOutcome::Failure { .. }));

        let empty = registry
            .store
            .read(|state| state.firmware.is_empty())
            .await;
        assert!(empty);
    }
}
