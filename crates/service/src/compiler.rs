//! Subprocess-backed firmware compiler
//!
//! Writes the submitted source into a per-build scratch sketch,
//! invokes the configured toolchain with a wall-clock timeout, and
//! picks the application image out of the output directory. The
//! toolchain emits several images per compile (bootloader, partition
//! table, merged flash image); only the application `.ino.bin` is
//! valid for over-the-air flashing, and it is reliably the largest of
//! the remaining candidates.

use crate::config::CompilerConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fleet_ota_schemas::BuildId;
use openfleet_delivery::{CompileOutcome, FirmwareCompiler};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Image name fragments that mark non-application artifacts
const NON_APP_IMAGES: [&str; 3] = ["bootloader", "partitions", "merged"];

/// [`FirmwareCompiler`] implementation shelling out to an external
/// toolchain such as `arduino-cli`
pub struct CommandCompiler {
    config: CompilerConfig,
    build_dir: PathBuf,
    output_dir: PathBuf,
}

impl CommandCompiler {
    /// Create a compiler writing sketches under `build_dir` and
    /// images under `output_dir`
    pub fn new(config: CompilerConfig, build_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            config,
            build_dir,
            output_dir,
        }
    }

    /// Write the source into a fresh per-build sketch directory
    ///
    /// The sketch file must share its directory's name or the
    /// toolchain rejects it.
    async fn write_sketch(&self, build_id: &BuildId, source: &str) -> Result<PathBuf> {
        let sketch_dir = self.build_dir.join(build_id.as_ref());
        tokio::fs::create_dir_all(&sketch_dir)
            .await
            .with_context(|| format!("Failed to create sketch dir {}", sketch_dir.display()))?;

        let ino_path = sketch_dir.join(format!("{build_id}.ino"));
        tokio::fs::write(&ino_path, source)
            .await
            .with_context(|| format!("Failed to write sketch {}", ino_path.display()))?;

        Ok(sketch_dir)
    }

    /// Pick the application image: largest `*.ino.bin` that is not a
    /// bootloader, partition table, or merged flash image
    async fn find_app_image(&self) -> Result<Option<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.output_dir)
            .await
            .with_context(|| format!("Failed to read output dir {}", self.output_dir.display()))?;

        let mut best: Option<(u64, PathBuf)> = None;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_app_image(&path) {
                continue;
            }
            let size = entry.metadata().await?.len();
            if best.as_ref().is_none_or(|(best_size, _)| size > *best_size) {
                best = Some((size, path));
            }
        }

        Ok(best.map(|(_, path)| path))
    }
}

fn is_app_image(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".ino.bin") && !NON_APP_IMAGES.iter().any(|x| name.contains(x))
}

#[async_trait]
impl FirmwareCompiler for CommandCompiler {
    async fn compile(&self, source: &str) -> Result<CompileOutcome> {
        let build_id = BuildId::generate();

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create output dir {}", self.output_dir.display()))?;

        let sketch_dir = self.write_sketch(&build_id, source).await?;

        let mut cmd = Command::new(&self.config.command);
        cmd.arg("compile")
            .arg("--fqbn")
            .arg(&self.config.fqbn)
            .arg("--output-dir")
            .arg(&self.output_dir)
            .kill_on_drop(true);
        if let Some(libraries) = &self.config.libraries_dir {
            cmd.arg("--libraries").arg(libraries);
        }
        cmd.arg(&sketch_dir);

        info!(build_id = %build_id, command = %self.config.command, "Invoking firmware compiler");

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result
                .with_context(|| format!("Failed to launch compiler {}", self.config.command))?,
            Err(_) => {
                warn!(build_id = %build_id, timeout_secs = self.config.timeout_secs, "Compilation timed out");
                return Ok(CompileOutcome::Failure {
                    logs: "Compilation timed out".to_string(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(build_id = %build_id, status = ?output.status, "Compilation failed");
            return Ok(CompileOutcome::Failure { logs: stderr });
        }

        let Some(artifact) = self.find_app_image().await? else {
            return Ok(CompileOutcome::Failure {
                logs: "Application firmware (.ino.bin) not found".to_string(),
            });
        };

        info!(build_id = %build_id, artifact = ?artifact, "Compilation produced application image");

        Ok(CompileOutcome::Success {
            build_id,
            artifact,
            logs: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
