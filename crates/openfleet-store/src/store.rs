//! The OTA store handle
//!
//! `OtaStore` owns the in-memory state and the on-disk document. All
//! mutations go through [`OtaStore::mutate`], which holds the write
//! lock across the whole "mutate → persist" sequence; that single
//! critical section is what makes per-device transitions linearizable
//! and gives the store file one writer.

use crate::error::StoreError;
use crate::state::StoreState;
use crate::storage;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Handle to the durable OTA state
#[derive(Debug)]
pub struct OtaStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl OtaStore {
    /// Open the store, loading prior state from disk
    ///
    /// Synthesizes an empty state when no file exists. A legacy
    /// assignment representation is upgraded on load and saved back
    /// immediately. A corrupt or unreadable store file is a fatal
    /// error; no partial recovery is attempted.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let state = if path.exists() {
            let json =
                storage::read_to_string(&path)
                    .await
                    .map_err(|e| StoreError::LoadFailed {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;

            let (state, migrated) =
                StoreState::from_json(&json).map_err(|e| StoreError::LoadFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;

            if migrated {
                info!(path = ?path, "Legacy assignments migrated, saving upgraded store");
                persist(&path, &state).await?;
            }

            info!(
                path = ?path,
                builds = state.firmware.len(),
                assignments = state.assignments.len(),
                events = state.events.len(),
                "OTA store loaded"
            );
            state
        } else {
            info!(path = ?path, "No prior store file, starting empty");
            StoreState::default()
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Read from the state under the shared lock
    pub async fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        let state = self.state.read().await;
        f(&state)
    }

    /// Mutate the state and persist it as one critical section
    ///
    /// The closure's effect is applied to the in-memory state first;
    /// if the subsequent save fails the mutation is *kept* (the
    /// in-memory collections remain authoritative) and the failure is
    /// reported to the caller.
    pub async fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> Result<T, StoreError> {
        let mut state = self.state.write().await;
        let value = f(&mut state);

        if let Err(e) = persist(&self.path, &state).await {
            error!(path = ?self.path, error = %e, "Store save failed, in-memory state retained");
            return Err(e);
        }

        Ok(value)
    }

    /// Mutate the state, logging instead of failing when the save
    /// does not go through
    ///
    /// Used by best-effort paths (event reporting) where the caller
    /// never sees a persistence failure.
    pub async fn mutate_best_effort<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        let mut state = self.state.write().await;
        let value = f(&mut state);

        if let Err(e) = persist(&self.path, &state).await {
            warn!(path = ?self.path, error = %e, "Best-effort mutation not persisted");
        }

        value
    }

    /// Store file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn persist(path: &Path, state: &StoreState) -> Result<(), StoreError> {
    let json = state.to_json()?;
    storage::write_atomic(path, &json)
        .await
        .map_err(|e| StoreError::SaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
