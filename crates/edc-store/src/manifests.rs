//! Statistical manifest repository with lock enforcement.
//!
//! A manifest is keyed by (protocol number, protocol version). Once
//! locked, the stored copy rejects both overwrites and re-locks; the lock
//! is a data invariant here, not a UI convention.

use chrono::Utc;
use tracing::info;

use edc_model::StatisticalManifest;

use crate::error::{Result, StoreError};
use crate::kv::{KeyValueStore, load_collection, save_collection};

pub const MANIFESTS_KEY: &str = "statistical-manifests";

#[derive(Debug)]
pub struct ManifestStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ManifestStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn all(&self) -> Result<Vec<StatisticalManifest>> {
        load_collection(&self.store, MANIFESTS_KEY)
    }

    pub fn find(
        &self,
        protocol_number: &str,
        protocol_version: &str,
    ) -> Result<StatisticalManifest> {
        self.all()?
            .into_iter()
            .find(|m| {
                m.metadata.protocol_number == protocol_number
                    && m.metadata.protocol_version == protocol_version
            })
            .ok_or_else(|| StoreError::NotFound {
                kind: "manifest",
                key: format!("{protocol_number} v{protocol_version}"),
            })
    }

    /// Upsert a manifest. Saving over a locked manifest fails.
    pub fn save(&mut self, manifest: StatisticalManifest) -> Result<()> {
        let mut manifests = self.all()?;
        let existing = manifests.iter_mut().find(|m| {
            m.metadata.protocol_number == manifest.metadata.protocol_number
                && m.metadata.protocol_version == manifest.metadata.protocol_version
        });
        match existing {
            Some(stored) => {
                if stored.is_locked() {
                    return Err(StoreError::ManifestLocked {
                        protocol: stored.metadata.protocol_number.clone(),
                        version: stored.metadata.protocol_version.clone(),
                    });
                }
                *stored = manifest;
            }
            None => manifests.push(manifest),
        }
        save_collection(&mut self.store, MANIFESTS_KEY, &manifests)
    }

    /// Lock a stored manifest. Fails when absent or already locked.
    pub fn lock(
        &mut self,
        protocol_number: &str,
        protocol_version: &str,
        by: &str,
        reason: Option<String>,
    ) -> Result<()> {
        let mut manifests = self.all()?;
        let manifest = manifests
            .iter_mut()
            .find(|m| {
                m.metadata.protocol_number == protocol_number
                    && m.metadata.protocol_version == protocol_version
            })
            .ok_or_else(|| StoreError::NotFound {
                kind: "manifest",
                key: format!("{protocol_number} v{protocol_version}"),
            })?;
        if !manifest.lock(by, &Utc::now().to_rfc3339(), reason) {
            return Err(StoreError::ManifestLocked {
                protocol: protocol_number.to_string(),
                version: protocol_version.to_string(),
            });
        }
        info!(protocol = %protocol_number, version = %protocol_version, by = %by, "locked manifest");
        save_collection(&mut self.store, MANIFESTS_KEY, &manifests)
    }
}
