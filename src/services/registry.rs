//! In-memory media item registry
//!
//! Holds every imported item for the life of the process, in import
//! order. All mutation funnels through this service so the dedup
//! invariant and the release-exactly-once handle discipline hold no
//! matter which import path (local files, folder scan, URL) fed it.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::{EventBus, SoundcheckEvent};
use crate::models::{AnalysisResult, MediaItem, Settings, SourceBlob};
use crate::services::duration_probe::DurationProbe;

/// What happened to a multi-blob `add` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOutcome {
    /// Ids of the items actually created, in input order
    pub added: Vec<Uuid>,
    /// Blobs silently dropped because their dedup key was taken
    pub duplicates_filtered: usize,
    /// Blobs rejected by the supported-media predicate
    pub unsupported: usize,
}

/// Shared item store, used as `Arc<MediaItemRegistry>`
pub struct MediaItemRegistry {
    items: RwLock<Vec<MediaItem>>,
    probe: Arc<dyn DurationProbe>,
    events: EventBus,
}

impl MediaItemRegistry {
    pub fn new(probe: Arc<dyn DurationProbe>, events: EventBus) -> Arc<Self> {
        Arc::new(Self {
            items: RwLock::new(Vec::new()),
            probe,
            events,
        })
    }

    /// Import a batch of blobs.
    ///
    /// Unsupported blobs are skipped. Duplicates (same name, byte size,
    /// last-modified as an existing item) are silently dropped, with
    /// one aggregate [`SoundcheckEvent::DuplicatesFiltered`] if any
    /// were. Each surviving blob becomes an item with a fresh id and
    /// playback handle, and gets a background duration probe.
    pub async fn add(self: &Arc<Self>, blobs: Vec<SourceBlob>, settings: &Settings) -> AddOutcome {
        let mut outcome = AddOutcome::default();
        let mut store = self.items.write().await;

        for blob in blobs {
            if !blob.is_supported_media() {
                debug!(name = %blob.name, mime = %blob.mime_type, "skipping unsupported source");
                outcome.unsupported += 1;
                continue;
            }

            let key = blob.dedup_key();
            if store.iter().any(|item| item.blob.dedup_key() == key) {
                debug!(name = %blob.name, "skipping duplicate source");
                outcome.duplicates_filtered += 1;
                continue;
            }

            let item = MediaItem::new(blob, settings);
            info!(item_id = %item.id, name = %item.blob.name, "item imported");
            self.events.emit_lossy(SoundcheckEvent::ItemImported {
                item_id: item.id,
                name: item.blob.name.clone(),
                timestamp: chrono::Utc::now(),
            });

            self.spawn_probe(&item);
            outcome.added.push(item.id);
            store.push(item);
        }
        drop(store);

        if outcome.duplicates_filtered > 0 {
            self.events.emit_lossy(SoundcheckEvent::DuplicatesFiltered {
                count: outcome.duplicates_filtered,
                timestamp: chrono::Utc::now(),
            });
        }
        outcome
    }

    /// Single-blob import path (URL imports). Unlike [`add`], rejection
    /// is reported to the caller instead of silently counted.
    ///
    /// [`add`]: MediaItemRegistry::add
    pub async fn import_single(self: &Arc<Self>, blob: SourceBlob, settings: &Settings) -> Result<Uuid> {
        if !blob.is_supported_media() {
            return Err(Error::UnsupportedFormat(blob.name));
        }

        let mut store = self.items.write().await;
        let key = blob.dedup_key();
        if store.iter().any(|item| item.blob.dedup_key() == key) {
            return Err(Error::Duplicate(blob.name));
        }

        let item = MediaItem::new(blob, settings);
        let id = item.id;
        info!(item_id = %id, name = %item.blob.name, "item imported");
        self.events.emit_lossy(SoundcheckEvent::ItemImported {
            item_id: id,
            name: item.blob.name.clone(),
            timestamp: chrono::Utc::now(),
        });
        self.spawn_probe(&item);
        store.push(item);
        Ok(id)
    }

    fn spawn_probe(self: &Arc<Self>, item: &MediaItem) {
        let registry = Arc::clone(self);
        let probe = Arc::clone(&self.probe);
        let blob = item.blob.clone();
        let id = item.id;
        tokio::spawn(async move {
            let result =
                tokio::task::spawn_blocking(move || probe.probe(&blob)).await;
            match result {
                Ok(Ok(duration)) => registry.update_duration(id, Some(duration), None).await,
                Ok(Err(e)) => {
                    warn!(item_id = %id, error = %e, "duration probe failed");
                    registry.update_duration(id, None, Some(e.to_string())).await;
                }
                Err(e) => {
                    warn!(item_id = %id, error = %e, "duration probe task panicked");
                    registry
                        .update_duration(id, None, Some(format!("probe task failed: {}", e)))
                        .await;
                }
            }
        });
    }

    /// Remove one item, releasing its playback handle. Returns whether
    /// anything was removed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut store = self.items.write().await;
        let Some(pos) = store.iter().position(|item| item.id == id) else {
            return false;
        };
        let item = store.remove(pos);
        drop(store);

        item.playback.release();
        info!(item_id = %id, name = %item.blob.name, "item removed");
        self.events.emit_lossy(SoundcheckEvent::ItemRemoved {
            item_id: id,
            timestamp: chrono::Utc::now(),
        });
        true
    }

    /// Remove everything, releasing every playback handle.
    pub async fn clear(&self) {
        let mut store = self.items.write().await;
        let removed = std::mem::take(&mut *store);
        drop(store);

        for item in &removed {
            item.playback.release();
        }
        info!(count = removed.len(), "registry cleared");
        self.events.emit_lossy(SoundcheckEvent::RegistryCleared {
            count: removed.len(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Attach a completed analysis. No-op when the item has been
    /// removed in the meantime; a late result never resurrects it.
    pub async fn set_analysis_result(&self, id: Uuid, result: AnalysisResult) {
        let mut store = self.items.write().await;
        if let Some(item) = store.iter_mut().find(|item| item.id == id) {
            item.analysis = Some(result);
            item.last_error = None;
        } else {
            debug!(item_id = %id, "dropping analysis result for removed item");
        }
    }

    /// Duration-probe write-back. No-op for absent ids.
    pub async fn update_duration(&self, id: Uuid, duration: Option<f64>, error: Option<String>) {
        let mut store = self.items.write().await;
        if let Some(item) = store.iter_mut().find(|item| item.id == id) {
            item.duration = duration;
            if let Some(error) = error {
                item.last_error = Some(error);
            }
            drop(store);
            self.events.emit_lossy(SoundcheckEvent::DurationProbed {
                item_id: id,
                duration,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Record a non-fatal per-item analysis failure. Any previous
    /// analysis result is kept. No-op for absent ids.
    pub async fn record_analysis_failure(&self, id: Uuid, error: String) {
        let mut store = self.items.write().await;
        if let Some(item) = store.iter_mut().find(|item| item.id == id) {
            item.last_error = Some(error);
        }
    }

    /// Snapshot of all items in import order
    pub async fn items(&self) -> Vec<MediaItem> {
        self.items.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<MediaItem> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}
