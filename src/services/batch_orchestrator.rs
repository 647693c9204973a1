//! Sequential batch analysis
//!
//! Exactly one analysis (batch or single item) runs at a time,
//! process-wide. The orchestrator owns that state machine; nothing else
//! can flip it. Items are visited strictly in import order, one decode
//! in flight at a time, and a per-item failure never aborts the rest of
//! the run.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::{EventBus, SoundcheckEvent};
use crate::models::{AnalysisResult, MediaItem};
use crate::services::decoder::Decoder;
use crate::services::loudness_analyzer;
use crate::services::registry::MediaItemRegistry;

/// Time-series density used by batch runs
pub const DEFAULT_SAMPLES_PER_SECOND: u32 = 20;

#[derive(Debug, Default)]
struct RunState {
    running: bool,
    current: Option<Uuid>,
}

/// Resets the state machine to Idle even on an early-return path
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.running = false;
            state.current = None;
        }
    }
}

/// Outcome summary of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Items targeted by the run
    pub total: usize,
    /// Items that received a fresh analysis result
    pub analyzed: usize,
    /// Items whose decode or analysis failed
    pub failed: usize,
}

/// Drives decode + analysis over the registry's items
pub struct BatchAnalysisOrchestrator {
    registry: Arc<MediaItemRegistry>,
    decoder: Arc<dyn Decoder>,
    events: EventBus,
    samples_per_second: u32,
    state: Mutex<RunState>,
}

impl BatchAnalysisOrchestrator {
    pub fn new(
        registry: Arc<MediaItemRegistry>,
        decoder: Arc<dyn Decoder>,
        events: EventBus,
        samples_per_second: u32,
    ) -> Self {
        Self {
            registry,
            decoder,
            events,
            samples_per_second,
            state: Mutex::new(RunState::default()),
        }
    }

    /// Whether an analysis (batch or single item) is in flight
    pub fn is_running(&self) -> bool {
        self.state.lock().map(|s| s.running).unwrap_or(false)
    }

    /// Id of the item currently being analyzed, if any
    pub fn currently_analyzing(&self) -> Option<Uuid> {
        self.state.lock().ok().and_then(|s| s.current)
    }

    /// Atomic Idle → Running transition
    fn try_begin(&self) -> Result<RunGuard<'_>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("run state poisoned".to_string()))?;
        if state.running {
            return Err(Error::AnalysisInProgress);
        }
        state.running = true;
        Ok(RunGuard { state: &self.state })
    }

    fn set_current(&self, id: Option<Uuid>) {
        if let Ok(mut state) = self.state.lock() {
            state.current = id;
        }
    }

    /// Analyze every item that does not yet have a result, in import
    /// order. When every item already has one (and at least one item
    /// exists), the whole registry is re-analyzed instead. An empty
    /// registry is a no-op.
    ///
    /// Returns [`Error::AnalysisInProgress`] if a run is already
    /// active; callers that want queue-and-ignore semantics simply
    /// discard that error.
    pub async fn run_batch(&self) -> Result<BatchReport> {
        let _guard = self.try_begin()?;

        let items = self.registry.items().await;
        if items.is_empty() {
            return Ok(BatchReport::default());
        }

        let mut targets: Vec<MediaItem> =
            items.iter().filter(|i| i.analysis.is_none()).cloned().collect();
        if targets.is_empty() {
            // Everything is analyzed already: treat the run as an
            // explicit re-analysis of the whole registry.
            targets = items;
        }

        let total = targets.len();
        info!(total, "batch analysis started");
        self.events.emit_lossy(SoundcheckEvent::BatchStarted {
            total,
            timestamp: chrono::Utc::now(),
        });

        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };

        for (index, item) in targets.into_iter().enumerate() {
            self.set_current(Some(item.id));
            self.events.emit_lossy(SoundcheckEvent::ItemAnalysisStarted {
                item_id: item.id,
                name: item.blob.name.clone(),
                index: index + 1,
                total,
                timestamp: chrono::Utc::now(),
            });

            match self.analyze_item(&item).await {
                Ok(result) => {
                    info!(
                        item_id = %item.id,
                        name = %item.blob.name,
                        average_db = result.average_db,
                        max_db = result.max_db,
                        "item analyzed"
                    );
                    self.events.emit_lossy(SoundcheckEvent::ItemAnalysisCompleted {
                        item_id: item.id,
                        average_db: result.average_db,
                        max_db: result.max_db,
                        timestamp: chrono::Utc::now(),
                    });
                    self.registry.set_analysis_result(item.id, result).await;
                    report.analyzed += 1;
                }
                Err(e) => {
                    warn!(item_id = %item.id, name = %item.blob.name, error = %e, "item analysis failed");
                    self.events.emit_lossy(SoundcheckEvent::ItemAnalysisFailed {
                        item_id: item.id,
                        error: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                    self.registry
                        .record_analysis_failure(item.id, e.to_string())
                        .await;
                    report.failed += 1;
                }
            }
        }

        self.set_current(None);
        info!(analyzed = report.analyzed, failed = report.failed, "batch analysis completed");
        self.events.emit_lossy(SoundcheckEvent::BatchCompleted {
            analyzed: report.analyzed,
            failed: report.failed,
            timestamp: chrono::Utc::now(),
        });
        Ok(report)
    }

    /// Analyze a single item through the same pipeline and under the
    /// same mutual exclusion as a batch run.
    pub async fn analyze_one(&self, id: Uuid) -> Result<()> {
        let _guard = self.try_begin()?;

        let item = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        self.set_current(Some(id));
        self.events.emit_lossy(SoundcheckEvent::ItemAnalysisStarted {
            item_id: id,
            name: item.blob.name.clone(),
            index: 1,
            total: 1,
            timestamp: chrono::Utc::now(),
        });

        match self.analyze_item(&item).await {
            Ok(result) => {
                self.events.emit_lossy(SoundcheckEvent::ItemAnalysisCompleted {
                    item_id: id,
                    average_db: result.average_db,
                    max_db: result.max_db,
                    timestamp: chrono::Utc::now(),
                });
                self.registry.set_analysis_result(id, result).await;
                Ok(())
            }
            Err(e) => {
                warn!(item_id = %id, error = %e, "item analysis failed");
                self.events.emit_lossy(SoundcheckEvent::ItemAnalysisFailed {
                    item_id: id,
                    error: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                self.registry.record_analysis_failure(id, e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Decode + analyze on the blocking pool. The decoded buffer is
    /// owned entirely by this call and dropped when it returns.
    async fn analyze_item(&self, item: &MediaItem) -> Result<AnalysisResult> {
        let decoder = Arc::clone(&self.decoder);
        let blob = item.blob.clone();
        let samples_per_second = self.samples_per_second;

        tokio::task::spawn_blocking(move || {
            let decoded = decoder.decode(&blob)?;
            loudness_analyzer::analyze(&decoded.samples, decoded.sample_rate, samples_per_second)
        })
        .await
        .map_err(|e| Error::Internal(format!("analysis task failed: {}", e)))?
    }
}
