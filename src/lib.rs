//! soundcheck - loudness analysis for imported media files
//!
//! Pipeline: import sources (local files, folder trees, URLs) into a
//! process-wide registry, then run a sequential batch that decodes each
//! item and computes its loudness time series. Threshold evaluation
//! turns the per-item summary into a warning set.

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod services;

pub use crate::config::SettingsStore;
pub use crate::error::{Error, Result};
pub use crate::events::{EventBus, SoundcheckEvent};
pub use crate::models::{AnalysisResult, LoudnessPoint, MediaItem, Settings, SourceBlob};
pub use crate::services::{
    BatchAnalysisOrchestrator, BatchReport, MediaItemRegistry, RemoteImportFetcher,
    SymphoniaDecoder, SymphoniaProbe, WarningKind, DEFAULT_SAMPLES_PER_SECOND,
};
