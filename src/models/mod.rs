//! Data models for soundcheck
//!
//! - Imported media items and their playback handles
//! - Loudness analysis results
//! - Process-wide settings record

pub mod analysis;
pub mod media_item;
pub mod settings;

pub use analysis::{AnalysisResult, LoudnessPoint};
pub use media_item::{DedupKey, MediaItem, PlaybackHandle, SourceBlob};
pub use settings::Settings;
