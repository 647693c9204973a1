//! Loudness analysis result types

use serde::{Deserialize, Serialize};

/// One point of the loudness time series
///
/// `db` is on the normalized display scale: dBFS shifted by +100 and
/// floored at 40, so valid values lie in [40, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessPoint {
    /// Position in the source, seconds (2 decimal places)
    pub time: f64,
    /// Normalized loudness (2 decimal places)
    pub db: f64,
}

/// Complete loudness profile of one media item
///
/// Replaced wholesale on re-analysis, never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Duration of the decoded audio in seconds
    pub source_duration: f64,
    /// Sample rate of the decoded audio in Hz
    pub sample_rate: u32,
    /// Time series in temporal order
    pub points: Vec<LoudnessPoint>,
    /// Arithmetic mean of the emitted point values
    pub average_db: f64,
    /// Maximum of the emitted point values
    pub max_db: f64,
}
