//! Threshold evaluation
//!
//! Pure, stateless comparison of an item's analysis summary against
//! the configured thresholds. Produces the warning set a UI layer or
//! the CLI report renders next to the item.

use crate::models::{MediaItem, Settings};

/// Why an item is flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Average loudness below `min_db_threshold`
    AverageTooLow,
    /// Peak loudness above `max_db_threshold`
    PeakTooHigh,
    /// Source larger than `max_file_size_mb` at import time
    SizeExceeded,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::AverageTooLow => write!(f, "average level too low"),
            WarningKind::PeakTooHigh => write!(f, "peak level too high"),
            WarningKind::SizeExceeded => write!(f, "file size limit exceeded"),
        }
    }
}

/// Warning set for one item, in a fixed order, duplicate-free.
///
/// Loudness warnings require a present analysis; an unanalyzed item can
/// only carry [`WarningKind::SizeExceeded`]. Strict inequalities: a
/// value exactly at a threshold is not flagged.
pub fn evaluate(item: &MediaItem, settings: &Settings) -> Vec<WarningKind> {
    let mut warnings = Vec::new();
    if let Some(analysis) = &item.analysis {
        if analysis.average_db < settings.min_db_threshold {
            warnings.push(WarningKind::AverageTooLow);
        }
        if analysis.max_db > settings.max_db_threshold {
            warnings.push(WarningKind::PeakTooHigh);
        }
    }
    if item.size_exceeded {
        warnings.push(WarningKind::SizeExceeded);
    }
    warnings
}
