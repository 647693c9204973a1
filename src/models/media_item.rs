//! Imported media items, source blobs, and playback handles

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::models::{AnalysisResult, Settings};

/// File extensions accepted by the supported-media predicate
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".mp3", ".wav", ".flac", ".m4a", ".aac", ".ogg", ".opus", ".webm", ".mp4",
];

/// Binary source content plus the metadata used for identity and filtering
#[derive(Debug, Clone)]
pub struct SourceBlob {
    /// Original filename (or URL-derived name)
    pub name: String,
    /// Content length in bytes
    pub byte_size: u64,
    /// Last-modified timestamp of the source
    pub last_modified: DateTime<Utc>,
    /// MIME-type hint; may be empty when the source provides none
    pub mime_type: String,
    /// Raw content, shared with the item's playback handle
    pub content: Arc<Vec<u8>>,
}

impl SourceBlob {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        last_modified: DateTime<Utc>,
        content: Vec<u8>,
    ) -> Self {
        let byte_size = content.len() as u64;
        Self {
            name: name.into(),
            byte_size,
            last_modified,
            mime_type: mime_type.into(),
            content: Arc::new(content),
        }
    }

    /// Supported-media predicate: extension allow-list OR `audio/` /
    /// `video/` MIME prefix, case-insensitive on the filename.
    pub fn is_supported_media(&self) -> bool {
        let name = self.name.to_lowercase();
        if SUPPORTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            return true;
        }
        self.mime_type.starts_with("audio/") || self.mime_type.starts_with("video/")
    }

    /// Identity used for duplicate detection
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            name: self.name.clone(),
            byte_size: self.byte_size,
            last_modified: self.last_modified,
        }
    }
}

/// Duplicate-detection key: two blobs with equal keys are the same source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub name: String,
    pub byte_size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Ownership-bearing reference the playback/preview layer streams from
///
/// Exactly one handle exists per item; the registry releases it exactly
/// once on removal or bulk clear. Clones share the same underlying
/// handle state, so a snapshot of an item observes the release.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    inner: Arc<Mutex<Option<Arc<Vec<u8>>>>>,
}

impl PlaybackHandle {
    pub(crate) fn new(content: Arc<Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(content))),
        }
    }

    /// Content to stream from, or `None` once released
    pub fn content(&self) -> Option<Arc<Vec<u8>>> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn is_released(&self) -> bool {
        self.content().is_none()
    }

    /// Drop the streamed content. Returns `true` if this call performed
    /// the release, `false` if it was already released.
    pub(crate) fn release(&self) -> bool {
        match self.inner.lock() {
            Ok(mut guard) => guard.take().is_some(),
            Err(_) => false,
        }
    }
}

/// One imported media file
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Opaque identity, unique for the process lifetime
    pub id: Uuid,
    pub blob: SourceBlob,
    pub playback: PlaybackHandle,
    /// Seconds, populated out-of-band by the duration probe; stays
    /// `None` on probe failure (with `last_error` recording why)
    pub duration: Option<f64>,
    /// Absent until analysis runs; replaced wholesale by re-analysis
    pub analysis: Option<AnalysisResult>,
    /// Computed at import time from the size-limit setting
    pub size_exceeded: bool,
    /// Most recent non-fatal diagnostic (probe or analysis failure)
    pub last_error: Option<String>,
}

impl MediaItem {
    pub fn new(blob: SourceBlob, settings: &Settings) -> Self {
        let playback = PlaybackHandle::new(Arc::clone(&blob.content));
        let size_exceeded = settings.size_exceeded(blob.byte_size);
        Self {
            id: Uuid::new_v4(),
            blob,
            playback,
            duration: None,
            analysis: None,
            size_exceeded,
            last_error: None,
        }
    }
}
