//! Local filesystem import
//!
//! Builds [`SourceBlob`]s from files and folder trees. Filtering by
//! media type happens later, in the registry; this layer only skips
//! OS metadata noise and unreadable entries.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::models::SourceBlob;

/// OS droppings excluded from folder scans
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Read one file into a blob: bytes, filename, mtime, and a MIME hint
/// sniffed from the leading magic bytes.
pub fn blob_from_path(path: &Path) -> Result<SourceBlob> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("media-file")
        .to_string();

    let last_modified = std::fs::metadata(path)?
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let mime_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("")
        .to_string();

    debug!(path = %path.display(), bytes = bytes.len(), mime = %mime_type, "read local file");
    Ok(SourceBlob::new(name, mime_type, last_modified, bytes))
}

/// Collect blobs from a file or folder tree, in stable filename order.
/// Unreadable entries are logged and skipped, not fatal.
pub fn collect_blobs(root: &Path) -> Result<Vec<SourceBlob>> {
    if root.is_file() {
        return Ok(vec![blob_from_path(root)?]);
    }

    let mut blobs = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if IGNORED_FILES.contains(&file_name.as_ref()) {
            continue;
        }

        match blob_from_path(entry.path()) {
            Ok(blob) => blobs.push(blob),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping unreadable file")
            }
        }
    }
    Ok(blobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blob_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"RIFF....WAVEfmt ").unwrap();

        let blob = blob_from_path(&path).unwrap();
        assert_eq!(blob.name, "clip.wav");
        assert_eq!(blob.byte_size, 16);
        assert_eq!(&blob.content[..4], b"RIFF");
    }

    #[test]
    fn test_collect_skips_ignored_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.wav"), b"bb").unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"aa").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"junk").unwrap();

        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("c.flac"), b"cc").unwrap();

        let blobs = collect_blobs(dir.path()).unwrap();
        let names: Vec<_> = blobs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["a.mp3", "b.wav", "c.flac"]);
    }

    #[test]
    fn test_collect_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("solo.ogg");
        std::fs::write(&path, b"xx").unwrap();

        let blobs = collect_blobs(&path).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].name, "solo.ogg");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(blob_from_path(Path::new("/no/such/file.wav")).is_err());
    }
}
