//! URL import
//!
//! Downloads a remote media file into a [`SourceBlob`] and hands it to
//! the registry's single-item import path, so a URL import is subject
//! to exactly the same predicate, dedup, and size checks as a local
//! file.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Settings, SourceBlob};
use crate::services::registry::MediaItemRegistry;

const USER_AGENT: &str = concat!("soundcheck/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Fallback name when the URL path carries no usable segment
const DEFAULT_REMOTE_NAME: &str = "media-file";

pub struct RemoteImportFetcher {
    registry: Arc<MediaItemRegistry>,
    client: reqwest::Client,
}

impl RemoteImportFetcher {
    pub fn new(registry: Arc<MediaItemRegistry>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { registry, client })
    }

    /// Fetch `url` and import the response body as a new item.
    ///
    /// The blob is named after the last non-empty URL path segment and
    /// stamped with the fetch time as its last-modified value; the
    /// response `Content-Type` becomes its MIME hint.
    pub async fn import_from_url(&self, url: &str, settings: &Settings) -> Result<Uuid> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::InvalidUrl(format!(
                    "unsupported scheme {:?} in {}",
                    other, url
                )))
            }
        }

        debug!(url = %parsed, "fetching remote media");
        let response = self.client.get(parsed.clone()).send().await?;
        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "{} answered {}",
                url,
                response.status()
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let bytes = response.bytes().await?;

        let name = filename_from_url(&parsed);
        info!(url = %parsed, name = %name, bytes = bytes.len(), "remote media fetched");

        let blob = SourceBlob::new(name, mime_type, chrono::Utc::now(), bytes.to_vec());
        self.registry.import_single(blob, settings).await
    }
}

/// Last non-empty path segment of the URL, or a generic fallback
fn filename_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_REMOTE_NAME.to_string())
}
