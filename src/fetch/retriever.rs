//! The retrieval collaborator contract.
//!
//! The orchestrator never talks to a platform itself; it drives an external
//! retrieval tool through this trait. `probe` asks for metadata without
//! transferring bytes, `fetch` performs the transfer into a caller-owned
//! directory. Both take the full strategy configuration so the collaborator
//! can present the requested fingerprint.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::strategy::Strategy;

use super::error::RetrieveError;

/// The media kind a request wants delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Lowercase label for logs and status messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

/// Metadata returned by a probe, before any bytes move.
#[derive(Debug, Clone)]
pub struct MediaProbe {
    /// Content title as reported by the platform.
    pub title: String,
    /// Declared or estimated payload size in bytes, when the platform
    /// reports one. Estimates count: the pre-transfer size check treats
    /// them as authoritative.
    pub declared_size: Option<u64>,
    /// Content duration in seconds, when known.
    pub duration_secs: Option<f64>,
    /// Expected container extension, when known.
    pub ext: Option<String>,
}

/// External media-retrieval collaborator, consumed as a black box.
#[async_trait]
pub trait MediaRetriever: Send + Sync {
    /// Fetches metadata only, with no transfer, using the strategy's
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns a typed [`RetrieveError`] classifying why the platform
    /// refused the probe.
    async fn probe(
        &self,
        url: &Url,
        strategy: &Strategy,
        kind: MediaKind,
    ) -> Result<MediaProbe, RetrieveError>;

    /// Transfers the media into `dest_dir` and returns the downloaded file
    /// path.
    ///
    /// # Errors
    ///
    /// Returns a typed [`RetrieveError`] classifying why the transfer
    /// failed.
    async fn fetch(
        &self,
        url: &Url,
        strategy: &Strategy,
        kind: MediaKind,
        dest_dir: &Path,
    ) -> Result<PathBuf, RetrieveError>;
}
