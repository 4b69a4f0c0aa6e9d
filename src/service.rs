//! Request pipeline: admission → classification → orchestration → delivery.
//!
//! [`MediaService`] is the explicitly constructed, injectable composition of
//! the core components. It owns the rate limiter, the handle cache, the
//! workspace manager, and the orchestrator; front ends (a chat bot, the
//! CLI) drive it through two calls: [`MediaService::register`] when a URL
//! first arrives, and [`MediaService::execute`] once the user has picked a
//! media kind.
//!
//! Collaborator calls are blocking, network-bound work and run under a
//! bounded semaphore so one user's stuck download cannot stall admission
//! checks or replies to other users.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::delivery::{upload_kind_for, Delivery};
use crate::fetch::{
    DownloadOrchestrator, DownloadOutcome, DownloadRequest, FailureKind, MediaKind,
    MediaRetriever, SizeGuard, Transcoder,
};
use crate::limiter::RateLimiter;
use crate::platform::{canonical_url, classify, PlatformId};
use crate::report;
use crate::strategy::StrategyCatalog;
use crate::urlcache::HandleCache;
use crate::workspace::ResourceManager;

/// Finds the first HTTP(S) URL embedded in inbound message text.
#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+").expect("URL regex is valid") // Static pattern, safe to panic
});

/// Infrastructure errors that are bugs or operator problems, not
/// user-facing outcomes.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The worker-pool semaphore closed unexpectedly.
    #[error("worker pool closed unexpectedly")]
    WorkerPoolClosed,

    /// Workspace root or directory could not be created.
    #[error("workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}

/// Why a request was refused before any retrieval was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalReason {
    /// The identity is over its admission window.
    RateLimited,
    /// The URL's host matches no supported platform.
    UnsupportedPlatform,
    /// The opaque handle expired or never existed.
    SessionExpired,
}

/// End result of one request as seen by the front end.
#[derive(Debug)]
pub enum ServiceOutcome {
    /// File uploaded to the requester.
    Delivered {
        /// Size of the delivered artifact.
        size_bytes: u64,
    },
    /// Refused before retrieval started.
    Refused(RefusalReason),
    /// Retrieval failed with a classified reason.
    DownloadFailed(FailureKind),
    /// Retrieval succeeded but the front end failed to upload. Reported
    /// distinctly so users are not told the download failed.
    UploadFailed {
        /// Delivery collaborator diagnostic.
        detail: String,
    },
}

/// Result of registering an inbound URL.
#[derive(Debug)]
pub struct Registration {
    /// Opaque token for the bounded callback channel.
    pub token: String,
    /// Platform the URL was classified to.
    pub platform: PlatformId,
}

/// The composed request pipeline.
pub struct MediaService {
    limiter: RateLimiter,
    handles: HandleCache,
    resources: ResourceManager,
    orchestrator: DownloadOrchestrator,
    transcoder: Arc<dyn Transcoder>,
    permits: Arc<Semaphore>,
}

impl MediaService {
    /// Composes the pipeline from configuration and collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Workspace`] when the workspace root cannot be
    /// created.
    pub fn new(
        config: &Config,
        retriever: Arc<dyn MediaRetriever>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Result<Self, ServiceError> {
        let resources = ResourceManager::new(&config.work_root)?;
        let orchestrator = DownloadOrchestrator::new(
            retriever,
            Arc::new(StrategyCatalog::standard()),
            SizeGuard::new(config.max_payload_bytes),
            config.attempt_timeout,
        );
        Ok(Self {
            limiter: RateLimiter::new(config.per_minute_limit),
            handles: HandleCache::new(),
            resources,
            orchestrator,
            transcoder,
            permits: Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1))),
        })
    }

    /// Registers the first URL found in inbound text and returns its opaque
    /// handle plus the classified platform.
    ///
    /// Returns `None` when the text carries no URL or the URL's platform is
    /// unsupported; the front end answers with its own "unsupported" copy.
    #[must_use]
    pub fn register(&self, text: &str, identity: &str) -> Option<Registration> {
        let url = URL_PATTERN.find(text)?.as_str();
        let platform = classify(url)?;
        let token = self.handles.put(url, identity);
        info!(platform = platform.display_name(), token = %token, "URL registered");
        Some(Registration { token, platform })
    }

    /// Media kinds the front end should offer for a platform.
    #[must_use]
    pub fn offered_kinds(&self, platform: PlatformId) -> &'static [MediaKind] {
        if platform.audio_only() {
            &[MediaKind::Audio]
        } else {
            &[MediaKind::Video, MediaKind::Audio]
        }
    }

    /// Resolves a previously registered handle and runs the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for infrastructure failures only; everything
    /// user-facing is a [`ServiceOutcome`].
    pub async fn execute(
        &self,
        token: &str,
        kind: MediaKind,
        identity: &str,
        delivery: &dyn Delivery,
    ) -> Result<ServiceOutcome, ServiceError> {
        let Some(url) = self.handles.get(token) else {
            notify(delivery, "❌ Session expired. Send the URL again.").await;
            return Ok(ServiceOutcome::Refused(RefusalReason::SessionExpired));
        };
        self.fetch_and_deliver(&url, kind, identity, delivery).await
    }

    /// Runs the full pipeline for a raw URL: admission, classification,
    /// orchestration, optional audio extraction, upload, cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] for infrastructure failures only.
    #[instrument(skip(self, delivery), fields(kind = kind.label(), identity = %identity))]
    pub async fn fetch_and_deliver(
        &self,
        url_text: &str,
        kind: MediaKind,
        identity: &str,
        delivery: &dyn Delivery,
    ) -> Result<ServiceOutcome, ServiceError> {
        if !self.limiter.admit(identity) {
            notify(delivery, "⏳ Too many requests. Wait a minute and try again.").await;
            return Ok(ServiceOutcome::Refused(RefusalReason::RateLimited));
        }

        let Some(platform) = classify(url_text) else {
            notify(
                delivery,
                "❌ Platform not supported. Supported: YouTube, Twitter/X, Instagram, SoundCloud.",
            )
            .await;
            return Ok(ServiceOutcome::Refused(RefusalReason::UnsupportedPlatform));
        };
        let Ok(parsed) = Url::parse(url_text) else {
            // classify() already parsed this URL; reaching here means it
            // changed under us, so treat it as unsupported.
            return Ok(ServiceOutcome::Refused(RefusalReason::UnsupportedPlatform));
        };

        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ServiceError::WorkerPoolClosed)?;

        if let Err(error) = delivery
            .send_status(&format!(
                "{} Downloading {} from {}…",
                kind_emoji(kind),
                kind.label(),
                platform.display_name()
            ))
            .await
        {
            warn!(error = %error, "Status send failed");
        }

        let request = DownloadRequest::new(canonical_url(&parsed, platform), kind, platform);
        let mut workspace = self.resources.acquire()?;

        let outcome = self.orchestrator.run(&request, &workspace).await;
        let result = match outcome {
            DownloadOutcome::Success {
                file_path,
                size_bytes,
            } => {
                self.deliver(file_path, size_bytes, kind, platform, delivery)
                    .await
            }
            DownloadOutcome::Failure {
                kind: failure,
                detail,
            } => {
                info!(classification = failure.label(), detail = %detail, "Download failed");
                let message = if failure == FailureKind::SizeExceeded {
                    report::size_exceeded_message(self.orchestrator.size_guard().ceiling())
                } else {
                    report::user_message(failure)
                };
                notify(delivery, &message).await;
                ServiceOutcome::DownloadFailed(failure)
            }
        };

        // The success file lives inside the workspace, so release only after
        // the upload consumed or rejected it. Drop still covers panics.
        workspace.release();
        drop(permit);
        Ok(result)
    }

    /// Post-download path: optional audio extraction, then upload.
    async fn deliver(
        &self,
        file_path: PathBuf,
        size_bytes: u64,
        kind: MediaKind,
        platform: PlatformId,
        delivery: &dyn Delivery,
    ) -> ServiceOutcome {
        let mut path = file_path;
        let mut size = size_bytes;

        if kind == MediaKind::Audio {
            match self.transcoder.to_audio(&path).await {
                Ok(audio) => {
                    if audio != path {
                        size = std::fs::metadata(&audio).map_or(size, |meta| meta.len());
                        path = audio;
                    }
                }
                Err(error) => {
                    // Non-terminal: fall back to the original container.
                    warn!(error = %error, "Audio extraction failed, delivering original container");
                    notify(
                        delivery,
                        "⚠️ Audio extraction unavailable, sending the original file.",
                    )
                    .await;
                }
            }
        }

        notify(delivery, "📤 Uploading…").await;
        let caption = format!("Downloaded from {}", platform.display_name());
        match delivery
            .upload(&path, upload_kind_for(kind, &path), &caption)
            .await
        {
            Ok(()) => {
                notify(delivery, "✅ Done!").await;
                ServiceOutcome::Delivered { size_bytes: size }
            }
            Err(error) => {
                warn!(error = %error, "Upload failed after successful download");
                notify(
                    delivery,
                    "⚠️ The download succeeded but the upload failed. Please try again.",
                )
                .await;
                ServiceOutcome::UploadFailed {
                    detail: error.to_string(),
                }
            }
        }
    }
}

/// Best-effort status edit; delivery failures here are logged, never
/// escalated into download failures.
async fn notify(delivery: &dyn Delivery, text: &str) {
    if let Err(error) = delivery.edit_status(text).await {
        warn!(error = %error, "Status update failed");
    }
}

fn kind_emoji(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => "🎥",
        MediaKind::Audio => "🎵",
    }
}
