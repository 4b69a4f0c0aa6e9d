//! Adaptive download orchestration over the strategy catalog.
//!
//! Strategies are attempted strictly in catalog rank order. Each attempt
//! probes metadata first, and every failure is classified immediately so the
//! loop's routing stays a one-line decision: terminal classifications stop
//! the whole request, retryable ones advance to the next strategy. The size
//! ceiling is enforced twice, before transfer against the declared size and
//! after transfer against the bytes on disk, because declared sizes are
//! sometimes absent or approximate.
//!
//! There is no adaptive reordering across strategies within a request:
//! simplicity over optimality, since most failures are terminal-classified
//! and short-circuit anyway.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::platform::PlatformId;
use crate::strategy::{Strategy, StrategyCatalog};
use crate::workspace::Workspace;

use super::error::{classify, FailureKind, RetrieveError};
use super::retriever::{MediaKind, MediaProbe, MediaRetriever};

/// One validated inbound download request.
///
/// Constructed per inbound message and discarded after the orchestration
/// call returns. The platform is derived from the URL, never user-supplied.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: Url,
    pub kind: MediaKind,
    pub platform: PlatformId,
}

impl DownloadRequest {
    #[must_use]
    pub fn new(url: Url, kind: MediaKind, platform: PlatformId) -> Self {
        Self {
            url,
            kind,
            platform,
        }
    }
}

/// Result of one orchestration call.
///
/// Owned by the caller that requested the download; the caller is
/// responsible for releasing the workspace once the result is consumed or
/// rejected.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The transfer completed and passed the size ceiling.
    Success {
        /// Downloaded file inside the per-request workspace.
        file_path: PathBuf,
        /// Actual on-disk size.
        size_bytes: u64,
    },
    /// The request failed with a classified reason.
    Failure {
        kind: FailureKind,
        /// Most recent raw collaborator detail, for diagnostics.
        detail: String,
    },
}

impl DownloadOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }
}

/// Payload-size ceiling check, applied before and after transfer.
///
/// Both checks use the same predicate against the same configured ceiling
/// (derived from the delivery channel's maximum attachment size). Declared
/// sizes may be estimates; an estimate over the ceiling is still treated as
/// terminal.
#[derive(Debug, Clone, Copy)]
pub struct SizeGuard {
    ceiling: u64,
}

impl SizeGuard {
    #[must_use]
    pub fn new(ceiling: u64) -> Self {
        Self { ceiling }
    }

    /// The configured ceiling in bytes.
    #[must_use]
    pub fn ceiling(self) -> u64 {
        self.ceiling
    }

    /// True when `bytes` is over the ceiling.
    #[must_use]
    pub fn exceeds(self, bytes: u64) -> bool {
        bytes > self.ceiling
    }
}

/// How the strategy loop proceeds after a classified failure.
enum StepRouting {
    Stop(DownloadOutcome),
    Advance,
}

/// Drives the ranked strategy sequence for one request.
pub struct DownloadOrchestrator {
    retriever: Arc<dyn MediaRetriever>,
    catalog: Arc<StrategyCatalog>,
    size_guard: SizeGuard,
    /// Hard deadline wrapped around every collaborator call, so one
    /// unresponsive platform cannot hang a request indefinitely.
    attempt_timeout: Duration,
}

impl DownloadOrchestrator {
    #[must_use]
    pub fn new(
        retriever: Arc<dyn MediaRetriever>,
        catalog: Arc<StrategyCatalog>,
        size_guard: SizeGuard,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            catalog,
            size_guard,
            attempt_timeout,
        }
    }

    /// The size guard this orchestrator enforces.
    #[must_use]
    pub fn size_guard(&self) -> SizeGuard {
        self.size_guard
    }

    /// Runs the ranked strategy sequence against `request`, downloading into
    /// `workspace`.
    ///
    /// The returned `Success` path points inside the workspace; the caller
    /// releases the workspace after consuming the file. The orchestrator
    /// never deletes a success file itself.
    #[instrument(skip(self, workspace), fields(url = %request.url, platform = ?request.platform, kind = request.kind.label()))]
    pub async fn run(&self, request: &DownloadRequest, workspace: &Workspace) -> DownloadOutcome {
        let strategies = self.catalog.strategies_for(request.platform);
        if strategies.is_empty() {
            return DownloadOutcome::failure(
                FailureKind::AllStrategiesExhausted,
                "no retrieval strategies configured for platform",
            );
        }

        let mut last_detail = String::from("no strategy was attempted");
        // After an upstream rate limit, strategies reusing the just-limited
        // identity are skipped: the limit is keyed to that fingerprint.
        let mut limited_identity: Option<&'static str> = None;
        let mut attempted = 0_usize;

        for strategy in strategies {
            if limited_identity == Some(strategy.identity.label) {
                debug!(
                    strategy = strategy.name,
                    identity = strategy.identity.label,
                    "Skipping strategy sharing a rate-limited identity"
                );
                continue;
            }

            if attempted > 0 {
                tokio::time::sleep(strategy.pacing.jittered_delay()).await;
            }
            attempted += 1;
            limited_identity = None;

            info!(
                strategy = strategy.name,
                rank = strategy.rank,
                identity = strategy.identity.label,
                "Attempting retrieval strategy"
            );

            let probe = match self.probe_with_deadline(request, strategy).await {
                Ok(probe) => probe,
                Err(error) => {
                    last_detail = error.to_string();
                    match self.route_failure(strategy, "probe", &error, &mut limited_identity) {
                        StepRouting::Stop(outcome) => return outcome,
                        StepRouting::Advance => continue,
                    }
                }
            };

            debug!(
                title = %probe.title,
                declared_size = ?probe.declared_size,
                duration_secs = ?probe.duration_secs,
                "Probe succeeded"
            );

            // Pre-transfer check: size is a property of the content, not the
            // strategy, so a declared breach is terminal and skips the
            // transfer entirely.
            if let Some(declared) = probe.declared_size {
                if self.size_guard.exceeds(declared) {
                    info!(declared, ceiling = self.size_guard.ceiling(), "Declared size over ceiling");
                    return DownloadOutcome::failure(
                        FailureKind::SizeExceeded,
                        format!(
                            "declared size {declared} bytes exceeds ceiling {} bytes",
                            self.size_guard.ceiling()
                        ),
                    );
                }
            }

            match self.fetch_with_deadline(request, strategy, workspace).await {
                Ok(file_path) => {
                    let size_bytes = match std::fs::metadata(&file_path) {
                        Ok(metadata) => metadata.len(),
                        Err(error) => {
                            warn!(path = %file_path.display(), error = %error, "Downloaded file vanished");
                            last_detail = format!("downloaded file unreadable: {error}");
                            continue;
                        }
                    };

                    // Post-transfer check: declared sizes are sometimes
                    // absent or inaccurate, so the bytes on disk decide.
                    if self.size_guard.exceeds(size_bytes) {
                        if let Err(error) = std::fs::remove_file(&file_path) {
                            warn!(path = %file_path.display(), error = %error, "Failed to discard oversized file");
                        }
                        return DownloadOutcome::failure(
                            FailureKind::SizeExceeded,
                            format!(
                                "downloaded file is {size_bytes} bytes, ceiling {} bytes",
                                self.size_guard.ceiling()
                            ),
                        );
                    }

                    info!(
                        strategy = strategy.name,
                        path = %file_path.display(),
                        size_bytes,
                        "Retrieval succeeded"
                    );
                    return DownloadOutcome::Success {
                        file_path,
                        size_bytes,
                    };
                }
                Err(error) => {
                    last_detail = error.to_string();
                    match self.route_failure(strategy, "fetch", &error, &mut limited_identity) {
                        StepRouting::Stop(outcome) => return outcome,
                        StepRouting::Advance => {}
                    }
                }
            }
        }

        info!(detail = %last_detail, "All strategies exhausted");
        DownloadOutcome::failure(FailureKind::AllStrategiesExhausted, last_detail)
    }

    /// Classifies one collaborator failure and decides loop routing.
    fn route_failure(
        &self,
        strategy: &Strategy,
        phase: &'static str,
        error: &RetrieveError,
        limited_identity: &mut Option<&'static str>,
    ) -> StepRouting {
        let kind = classify(error);

        if matches!(error, RetrieveError::Unknown { .. }) {
            // Unclassified errors stay retryable but are logged distinctly so
            // taxonomy gaps surface in diagnostics.
            warn!(
                strategy = strategy.name,
                phase,
                error = %error,
                "Unclassified retrieval failure, treating as retryable"
            );
        } else {
            info!(
                strategy = strategy.name,
                phase,
                classification = kind.label(),
                error = %error,
                "Strategy attempt failed"
            );
        }

        if kind.is_terminal() {
            return StepRouting::Stop(DownloadOutcome::failure(kind, error.to_string()));
        }
        if kind == FailureKind::UpstreamRateLimited {
            *limited_identity = Some(strategy.identity.label);
        }
        StepRouting::Advance
    }

    async fn probe_with_deadline(
        &self,
        request: &DownloadRequest,
        strategy: &Strategy,
    ) -> Result<MediaProbe, RetrieveError> {
        match timeout(
            self.attempt_timeout,
            self.retriever.probe(&request.url, strategy, request.kind),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RetrieveError::Timeout {
                seconds: self.attempt_timeout.as_secs(),
            }),
        }
    }

    async fn fetch_with_deadline(
        &self,
        request: &DownloadRequest,
        strategy: &Strategy,
        workspace: &Workspace,
    ) -> Result<PathBuf, RetrieveError> {
        match timeout(
            self.attempt_timeout,
            self.retriever
                .fetch(&request.url, strategy, request.kind, workspace.path()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RetrieveError::Timeout {
                seconds: self.attempt_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_guard_predicate() {
        let guard = SizeGuard::new(100);
        assert!(!guard.exceeds(99));
        assert!(!guard.exceeds(100), "ceiling itself is allowed");
        assert!(guard.exceeds(101));
    }

    #[test]
    fn test_outcome_success_flag() {
        let success = DownloadOutcome::Success {
            file_path: PathBuf::from("/tmp/x"),
            size_bytes: 1,
        };
        assert!(success.is_success());
        let failure =
            DownloadOutcome::failure(FailureKind::ContentPrivate, "private");
        assert!(!failure.is_success());
    }
}
