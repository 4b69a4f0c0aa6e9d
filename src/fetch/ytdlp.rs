//! yt-dlp subprocess adapter for the [`MediaRetriever`] contract.
//!
//! The tool is consumed as a black box: `-J` for a metadata probe without
//! transfer, a format-selected invocation for the transfer itself. Strategy
//! configuration maps onto command-line flags: user agent, extractor
//! arguments, format selector.
//!
//! yt-dlp only exposes free-text errors on stderr, so this module also hosts
//! the best-effort substring classifier that translates them into the typed
//! [`RetrieveError`](super::error::RetrieveError) contract. The pattern
//! tables are an explicit adapter concern and stay out of the core taxonomy.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

use crate::strategy::Strategy;

use super::error::RetrieveError;
use super::retriever::{MediaKind, MediaProbe, MediaRetriever};

/// Longest raw diagnostic preserved from stderr.
const MAX_DETAIL_LEN: usize = 200;

/// Output filename template; titles are truncated so filesystem limits and
/// delivery captions stay sane.
const OUTPUT_TEMPLATE: &str = "%(title).50s.%(ext)s";

/// Subset of the `-J` JSON document the orchestrator cares about.
#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    filesize: Option<u64>,
    #[serde(default)]
    filesize_approx: Option<u64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    ext: Option<String>,
}

/// Retrieval collaborator backed by the yt-dlp binary.
#[derive(Debug)]
pub struct YtDlpRetriever {
    binary: PathBuf,
    /// Subprocess deadline; the child is killed when it expires.
    timeout: Duration,
}

impl YtDlpRetriever {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Runs the binary with `args`, enforcing the deadline and classifying a
    /// non-zero exit via the stderr tables.
    async fn run(&self, args: &[String]) -> Result<Vec<u8>, RetrieveError> {
        debug!(binary = %self.binary.display(), ?args, "Invoking retrieval tool");

        let invocation = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, invocation).await {
            Ok(Ok(output)) => output,
            Ok(Err(error)) => {
                return Err(RetrieveError::Unknown {
                    detail: format!(
                        "failed to launch {}: {error}",
                        self.binary.display()
                    ),
                });
            }
            // kill_on_drop reaps the child when the deadline fires.
            Err(_) => {
                return Err(RetrieveError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaRetriever for YtDlpRetriever {
    async fn probe(
        &self,
        url: &Url,
        strategy: &Strategy,
        kind: MediaKind,
    ) -> Result<MediaProbe, RetrieveError> {
        let args = probe_args(url, strategy, kind);
        let stdout = self.run(&args).await?;

        let document: ProbeDocument =
            serde_json::from_slice(&stdout).map_err(|error| RetrieveError::Unknown {
                detail: format!("unparseable metadata document: {error}"),
            })?;

        Ok(MediaProbe {
            title: document.title.unwrap_or_else(|| "untitled".to_string()),
            // Exact size when known, estimate otherwise; both feed the
            // pre-transfer ceiling check.
            declared_size: document.filesize.or(document.filesize_approx),
            duration_secs: document.duration,
            ext: document.ext,
        })
    }

    async fn fetch(
        &self,
        url: &Url,
        strategy: &Strategy,
        kind: MediaKind,
        dest_dir: &Path,
    ) -> Result<PathBuf, RetrieveError> {
        let args = fetch_args(url, strategy, kind, dest_dir);
        self.run(&args).await?;
        newest_file_in(dest_dir)
    }
}

/// Flags shared by probe and fetch: playlist suppression, fingerprint,
/// extractor tuning, and format selection.
fn common_args(strategy: &Strategy, kind: MediaKind) -> Vec<String> {
    let mut args = vec![
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--user-agent".to_string(),
        strategy.identity.user_agent.to_string(),
        "-f".to_string(),
        format_for(strategy, kind).to_string(),
    ];
    for (key, value) in strategy.extractor_hints {
        args.push("--extractor-args".to_string());
        args.push(format!("{key}={value}"));
    }
    args
}

fn probe_args(url: &Url, strategy: &Strategy, kind: MediaKind) -> Vec<String> {
    let mut args = common_args(strategy, kind);
    args.push("-J".to_string());
    args.push(url.as_str().to_string());
    args
}

fn fetch_args(url: &Url, strategy: &Strategy, kind: MediaKind, dest_dir: &Path) -> Vec<String> {
    let mut args = common_args(strategy, kind);
    args.push("--no-progress".to_string());
    args.push("-o".to_string());
    args.push(
        dest_dir
            .join(OUTPUT_TEMPLATE)
            .to_string_lossy()
            .into_owned(),
    );
    args.push(url.as_str().to_string());
    args
}

/// Picks the strategy's format selector for the requested kind.
fn format_for(strategy: &Strategy, kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => strategy.formats.video,
        MediaKind::Audio => strategy.formats.audio,
    }
}

/// Finds the most recently modified regular file in `dir`, skipping the
/// tool's partial-download droppings.
fn newest_file_in(dir: &Path) -> Result<PathBuf, RetrieveError> {
    let entries = std::fs::read_dir(dir).map_err(|error| RetrieveError::Unknown {
        detail: format!("cannot list download directory: {error}"),
    })?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || is_partial_artifact(&path) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().is_none_or(|(best, _)| modified >= *best) {
            newest = Some((modified, path));
        }
    }

    newest.map(|(_, path)| path).ok_or_else(|| RetrieveError::Unknown {
        detail: "transfer reported success but produced no file".to_string(),
    })
}

/// In-progress artifacts the tool leaves behind on interruption.
fn is_partial_artifact(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("part" | "ytdl" | "temp")
    )
}

// ---------------------------------------------------------------------------
// Free-text stderr classification (best-effort adapter; see module docs).
// Tables are checked in order; the first hit wins, so the more specific
// terminal conditions sit above the broad blocked/network buckets.
// ---------------------------------------------------------------------------

/// Age gates. Checked first: their wording often also mentions signing in,
/// which the blocked table would otherwise swallow.
const AGE_RESTRICTED_PATTERNS: &[&str] = &[
    "sign in to confirm your age",
    "age-restricted",
    "age restricted",
    "inappropriate for some users",
];

const PRIVATE_PATTERNS: &[&str] = &[
    "private video",
    "this video is private",
    "private account",
    "members-only",
    "members only",
    "join this channel",
];

const NOT_FOUND_PATTERNS: &[&str] = &[
    "video unavailable",
    "content unavailable",
    "is not available",
    "no longer available",
    "has been removed",
    "does not exist",
    "http error 404",
    "unsupported url",
    "is not a valid url",
];

const RATE_LIMITED_PATTERNS: &[&str] = &[
    "http error 429",
    "too many requests",
    "rate-limit",
    "rate limit",
];

const BLOCKED_PATTERNS: &[&str] = &[
    "sign in to confirm",
    "not a bot",
    "po_token",
    "po token",
    "captcha",
    "http error 403",
    "access denied",
    "unable to extract",
];

const NETWORK_PATTERNS: &[&str] = &[
    "timed out",
    "timeout",
    "connection reset",
    "connection refused",
    "unable to download webpage",
    "temporary failure in name resolution",
    "network is unreachable",
    "http error 500",
    "http error 502",
    "http error 503",
];

/// Translates free-text stderr into the typed contract.
fn classify_stderr(stderr: &str) -> RetrieveError {
    let lowered = stderr.to_lowercase();
    let detail = error_detail(stderr);

    let matches_any = |patterns: &[&str]| patterns.iter().any(|needle| lowered.contains(needle));

    if matches_any(AGE_RESTRICTED_PATTERNS) {
        return RetrieveError::AgeRestricted { detail };
    }
    if matches_any(PRIVATE_PATTERNS) {
        return RetrieveError::Private { detail };
    }
    if matches_any(NOT_FOUND_PATTERNS) {
        return RetrieveError::NotFound { detail };
    }
    if matches_any(RATE_LIMITED_PATTERNS) {
        return RetrieveError::RateLimited { detail };
    }
    if matches_any(BLOCKED_PATTERNS) {
        return RetrieveError::Blocked { detail };
    }
    if matches_any(NETWORK_PATTERNS) {
        return RetrieveError::Network { detail };
    }

    warn!(detail = %detail, "stderr matched no classification pattern");
    RetrieveError::Unknown { detail }
}

/// Extracts the most useful line from stderr: the last `ERROR:` line when
/// present, otherwise the last non-empty line, truncated for logs.
fn error_detail(stderr: &str) -> String {
    let line = stderr
        .lines()
        .rev()
        .find(|line| line.contains("ERROR"))
        .or_else(|| stderr.lines().rev().find(|line| !line.trim().is_empty()))
        .unwrap_or("retrieval tool reported no diagnostic")
        .trim();

    let mut detail = line.to_string();
    if detail.len() > MAX_DETAIL_LEN {
        // Cut at the last char boundary at or below the cap.
        let cut = detail
            .char_indices()
            .map(|(index, _)| index)
            .take_while(|index| *index <= MAX_DETAIL_LEN)
            .last()
            .unwrap_or(0);
        detail.truncate(cut);
    }
    detail
}
