//! Adaptive multi-strategy media retrieval.
//!
//! This module is the core of the crate: the [`DownloadOrchestrator`] drives
//! a ranked sequence of retrieval strategies against an external
//! [`MediaRetriever`] collaborator, classifies every failure through the
//! taxonomy in [`error`], and enforces the payload-size ceiling via
//! [`SizeGuard`] both before and after transfer.
//!
//! - `error` - typed collaborator errors and the failure taxonomy
//! - `retriever` - the collaborator contract (`probe` / `fetch`)
//! - `orchestrator` - the strategy loop and size enforcement
//! - `ytdlp` - production adapter shelling out to yt-dlp
//! - `transcode` - audio-extraction collaborator (ffmpeg adapter)

mod error;
mod orchestrator;
mod retriever;
mod transcode;
mod ytdlp;

pub use error::{classify, FailureKind, RetrieveError};
pub use orchestrator::{DownloadOrchestrator, DownloadOutcome, DownloadRequest, SizeGuard};
pub use retriever::{MediaKind, MediaProbe, MediaRetriever};
pub use transcode::{FfmpegTranscoder, TranscodeError, Transcoder};
pub use ytdlp::YtDlpRetriever;
