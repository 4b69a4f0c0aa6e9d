//! Audio extraction via an external transcoding tool.
//!
//! Consumed as an opaque subprocess collaborator with a bounded deadline.
//! Failure here is non-terminal: callers fall back to delivering the
//! original container when a pure-audio artifact cannot be produced.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// MP3 bitrate used for extracted audio.
const AUDIO_BITRATE: &str = "192k";

/// Errors from the transcoding collaborator.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The tool exited unsuccessfully or produced no output file.
    #[error("audio extraction failed: {detail}")]
    Failed {
        /// Tool diagnostic, truncated for logs.
        detail: String,
    },

    /// The deadline expired; the tool process was killed.
    #[error("audio extraction timed out after {seconds}s")]
    Timeout {
        /// Configured deadline that was exceeded.
        seconds: u64,
    },
}

/// External audio-extraction collaborator.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Produces a pure-audio file next to `input` and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError`] when extraction fails or times out.
    async fn to_audio(&self, input: &Path) -> Result<PathBuf, TranscodeError>;
}

/// Transcoder backed by the ffmpeg binary.
#[derive(Debug)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn to_audio(&self, input: &Path) -> Result<PathBuf, TranscodeError> {
        // Already a pure-audio artifact; nothing to do.
        if input.extension().and_then(|ext| ext.to_str()) == Some("mp3") {
            return Ok(input.to_path_buf());
        }

        let output = input.with_extension("mp3");
        debug!(input = %input.display(), output = %output.display(), "Extracting audio");

        let invocation = Command::new(&self.binary)
            .arg("-i")
            .arg(input)
            .args(["-vn", "-acodec", "libmp3lame", "-b:a", AUDIO_BITRATE, "-y"])
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = match tokio::time::timeout(self.timeout, invocation).await {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                return Err(TranscodeError::Failed {
                    detail: format!("failed to launch {}: {error}", self.binary.display()),
                });
            }
            Err(_) => {
                return Err(TranscodeError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("transcoder reported no diagnostic")
                .trim()
                .to_string();
            return Err(TranscodeError::Failed { detail });
        }

        if !output.is_file() {
            return Err(TranscodeError::Failed {
                detail: "transcoder exited cleanly but produced no file".to_string(),
            });
        }

        Ok(output)
    }
}
