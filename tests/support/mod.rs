//! Shared scripted collaborators for integration tests.
//!
//! Each mock is driven by a pre-loaded script of results, popped in call
//! order, and records the strategy names it was invoked with so tests can
//! assert exactly which strategies ran.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use mediagrab_core::{
    Delivery, DeliveryError, MediaKind, MediaProbe, MediaRetriever, RetrieveError, Strategy,
    TranscodeError, Transcoder, UploadKind,
};

/// Builds a probe result with the given declared size.
pub fn probe_metadata(declared_size: Option<u64>) -> MediaProbe {
    MediaProbe {
        title: "test clip".to_string(),
        declared_size,
        duration_secs: Some(12.0),
        ext: Some("mp4".to_string()),
    }
}

/// Retriever driven by pre-loaded scripts of probe and fetch results.
///
/// A scripted `Ok` fetch carries the bytes to write into the destination
/// directory, standing in for a real transfer.
#[derive(Default)]
pub struct ScriptedRetriever {
    probes: Mutex<VecDeque<Result<MediaProbe, RetrieveError>>>,
    fetches: Mutex<VecDeque<Result<Vec<u8>, RetrieveError>>>,
    probe_log: Mutex<Vec<String>>,
    fetch_log: Mutex<Vec<String>>,
}

impl ScriptedRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_probe(&self, result: Result<MediaProbe, RetrieveError>) {
        self.probes.lock().unwrap().push_back(result);
    }

    pub fn push_fetch(&self, result: Result<Vec<u8>, RetrieveError>) {
        self.fetches.lock().unwrap().push_back(result);
    }

    /// Strategy names probed, in order.
    pub fn probed_strategies(&self) -> Vec<String> {
        self.probe_log.lock().unwrap().clone()
    }

    /// Strategy names fetched with, in order.
    pub fn fetched_strategies(&self) -> Vec<String> {
        self.fetch_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaRetriever for ScriptedRetriever {
    async fn probe(
        &self,
        _url: &Url,
        strategy: &Strategy,
        _kind: MediaKind,
    ) -> Result<MediaProbe, RetrieveError> {
        self.probe_log
            .lock()
            .unwrap()
            .push(strategy.name.to_string());
        self.probes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected probe call for {}", strategy.name))
    }

    async fn fetch(
        &self,
        _url: &Url,
        strategy: &Strategy,
        kind: MediaKind,
        dest_dir: &Path,
    ) -> Result<PathBuf, RetrieveError> {
        self.fetch_log
            .lock()
            .unwrap()
            .push(strategy.name.to_string());
        let scripted = self
            .fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected fetch call for {}", strategy.name));
        match scripted {
            Ok(bytes) => {
                let ext = match kind {
                    MediaKind::Audio => "m4a",
                    MediaKind::Video => "mp4",
                };
                let path = dest_dir.join(format!("clip.{ext}"));
                std::fs::write(&path, bytes).unwrap();
                Ok(path)
            }
            Err(error) => Err(error),
        }
    }
}

/// Retriever that never answers; exercises the per-attempt deadline.
pub struct HangingRetriever;

#[async_trait]
impl MediaRetriever for HangingRetriever {
    async fn probe(
        &self,
        _url: &Url,
        _strategy: &Strategy,
        _kind: MediaKind,
    ) -> Result<MediaProbe, RetrieveError> {
        tokio::time::sleep(std::time::Duration::from_secs(86_400)).await;
        unreachable!("probe must be cut off by the attempt deadline")
    }

    async fn fetch(
        &self,
        _url: &Url,
        _strategy: &Strategy,
        _kind: MediaKind,
        _dest_dir: &Path,
    ) -> Result<PathBuf, RetrieveError> {
        tokio::time::sleep(std::time::Duration::from_secs(86_400)).await;
        unreachable!("fetch must be cut off by the attempt deadline")
    }
}

/// Transcoder producing an `.mp3` next to the input, or failing on demand.
#[derive(Default)]
pub struct ScriptedTranscoder {
    pub fail: bool,
    calls: Mutex<usize>,
}

impl ScriptedTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Transcoder for ScriptedTranscoder {
    async fn to_audio(&self, input: &Path) -> Result<PathBuf, TranscodeError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(TranscodeError::Failed {
                detail: "scripted failure".to_string(),
            });
        }
        let output = input.with_extension("mp3");
        std::fs::write(&output, b"mp3 bytes").unwrap();
        Ok(output)
    }
}

/// One recorded upload: path, presentation, caption, and the file size read
/// at upload time (proves the workspace was still alive and the file
/// complete when delivery started).
pub struct RecordedUpload {
    pub path: PathBuf,
    pub kind: UploadKind,
    pub caption: String,
    pub size_at_upload: Option<u64>,
}

/// Delivery collaborator that records every side effect.
#[derive(Default)]
pub struct RecordingDelivery {
    pub fail_uploads: bool,
    statuses: Mutex<Vec<String>>,
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn last_status(&self) -> String {
        self.statuses.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn with_uploads<T>(&self, f: impl FnOnce(&[RecordedUpload]) -> T) -> T {
        f(&self.uploads.lock().unwrap())
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send_status(&self, text: &str) -> Result<(), DeliveryError> {
        self.statuses.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn edit_status(&self, text: &str) -> Result<(), DeliveryError> {
        self.statuses.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn upload(
        &self,
        file: &Path,
        kind: UploadKind,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let size_at_upload = std::fs::metadata(file).map(|meta| meta.len()).ok();
        self.uploads.lock().unwrap().push(RecordedUpload {
            path: file.to_path_buf(),
            kind,
            caption: caption.to_string(),
            size_at_upload,
        });
        if self.fail_uploads {
            return Err(DeliveryError::Failed {
                detail: "scripted upload failure".to_string(),
            });
        }
        Ok(())
    }
}
