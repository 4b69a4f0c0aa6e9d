//! The messaging/delivery collaborator contract.
//!
//! The core consumes the chat front end through three fire-and-forget side
//! effects: sending a status line, editing it, and uploading a finished
//! file. Delivery failures have their own failure mode and are reported
//! separately from download failures: a failed upload never retries the
//! download, and users are never told a download failed when the upload did.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::fetch::MediaKind;

/// How the finished file should be presented by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Audio,
    Video,
    Photo,
}

/// Failure in the delivery collaborator.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The front end could not complete the side effect.
    #[error("delivery failed: {detail}")]
    Failed {
        /// Front-end diagnostic.
        detail: String,
    },
}

/// External messaging collaborator.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Sends a fresh status line to the requester.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the front end rejects the send.
    async fn send_status(&self, text: &str) -> Result<(), DeliveryError>;

    /// Edits the most recent status line.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the front end rejects the edit.
    async fn edit_status(&self, text: &str) -> Result<(), DeliveryError>;

    /// Uploads a finished file with a caption.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the upload fails.
    async fn upload(
        &self,
        file: &Path,
        kind: UploadKind,
        caption: &str,
    ) -> Result<(), DeliveryError>;
}

/// Image containers delivered as photos rather than videos.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Picks the upload presentation for a finished file.
///
/// Audio requests always upload as audio. Video requests upload as a photo
/// when the platform served a still image (an image-only post), otherwise as
/// video.
#[must_use]
pub fn upload_kind_for(kind: MediaKind, file: &Path) -> UploadKind {
    if kind == MediaKind::Audio {
        return UploadKind::Audio;
    }
    let is_image = file
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });
    if is_image {
        UploadKind::Photo
    } else {
        UploadKind::Video
    }
}
