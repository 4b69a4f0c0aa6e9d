//! Typed retrieval error contract and the download failure taxonomy.
//!
//! [`RetrieveError`] is the structured contract every retrieval collaborator
//! must speak; adapters for tools that only expose free-text errors (see
//! `ytdlp`) translate into it as close to the collaborator call as possible.
//! The orchestrator then maps each error onto a [`FailureKind`], and the
//! terminal/retryable routing in the strategy loop becomes a one-line
//! decision.

use thiserror::Error;

/// Structured failure returned by a retrieval collaborator call.
///
/// The `detail` fields carry the collaborator's raw diagnostic text; it is
/// logged and preserved for diagnostics but never shown verbatim to users.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The platform detected automated access and refused to serve.
    #[error("platform refused automated access: {detail}")]
    Blocked {
        /// Raw collaborator diagnostic.
        detail: String,
    },

    /// The content exists but is inaccessible to anyone but its owner.
    #[error("content is private: {detail}")]
    Private {
        /// Raw collaborator diagnostic.
        detail: String,
    },

    /// The content does not exist, was removed, or is region-blocked away.
    #[error("content not found or removed: {detail}")]
    NotFound {
        /// Raw collaborator diagnostic.
        detail: String,
    },

    /// The content is gated behind an age check.
    #[error("content is age-restricted: {detail}")]
    AgeRestricted {
        /// Raw collaborator diagnostic.
        detail: String,
    },

    /// The platform is throttling the client identity used for the attempt.
    #[error("upstream rate limit hit: {detail}")]
    RateLimited {
        /// Raw collaborator diagnostic.
        detail: String,
    },

    /// Transport-level failure (DNS, connection reset, TLS, 5xx).
    #[error("network error talking to platform: {detail}")]
    Network {
        /// Raw collaborator diagnostic.
        detail: String,
    },

    /// The per-attempt deadline expired before the collaborator returned.
    #[error("attempt deadline of {seconds}s expired")]
    Timeout {
        /// Configured deadline that was exceeded.
        seconds: u64,
    },

    /// Anything the taxonomy does not recognize, including failure to launch
    /// the collaborator tool itself.
    #[error("unclassified retrieval failure: {detail}")]
    Unknown {
        /// Raw collaborator diagnostic.
        detail: String,
    },
}

/// Classification of a download outcome, as surfaced to callers and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Automated-access detection; a different fingerprint may pass.
    PlatformBlocked,
    /// Content inaccessible to anyone; no strategy can help.
    ContentPrivate,
    /// Content gone or never existed; no strategy can help.
    ContentNotFound,
    /// Age gate; no strategy can help.
    AgeRestricted,
    /// Upstream throttling keyed to the identity just used.
    UpstreamRateLimited,
    /// Payload over the delivery ceiling, before or after transfer.
    /// A property of the content, not the strategy.
    SizeExceeded,
    /// Transient transport failure.
    NetworkTransport,
    /// Every strategy returned a retryable failure.
    AllStrategiesExhausted,
    /// Audio extraction failed; caller decides the fallback.
    TranscodeFailed,
}

impl FailureKind {
    /// True when no alternative strategy could plausibly change the outcome,
    /// so the strategy loop must stop immediately.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::ContentPrivate
                | Self::ContentNotFound
                | Self::AgeRestricted
                | Self::SizeExceeded
        )
    }

    /// Stable label for logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PlatformBlocked => "platform-blocked",
            Self::ContentPrivate => "content-private",
            Self::ContentNotFound => "content-not-found",
            Self::AgeRestricted => "age-restricted",
            Self::UpstreamRateLimited => "upstream-rate-limited",
            Self::SizeExceeded => "size-exceeded",
            Self::NetworkTransport => "network-transport",
            Self::AllStrategiesExhausted => "all-strategies-exhausted",
            Self::TranscodeFailed => "transcode-failed",
        }
    }
}

/// Maps a collaborator error onto the outcome taxonomy.
///
/// Unknown errors classify as retryable transport failures; the orchestrator
/// logs them distinctly before advancing.
#[must_use]
pub fn classify(error: &RetrieveError) -> FailureKind {
    match error {
        RetrieveError::Blocked { .. } => FailureKind::PlatformBlocked,
        RetrieveError::Private { .. } => FailureKind::ContentPrivate,
        RetrieveError::NotFound { .. } => FailureKind::ContentNotFound,
        RetrieveError::AgeRestricted { .. } => FailureKind::AgeRestricted,
        RetrieveError::RateLimited { .. } => FailureKind::UpstreamRateLimited,
        RetrieveError::Network { .. }
        | RetrieveError::Timeout { .. }
        | RetrieveError::Unknown { .. } => FailureKind::NetworkTransport,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> String {
        "diagnostic".to_string()
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(FailureKind::ContentPrivate.is_terminal());
        assert!(FailureKind::ContentNotFound.is_terminal());
        assert!(FailureKind::AgeRestricted.is_terminal());
        assert!(FailureKind::SizeExceeded.is_terminal());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(!FailureKind::PlatformBlocked.is_terminal());
        assert!(!FailureKind::UpstreamRateLimited.is_terminal());
        assert!(!FailureKind::NetworkTransport.is_terminal());
        assert!(!FailureKind::AllStrategiesExhausted.is_terminal());
        assert!(!FailureKind::TranscodeFailed.is_terminal());
    }

    #[test]
    fn test_classify_maps_each_variant() {
        assert_eq!(
            classify(&RetrieveError::Blocked { detail: detail() }),
            FailureKind::PlatformBlocked
        );
        assert_eq!(
            classify(&RetrieveError::Private { detail: detail() }),
            FailureKind::ContentPrivate
        );
        assert_eq!(
            classify(&RetrieveError::NotFound { detail: detail() }),
            FailureKind::ContentNotFound
        );
        assert_eq!(
            classify(&RetrieveError::AgeRestricted { detail: detail() }),
            FailureKind::AgeRestricted
        );
        assert_eq!(
            classify(&RetrieveError::RateLimited { detail: detail() }),
            FailureKind::UpstreamRateLimited
        );
        assert_eq!(
            classify(&RetrieveError::Network { detail: detail() }),
            FailureKind::NetworkTransport
        );
        assert_eq!(
            classify(&RetrieveError::Timeout { seconds: 180 }),
            FailureKind::NetworkTransport
        );
        assert_eq!(
            classify(&RetrieveError::Unknown { detail: detail() }),
            FailureKind::NetworkTransport
        );
    }

    #[test]
    fn test_error_messages_carry_detail() {
        let error = RetrieveError::Private {
            detail: "login required".to_string(),
        };
        assert!(error.to_string().contains("login required"));
    }
}
