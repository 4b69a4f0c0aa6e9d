//! User-facing descriptors for download failures.
//!
//! Terminal and exhausted outcomes surface as a single human-readable
//! message describing the classification, never a raw diagnostic or stack
//! trace. Raw collaborator detail stays in the logs.

use crate::fetch::FailureKind;

/// Static description of one failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub icon: &'static str,
    pub what: &'static str,
    pub advice: &'static str,
}

/// Returns the descriptor for a failure classification.
#[must_use]
pub fn describe(kind: FailureKind) -> FailureDescriptor {
    match kind {
        FailureKind::PlatformBlocked => FailureDescriptor {
            icon: "❌",
            what: "The platform refused automated access",
            advice: "Try again later or with a different link.",
        },
        FailureKind::ContentPrivate => FailureDescriptor {
            icon: "❌",
            what: "This content is private",
            advice: "Only its owner can grant access.",
        },
        FailureKind::ContentNotFound => FailureDescriptor {
            icon: "❌",
            what: "Content not found, removed, or region-blocked",
            advice: "Check that the link is still live.",
        },
        FailureKind::AgeRestricted => FailureDescriptor {
            icon: "❌",
            what: "Age-restricted content cannot be fetched",
            advice: "This restriction comes from the platform.",
        },
        FailureKind::UpstreamRateLimited => FailureDescriptor {
            icon: "⏳",
            what: "The platform is rate-limiting requests",
            advice: "Wait a minute and retry.",
        },
        FailureKind::SizeExceeded => FailureDescriptor {
            icon: "❌",
            what: "File too large for delivery",
            advice: "The delivery channel caps attachment size.",
        },
        FailureKind::NetworkTransport => FailureDescriptor {
            icon: "🌐",
            what: "Network error while contacting the platform",
            advice: "Check connectivity and retry.",
        },
        FailureKind::AllStrategiesExhausted => FailureDescriptor {
            icon: "⚠️",
            what: "Download failed after every retrieval approach",
            advice: "Try again later.",
        },
        FailureKind::TranscodeFailed => FailureDescriptor {
            icon: "⚠️",
            what: "Audio extraction unavailable",
            advice: "The original file was delivered instead.",
        },
    }
}

/// Single-line user message for a failure classification.
#[must_use]
pub fn user_message(kind: FailureKind) -> String {
    let descriptor = describe(kind);
    format!("{} {}. {}", descriptor.icon, descriptor.what, descriptor.advice)
}

/// Size-exceeded message carrying the configured ceiling.
#[must_use]
pub fn size_exceeded_message(ceiling_bytes: u64) -> String {
    let descriptor = describe(FailureKind::SizeExceeded);
    format!(
        "{} {}. Limit: {}MB.",
        descriptor.icon,
        descriptor.what,
        ceiling_bytes / (1024 * 1024)
    )
}
