//! Retrieval strategy catalog.
//!
//! Platforms apply heuristic bot detection keyed on client fingerprint and
//! request cadence, so a single retrieval configuration is unreliable. Each
//! platform maps to an ordered list of [`Strategy`] values (complete,
//! self-consistent configuration bundles) ordered from "most likely to
//! succeed with the least aggressive fingerprint" to "last resort, degraded
//! quality, distinct network identity."
//!
//! The catalog is pure data: adding or reordering a strategy is a data
//! change, not a code change. Strategies are immutable after construction
//! and never mutate each other at run time.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;

use crate::platform::PlatformId;

/// A client fingerprint presented to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIdentity {
    /// Short label used in logs and for identity comparisons.
    pub label: &'static str,
    /// Full User-Agent header value.
    pub user_agent: &'static str,
}

/// Declarative format preference strings, one per media kind.
///
/// The strings use the retrieval tool's selector syntax (quality ceilings,
/// container preferences, fallback chains).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatProfile {
    pub video: &'static str,
    pub audio: &'static str,
}

/// Inter-attempt delay bounds for a strategy.
///
/// A jittered delay inside these bounds is slept before every attempt after
/// the first, so repeated attempts against one platform do not land with a
/// mechanical cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl PacingPolicy {
    /// Picks a uniformly random delay inside the configured bounds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn jittered_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if max <= min {
            return self.min_delay;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Default pacing used by most strategies.
const STANDARD_PACING: PacingPolicy = PacingPolicy {
    min_delay: Duration::from_millis(500),
    max_delay: Duration::from_millis(1500),
};

/// One complete, self-consistent configuration for a retrieval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    /// Execution order within the platform's list (1-indexed, ascending).
    pub rank: u8,
    /// Stable name used in logs.
    pub name: &'static str,
    /// Client fingerprint for this attempt.
    pub identity: NetworkIdentity,
    /// Format preference strings per media kind.
    pub formats: FormatProfile,
    /// Platform-specific extractor tuning as key/value pairs
    /// (e.g. which internal client variant to impersonate).
    pub extractor_hints: &'static [(&'static str, &'static str)],
    /// Inter-attempt delay bounds.
    pub pacing: PacingPolicy,
}

const DESKTOP_CHROME: NetworkIdentity = NetworkIdentity {
    label: "desktop-chrome",
    user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
};

const DESKTOP_FIREFOX: NetworkIdentity = NetworkIdentity {
    label: "desktop-firefox",
    user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
};

const ANDROID_APP: NetworkIdentity = NetworkIdentity {
    label: "android-app",
    user_agent: "com.google.android.youtube/19.09.37 (Linux; U; Android 14) gzip",
};

const SMART_TV: NetworkIdentity = NetworkIdentity {
    label: "smart-tv",
    user_agent: "Mozilla/5.0 (SMART-TV; LINUX; Tizen 6.0) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Version/5.0 TV Safari/537.36",
};

const IOS_INSTAGRAM_APP: NetworkIdentity = NetworkIdentity {
    label: "ios-instagram-app",
    user_agent: "Instagram 361.0.0.35.82 (iPhone13,4; iOS 17_5_1; en_US; en-US; \
                 scale=3.00; 1284x2778; 674117351)",
};

/// Standard 720p-capped progressive-preferred video selection.
const STANDARD_FORMATS: FormatProfile = FormatProfile {
    video: "best[height<=720][ext=mp4]/best[height<=720]/best",
    audio: "bestaudio[ext=m4a]/bestaudio/best",
};

/// Degraded last-resort selection (480p ceiling).
const DEGRADED_FORMATS: FormatProfile = FormatProfile {
    video: "best[height<=480]/best",
    audio: "bestaudio/best",
};

/// Ordered, immutable strategy lists keyed by platform.
#[derive(Debug)]
pub struct StrategyCatalog {
    by_platform: HashMap<PlatformId, Vec<Strategy>>,
}

impl StrategyCatalog {
    /// Builds a catalog from explicit per-platform strategy lists.
    ///
    /// Used directly by tests; production code uses [`StrategyCatalog::standard`].
    #[must_use]
    pub fn new(by_platform: HashMap<PlatformId, Vec<Strategy>>) -> Self {
        Self { by_platform }
    }

    /// Builds the standard catalog used by the running service.
    #[must_use]
    pub fn standard() -> Self {
        let mut by_platform = HashMap::new();
        by_platform.insert(PlatformId::YouTube, youtube_strategies());
        by_platform.insert(PlatformId::Twitter, twitter_strategies());
        by_platform.insert(PlatformId::Instagram, instagram_strategies());
        by_platform.insert(PlatformId::SoundCloud, soundcloud_strategies());
        Self { by_platform }
    }

    /// Returns the ordered strategy list for a platform.
    ///
    /// Unknown platforms yield an empty slice; the orchestrator reports that
    /// as exhaustion rather than panicking.
    #[must_use]
    pub fn strategies_for(&self, platform: PlatformId) -> &[Strategy] {
        self.by_platform
            .get(&platform)
            .map_or(&[], Vec::as_slice)
    }
}

/// YouTube runs the deepest ladder: the platform rotates bot-detection
/// heuristics frequently, and impersonating different internal player
/// clients meaningfully changes the outcome distribution.
fn youtube_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            rank: 1,
            name: "web-default",
            identity: DESKTOP_CHROME,
            formats: STANDARD_FORMATS,
            extractor_hints: &[],
            pacing: STANDARD_PACING,
        },
        Strategy {
            rank: 2,
            name: "web-safari-client",
            identity: DESKTOP_FIREFOX,
            formats: STANDARD_FORMATS,
            extractor_hints: &[("youtube:player_client", "web_safari")],
            pacing: STANDARD_PACING,
        },
        Strategy {
            rank: 3,
            name: "android-client",
            identity: ANDROID_APP,
            formats: FormatProfile {
                video: "best[height<=720]/best",
                audio: "bestaudio/best",
            },
            extractor_hints: &[("youtube:player_client", "android")],
            pacing: STANDARD_PACING,
        },
        Strategy {
            rank: 4,
            name: "tv-embedded",
            identity: SMART_TV,
            formats: DEGRADED_FORMATS,
            extractor_hints: &[("youtube:player_client", "tv_embedded")],
            pacing: STANDARD_PACING,
        },
    ]
}

fn twitter_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            rank: 1,
            name: "web-default",
            identity: DESKTOP_CHROME,
            formats: STANDARD_FORMATS,
            extractor_hints: &[],
            pacing: STANDARD_PACING,
        },
        Strategy {
            rank: 2,
            name: "syndication-api",
            identity: DESKTOP_FIREFOX,
            formats: DEGRADED_FORMATS,
            extractor_hints: &[("twitter:api", "syndication")],
            pacing: STANDARD_PACING,
        },
    ]
}

fn instagram_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            rank: 1,
            name: "app-identity",
            identity: IOS_INSTAGRAM_APP,
            formats: STANDARD_FORMATS,
            extractor_hints: &[],
            pacing: STANDARD_PACING,
        },
        Strategy {
            rank: 2,
            name: "browser-fallback",
            identity: DESKTOP_CHROME,
            formats: DEGRADED_FORMATS,
            extractor_hints: &[],
            pacing: STANDARD_PACING,
        },
    ]
}

fn soundcloud_strategies() -> Vec<Strategy> {
    vec![Strategy {
        rank: 1,
        name: "web-default",
        identity: DESKTOP_CHROME,
        formats: FormatProfile {
            video: "best",
            audio: "bestaudio/best",
        },
        extractor_hints: &[],
        pacing: STANDARD_PACING,
    }]
}
