//! Platform classification and URL canonicalization.
//!
//! Maps a user-supplied URL to the content platform that hosts it, using an
//! ordered host-substring table. Classification fails closed: malformed URLs,
//! non-HTTP schemes, and unknown hosts all yield `None`, never an error.
//!
//! Canonicalization rewrites known alias forms (the `x.com` redirect domain,
//! YouTube Shorts paths) into the form the retrieval tool handles best.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Content platforms with retrieval strategies configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformId {
    YouTube,
    Twitter,
    Instagram,
    SoundCloud,
}

impl PlatformId {
    /// Human-readable platform name for status messages and captions.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Twitter => "Twitter/X",
            Self::Instagram => "Instagram",
            Self::SoundCloud => "SoundCloud",
        }
    }

    /// True for platforms that only carry audio content.
    ///
    /// Front ends use this to offer the audio kind alone instead of an
    /// audio/video choice.
    #[must_use]
    pub fn audio_only(self) -> bool {
        matches!(self, Self::SoundCloud)
    }
}

/// Ordered host-substring table mapping hosts to platforms.
///
/// Order matters: alias domains (`youtu.be`, `x.com`) sit next to their
/// canonical domain and both rows resolve to the same platform, so two
/// domains of one platform classify identically.
const PLATFORM_HOSTS: &[(&str, PlatformId)] = &[
    ("youtube.com", PlatformId::YouTube),
    ("youtu.be", PlatformId::YouTube),
    ("x.com", PlatformId::Twitter),
    ("twitter.com", PlatformId::Twitter),
    ("instagram.com", PlatformId::Instagram),
    ("soundcloud.com", PlatformId::SoundCloud),
];

/// Regex extracting the video id from a YouTube Shorts path.
#[allow(clippy::expect_used)]
static SHORTS_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/shorts/([A-Za-z0-9_-]+)").expect("shorts regex is valid") // Static pattern, safe to panic
});

/// Classifies a URL string into a supported platform.
///
/// Parses the URL, extracts the host, strips a leading `www.`, and matches
/// against [`PLATFORM_HOSTS`] in table order (first match wins).
///
/// Returns `None` for malformed URLs, non-HTTP(S) schemes, and hosts that
/// match no table row.
#[must_use]
pub fn classify(raw: &str) -> Option<PlatformId> {
    let parsed = Url::parse(raw).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(host.as_str());
    PLATFORM_HOSTS
        .iter()
        .find(|entry| host.contains(entry.0))
        .map(|entry| entry.1)
}

/// Rewrites known alias URL forms into their canonical retrieval form.
///
/// - `x.com` hosts become `twitter.com` (redirect-style alias; extractors
///   key on the canonical domain).
/// - YouTube Shorts paths become regular `watch?v=` URLs.
///
/// URLs that need no rewrite are returned unchanged. Rewrite failures fall
/// back to the original URL rather than erroring: the retrieval tool gets a
/// chance at the raw form.
#[must_use]
pub fn canonical_url(url: &Url, platform: PlatformId) -> Url {
    match platform {
        PlatformId::Twitter => canonical_twitter_url(url),
        PlatformId::YouTube => canonical_youtube_url(url),
        PlatformId::Instagram | PlatformId::SoundCloud => url.clone(),
    }
}

fn canonical_twitter_url(url: &Url) -> Url {
    let is_alias = url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case("x.com") || host.eq_ignore_ascii_case("www.x.com"));
    if !is_alias {
        return url.clone();
    }
    let mut rewritten = url.clone();
    if rewritten.set_host(Some("twitter.com")).is_err() {
        return url.clone();
    }
    rewritten
}

fn canonical_youtube_url(url: &Url) -> Url {
    let Some(captures) = SHORTS_ID_PATTERN.captures(url.path()) else {
        return url.clone();
    };
    let Some(video_id) = captures.get(1) else {
        return url.clone();
    };
    let watch_url = format!("https://www.youtube.com/watch?v={}", video_id.as_str());
    Url::parse(&watch_url).unwrap_or_else(|_| url.clone())
}
