// Failure diagnostics - identifies why the platform refused a request
//
// Analyzes engine stderr to determine:
// - Type of refusal (403, rate limit, private video, etc.)
// - Whether the restriction is permanent
// - A short hint for the caller

use serde::{Deserialize, Serialize};

/// Reasons why the platform might refuse an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingReason {
    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Geographic restriction
    GeoBlocked,

    /// Network timeout (soft IP block)
    NetworkTimeout,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Bot detection triggered
    BotDetection,

    /// Private video requiring authorization
    PrivateVideo,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// Member-only content (requires channel membership)
    MembersOnly,

    /// Comments turned off by the uploader
    CommentsDisabled,

    /// Generic/unknown refusal
    Unknown,
}

impl BlockingReason {
    /// Check if this is a permanent restriction (no attempt will succeed)
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::VideoUnavailable | Self::PrivateVideo | Self::MembersOnly | Self::CommentsDisabled
        )
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::AgeRestricted => "Age-restricted content",
            Self::GeoBlocked => "Geographic restriction",
            Self::NetworkTimeout => "Network timeout (possible IP throttling)",
            Self::RateLimited => "Rate limited by the platform",
            Self::BotDetection => "Bot detection triggered",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::MembersOnly => "Members-only content",
            Self::CommentsDisabled => "Comments are disabled",
            Self::Unknown => "Unknown failure",
        }
    }

    /// What the caller can do about it
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Http403Forbidden => Some("update cookies or route through a proxy"),
            Self::AgeRestricted => Some("configure YTDLP_COOKIES from a logged-in 18+ account"),
            Self::GeoBlocked => Some("use a proxy in an allowed region"),
            Self::NetworkTimeout => Some("check connectivity or raise TIMEOUT"),
            Self::RateLimited => Some("wait 10-15 minutes or lower RATE_LIMIT"),
            Self::BotDetection => Some("use cookies from a logged-in browser or a fresh proxy"),
            Self::MembersOnly => Some("requires cookies from a channel member"),
            Self::PrivateVideo | Self::VideoUnavailable | Self::CommentsDisabled | Self::Unknown => {
                None
            }
        }
    }
}

/// Stderr fragments per reason, most specific first. Matched lowercased.
const PATTERNS: &[(BlockingReason, &[&str])] = &[
    (
        BlockingReason::MembersOnly,
        &["members only", "members-only", "join this channel", "available to members"],
    ),
    (
        BlockingReason::CommentsDisabled,
        &["comments are turned off", "comments are disabled"],
    ),
    (
        BlockingReason::AgeRestricted,
        &["age-restricted", "sign in to confirm your age", "age_verification"],
    ),
    (
        BlockingReason::PrivateVideo,
        &["private video", "video is private", "sign in if you've been granted access"],
    ),
    (
        BlockingReason::VideoUnavailable,
        &[
            "video unavailable",
            "video is unavailable",
            "video has been removed",
            "no longer available",
            "drm protected",
        ],
    ),
    (
        BlockingReason::GeoBlocked,
        &["not available in your country", "blocked in your country", "geo restricted", "geo-restricted"],
    ),
    (
        BlockingReason::RateLimited,
        &["http error 429", "too many requests", "rate limit"],
    ),
    (
        BlockingReason::BotDetection,
        &["confirm you're not a bot", "captcha", "unusual traffic"],
    ),
    (
        BlockingReason::Http403Forbidden,
        &["http error 403", "403 forbidden", "403: forbidden", "status code 403"],
    ),
    (
        BlockingReason::NetworkTimeout,
        &["timed out", "timeout", "connection refused", "network unreachable"],
    ),
];

/// Classify engine stderr. `None` only for empty output.
pub fn diagnose_error(stderr: &str) -> Option<BlockingReason> {
    if stderr.trim().is_empty() {
        return None;
    }

    let lower = stderr.to_lowercase();
    let reason = PATTERNS
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
        .map(|(reason, _)| *reason)
        .unwrap_or(BlockingReason::Unknown);

    Some(reason)
}
