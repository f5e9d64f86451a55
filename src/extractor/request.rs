// Extraction requests: resource kinds, identifier validation, cache keys

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

use super::errors::ExtractionError;

/// Caller-supplied request parameters, kept sorted so cache keys are stable
pub type Parameters = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Video,
    Channel,
    Playlist,
    Search,
    Trending,
    Comments,
    Transcript,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Channel => "channel",
            Self::Playlist => "playlist",
            Self::Search => "search",
            Self::Trending => "trending",
            Self::Comments => "comments",
            Self::Transcript => "transcript",
        }
    }

    /// Guess the kind of a URL: playlist, channel, else video
    pub fn infer(url: &str) -> Self {
        if extract_playlist_id(url).is_some() && extract_video_id(url).is_none() {
            Self::Playlist
        } else if extract_channel_id(url).is_some() {
            Self::Channel
        } else {
            Self::Video
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "channel" => Ok(Self::Channel),
            "playlist" => Ok(Self::Playlist),
            "search" => Ok(Self::Search),
            "trending" => Ok(Self::Trending),
            "comments" => Ok(Self::Comments),
            "transcript" => Ok(Self::Transcript),
            other => Err(ExtractionError::InvalidInput(format!(
                "unknown resource kind '{}'",
                other
            ))),
        }
    }
}

/// One resource to extract. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRequest {
    resource_url: String,
    kind: ResourceKind,
    parameters: Parameters,
}

impl ExtractionRequest {
    pub fn new(kind: ResourceKind, resource_url: impl Into<String>) -> Self {
        Self {
            resource_url: resource_url.into(),
            kind,
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Video, url)
    }

    pub fn channel(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Channel, url)
    }

    pub fn playlist(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Playlist, url)
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self::new(ResourceKind::Search, query)
    }

    pub fn trending() -> Self {
        Self::new(ResourceKind::Trending, "")
    }

    pub fn comments(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Comments, url)
    }

    pub fn transcript(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Transcript, url)
    }

    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Validate the identifier for the declared kind and normalize parameters.
    pub fn resolve(&self) -> Result<ResolvedRequest, ExtractionError> {
        let raw = self.resource_url.trim();

        let (identifier, engine_url) = match self.kind {
            ResourceKind::Video | ResourceKind::Comments | ResourceKind::Transcript => {
                if BARE_VIDEO_ID.is_match(raw) {
                    (raw.to_string(), format!("https://www.youtube.com/watch?v={}", raw))
                } else {
                    let url = parse_http_url(raw)?;
                    let id = extract_video_id(url.as_str()).ok_or_else(|| {
                        ExtractionError::InvalidInput(format!("no video id in URL: {}", raw))
                    })?;
                    (id, raw.to_string())
                }
            }
            ResourceKind::Channel => {
                let url = parse_http_url(raw)?;
                let id = extract_channel_id(url.as_str()).ok_or_else(|| {
                    ExtractionError::InvalidInput(format!("no channel in URL: {}", raw))
                })?;
                (id, raw.to_string())
            }
            ResourceKind::Playlist => {
                let url = parse_http_url(raw)?;
                let id = extract_playlist_id(url.as_str()).ok_or_else(|| {
                    ExtractionError::InvalidInput(format!("no playlist id in URL: {}", raw))
                })?;
                (id, raw.to_string())
            }
            ResourceKind::Search => {
                if raw.is_empty() {
                    return Err(ExtractionError::InvalidInput(
                        "search query cannot be empty".to_string(),
                    ));
                }
                (raw.to_string(), raw.to_string())
            }
            ResourceKind::Trending => ("trending".to_string(), String::new()),
        };

        let parameters = normalize_parameters(self.kind, &self.parameters)?;

        Ok(ResolvedRequest {
            kind: self.kind,
            identifier,
            engine_url,
            parameters,
        })
    }
}

/// A validated request ready for the cache and the engine
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub kind: ResourceKind,
    /// Video id, channel handle, playlist id, or search query
    pub identifier: String,
    /// What the engine is asked to fetch
    pub engine_url: String,
    pub parameters: Parameters,
}

impl ResolvedRequest {
    /// `<kind>:<identifier>` followed by `:<key>=<value>` pairs in key order
    pub fn cache_key(&self) -> String {
        let mut key = format!("{}:{}", self.kind, self.identifier);
        for (name, value) in &self.parameters {
            match value {
                Value::String(s) => key.push_str(&format!(":{}={}", name, s)),
                other => key.push_str(&format!(":{}={}", name, other)),
            }
        }
        key
    }
}

lazy_static::lazy_static! {
    static ref BARE_VIDEO_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref VIDEO_PATH_RE: Regex = Regex::new(
        r"(?:youtu\.be/|/embed/|/shorts/|/live/|/v/)([A-Za-z0-9_-]+)"
    ).unwrap();
    static ref CHANNEL_PATH_RE: Regex = Regex::new(
        r"^/(?:channel/|c/|user/|@)([A-Za-z0-9_.-]+)"
    ).unwrap();
    static ref ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

fn parse_http_url(raw: &str) -> Result<Url, ExtractionError> {
    if raw.is_empty() {
        return Err(ExtractionError::InvalidInput("URL is required".to_string()));
    }
    let url = Url::parse(raw)
        .map_err(|e| ExtractionError::InvalidInput(format!("invalid URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ExtractionError::InvalidInput(format!(
            "unsupported URL scheme '{}'",
            other
        ))),
    }
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let value = url
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())?;
    ID_RE.is_match(&value).then_some(value)
}

/// Extract the video id from watch, short, embed and live URLs
pub fn extract_video_id(url: &str) -> Option<String> {
    if let Some(id) = query_param(url, "v") {
        return Some(id);
    }
    VIDEO_PATH_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the playlist id from the `list` query parameter
pub fn extract_playlist_id(url: &str) -> Option<String> {
    query_param(url, "list")
}

/// Extract a channel id, custom name, user name or @handle
pub fn extract_channel_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    CHANNEL_PATH_RE
        .captures(parsed.path())
        .and_then(|caps| caps.get(0).zip(caps.get(1)))
        .map(|(whole, id)| {
            if whole.as_str().starts_with("/@") {
                format!("@{}", id.as_str())
            } else {
                id.as_str().to_string()
            }
        })
}

fn normalize_parameters(kind: ResourceKind, raw: &Parameters) -> Result<Parameters, ExtractionError> {
    let mut out = Parameters::new();

    match kind {
        ResourceKind::Comments => {
            out.insert("max_comments".into(), bounded(raw, "max_comments", 100, 1, 1000)?.into());
        }
        ResourceKind::Transcript => {
            let language = match raw.get("language") {
                None | Some(Value::Null) => "en".to_string(),
                Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                Some(other) => {
                    return Err(ExtractionError::InvalidInput(format!(
                        "language must be a non-empty string, got {}",
                        other
                    )))
                }
            };
            out.insert("language".into(), language.into());
        }
        ResourceKind::Search | ResourceKind::Trending => {
            out.insert("max_results".into(), bounded(raw, "max_results", 10, 1, 50)?.into());
        }
        ResourceKind::Channel => {
            out.insert("max_videos".into(), bounded(raw, "max_videos", 10, 1, 50)?.into());
        }
        ResourceKind::Playlist => {
            out.insert("max_videos".into(), bounded(raw, "max_videos", 200, 1, 1000)?.into());
        }
        ResourceKind::Video => {}
    }

    Ok(out)
}

fn bounded(raw: &Parameters, name: &str, default: u64, min: u64, max: u64) -> Result<u64, ExtractionError> {
    let value = match raw.get(name) {
        None | Some(Value::Null) => default,
        Some(v) => v.as_u64().ok_or_else(|| {
            ExtractionError::InvalidInput(format!("{} must be a non-negative integer, got {}", name, v))
        })?,
    };
    if value > max {
        tracing::warn!(parameter = name, requested = value, limit = max, "clamping parameter");
    }
    Ok(value.clamp(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_ids_from_common_shapes() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=x").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(extract_video_id("https://www.youtube.com/shorts/abcDEF12345").as_deref(), Some("abcDEF12345"));
        assert_eq!(extract_video_id("https://www.youtube.com/embed/abcDEF12345").as_deref(), Some("abcDEF12345"));
        assert_eq!(extract_video_id("https://www.youtube.com/feed/trending"), None);
    }

    #[test]
    fn test_short_host_video_resolves_to_cache_key() {
        let resolved = ExtractionRequest::video("https://x/watch?v=abc").resolve().unwrap();
        assert_eq!(resolved.identifier, "abc");
        assert_eq!(resolved.engine_url, "https://x/watch?v=abc");
        assert_eq!(resolved.cache_key(), "video:abc");
    }

    #[test]
    fn test_bare_video_id_expands() {
        let resolved = ExtractionRequest::video("dQw4w9WgXcQ").resolve().unwrap();
        assert_eq!(resolved.engine_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_malformed_identifiers_are_invalid_input() {
        let cases = [
            ExtractionRequest::video("not a url"),
            ExtractionRequest::video("ftp://x/watch?v=abc"),
            ExtractionRequest::video("https://www.youtube.com/"),
            ExtractionRequest::channel("https://www.youtube.com/watch?v=abc"),
            ExtractionRequest::playlist("https://www.youtube.com/watch?v=abc"),
            ExtractionRequest::search("   "),
        ];
        for request in cases {
            let err = request.resolve().unwrap_err();
            assert!(matches!(err, ExtractionError::InvalidInput(_)), "{:?}", request);
        }
    }

    #[test]
    fn test_channel_shapes() {
        assert_eq!(extract_channel_id("https://www.youtube.com/@RickAstleyYT").as_deref(), Some("@RickAstleyYT"));
        assert_eq!(extract_channel_id("https://www.youtube.com/channel/UC123/videos").as_deref(), Some("UC123"));
        assert_eq!(extract_channel_id("https://www.youtube.com/user/someone").as_deref(), Some("someone"));
    }

    #[test]
    fn test_parameters_normalized_into_key() {
        let resolved = ExtractionRequest::comments("https://www.youtube.com/watch?v=abc")
            .with_parameter("max_comments", 5000)
            .with_parameter("ignored", true)
            .resolve()
            .unwrap();
        assert_eq!(resolved.cache_key(), "comments:abc:max_comments=1000");

        let resolved = ExtractionRequest::transcript("https://youtu.be/abc").resolve().unwrap();
        assert_eq!(resolved.cache_key(), "transcript:abc:language=en");

        let err = ExtractionRequest::search("rust")
            .with_parameter("max_results", "ten")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidInput(_)));
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(ResourceKind::infer("https://www.youtube.com/playlist?list=PL1"), ResourceKind::Playlist);
        assert_eq!(ResourceKind::infer("https://www.youtube.com/watch?v=abc&list=PL1"), ResourceKind::Video);
        assert_eq!(ResourceKind::infer("https://www.youtube.com/@handle"), ResourceKind::Channel);
        assert_eq!(ResourceKind::infer("https://youtu.be/abc"), ResourceKind::Video);
    }
}
