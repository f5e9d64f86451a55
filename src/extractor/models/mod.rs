// Typed domain records built from raw engine output

pub mod channel;
pub mod comment;
pub mod playlist;
pub mod search;
pub mod transcript;
pub mod video;

pub use channel::ChannelInfo;
pub use comment::{Comment, CommentThread, CommentThreads};
pub use playlist::{PlaylistInfo, PlaylistItem};
pub use search::SearchResults;
pub use transcript::{Transcript, TranscriptEntry, TranscriptMatch};
pub use video::{Benchmark, Engagement, EngagementReport, VideoInfo};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::{ResolvedRequest, ResourceKind};
use crate::engine::EngineError;

/// One normalized record per resource kind. This is what the cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainRecord {
    Video(VideoInfo),
    Channel(ChannelInfo),
    Playlist(PlaylistInfo),
    Search(SearchResults),
    Trending(SearchResults),
    Comments(CommentThreads),
    Transcript(Transcript),
}

impl DomainRecord {
    /// Normalize raw engine output for `request`. Untyped JSON stops here.
    pub fn normalize(request: &ResolvedRequest, raw: &Value) -> Result<Self, EngineError> {
        let limit = |name: &str| {
            request
                .parameters
                .get(name)
                .and_then(Value::as_u64)
                .unwrap_or(u64::MAX) as usize
        };

        Ok(match request.kind {
            ResourceKind::Video => Self::Video(VideoInfo::from_raw(raw)?),
            ResourceKind::Channel => Self::Channel(ChannelInfo::from_raw(raw, limit("max_videos"))?),
            ResourceKind::Playlist => Self::Playlist(PlaylistInfo::from_raw(raw, limit("max_videos"))?),
            ResourceKind::Search => Self::Search(SearchResults::from_raw(
                raw,
                &request.identifier,
                limit("max_results"),
            )?),
            ResourceKind::Trending => {
                Self::Trending(SearchResults::from_raw(raw, "trending", limit("max_results"))?)
            }
            ResourceKind::Comments => {
                Self::Comments(CommentThreads::from_raw(raw, limit("max_comments"))?)
            }
            ResourceKind::Transcript => {
                let mut transcript = Transcript::from_raw(raw)?;
                if transcript.video_id.is_empty() {
                    transcript.video_id = request.identifier.clone();
                }
                Self::Transcript(transcript)
            }
        })
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Video(_) => ResourceKind::Video,
            Self::Channel(_) => ResourceKind::Channel,
            Self::Playlist(_) => ResourceKind::Playlist,
            Self::Search(_) => ResourceKind::Search,
            Self::Trending(_) => ResourceKind::Trending,
            Self::Comments(_) => ResourceKind::Comments,
            Self::Transcript(_) => ResourceKind::Transcript,
        }
    }

    pub fn as_video(&self) -> Option<&VideoInfo> {
        match self {
            Self::Video(video) => Some(video),
            _ => None,
        }
    }

    pub fn as_transcript(&self) -> Option<&Transcript> {
        match self {
            Self::Transcript(transcript) => Some(transcript),
            _ => None,
        }
    }
}

/// A video as it appears in flat listings (search, playlists, channel uploads)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    pub channel: Option<String>,
    pub duration_seconds: Option<u64>,
    pub view_count: Option<u64>,
}

impl VideoSummary {
    /// `None` for entries without an id (deleted or private items)
    pub fn from_entry(json: &Value) -> Option<Self> {
        let id = json["id"].as_str().filter(|id| !id.is_empty())?;

        let url = json["url"]
            .as_str()
            .filter(|u| u.starts_with("http"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", id));

        Some(Self {
            id: id.to_string(),
            title: json["title"].as_str().unwrap_or("").to_string(),
            url,
            channel: json["channel"]
                .as_str()
                .or_else(|| json["uploader"].as_str())
                .map(str::to_string),
            duration_seconds: json["duration"].as_f64().map(|d| d as u64),
            view_count: json["view_count"].as_u64(),
        })
    }
}

/// `H:MM:SS`, or `M:SS` under an hour
pub(crate) fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

pub(crate) fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::request::ExtractionRequest;
    use serde_json::json;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(7322), "2:02:02");
    }

    #[test]
    fn test_normalize_dispatches_on_kind() {
        let resolved = ExtractionRequest::search("rust").resolve().unwrap();
        let raw = json!({ "entries": [{ "id": "aaaaaaaaaaa", "title": "t" }] });
        let record = DomainRecord::normalize(&resolved, &raw).unwrap();
        assert_eq!(record.kind(), ResourceKind::Search);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["kind"], "search");
        assert_eq!(value["query"], "rust");
    }

    #[test]
    fn test_trending_labelled() {
        let resolved = ExtractionRequest::trending().resolve().unwrap();
        let record = DomainRecord::normalize(&resolved, &json!({ "entries": [] })).unwrap();
        match record {
            DomainRecord::Trending(results) => assert_eq!(results.query, "trending"),
            other => panic!("unexpected record {:?}", other),
        }
    }
}
