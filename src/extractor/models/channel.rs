use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{string_list, VideoSummary};
use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub subscriber_count: Option<u64>,
    /// Total uploads when the engine reports it, else the number listed
    pub video_count: u64,
    pub verified: bool,
    pub tags: Vec<String>,
    pub recent_videos: Vec<VideoSummary>,
}

impl ChannelInfo {
    pub fn from_raw(json: &Value, max_videos: usize) -> Result<Self, EngineError> {
        if !json.is_object() {
            return Err(EngineError::Parse("channel record is not a JSON object".to_string()));
        }

        let recent_videos: Vec<VideoSummary> = json["entries"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(VideoSummary::from_entry)
                    .take(max_videos)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id: json["channel_id"]
                .as_str()
                .or_else(|| json["id"].as_str())
                .unwrap_or("")
                .to_string(),
            name: json["channel"]
                .as_str()
                .or_else(|| json["uploader"].as_str())
                .or_else(|| json["title"].as_str())
                .unwrap_or("")
                .to_string(),
            url: json["channel_url"]
                .as_str()
                .or_else(|| json["uploader_url"].as_str())
                .or_else(|| json["webpage_url"].as_str())
                .unwrap_or("")
                .to_string(),
            description: json["description"].as_str().map(str::to_string),
            subscriber_count: json["channel_follower_count"].as_u64(),
            video_count: json["playlist_count"]
                .as_u64()
                .unwrap_or(recent_videos.len() as u64),
            verified: json["channel_is_verified"].as_bool().unwrap_or(false),
            tags: string_list(&json["tags"]),
            recent_videos,
        })
    }
}
