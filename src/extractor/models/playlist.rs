use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{format_duration, VideoSummary};
use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// 1-based position in the playlist
    pub index: usize,
    #[serde(flatten)]
    pub video: VideoSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub uploader: String,
    pub uploader_id: String,
    pub item_count: usize,
    pub total_duration_seconds: u64,
    pub total_duration: String,
    pub total_views: u64,
    pub items: Vec<PlaylistItem>,
}

impl PlaylistInfo {
    pub fn from_raw(json: &Value, max_videos: usize) -> Result<Self, EngineError> {
        let entries = json["entries"].as_array().ok_or_else(|| {
            EngineError::Parse("playlist listing has no entries array".to_string())
        })?;

        let items: Vec<PlaylistItem> = entries
            .iter()
            .filter_map(VideoSummary::from_entry)
            .take(max_videos)
            .enumerate()
            .map(|(i, video)| PlaylistItem { index: i + 1, video })
            .collect();

        let total_duration_seconds = items
            .iter()
            .filter_map(|item| item.video.duration_seconds)
            .fold(0u64, u64::saturating_add);
        let total_views = items
            .iter()
            .filter_map(|item| item.video.view_count)
            .fold(0u64, u64::saturating_add);

        Ok(Self {
            id: json["id"].as_str().unwrap_or("").to_string(),
            title: json["title"].as_str().unwrap_or("").to_string(),
            description: json["description"]
                .as_str()
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            uploader: json["uploader"]
                .as_str()
                .or_else(|| json["channel"].as_str())
                .unwrap_or("")
                .to_string(),
            uploader_id: json["uploader_id"]
                .as_str()
                .or_else(|| json["channel_id"].as_str())
                .unwrap_or("")
                .to_string(),
            item_count: items.len(),
            total_duration_seconds,
            total_duration: format_duration(total_duration_seconds),
            total_views,
            items,
        })
    }
}
