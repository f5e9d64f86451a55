use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::VideoSummary;
use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The search query, or "trending"
    pub query: String,
    pub results: Vec<VideoSummary>,
}

impl SearchResults {
    pub fn from_raw(json: &Value, query: &str, max_results: usize) -> Result<Self, EngineError> {
        let entries = json["entries"]
            .as_array()
            .ok_or_else(|| EngineError::Parse("search listing has no entries array".to_string()))?;

        Ok(Self {
            query: query.to_string(),
            results: entries
                .iter()
                .filter_map(VideoSummary::from_entry)
                .take(max_results)
                .collect(),
        })
    }
}
