// Timed transcripts parsed from json3 caption events

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Seconds
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub text: String,
    /// `MM:SS` of `start`
    pub timestamp: String,
}

impl TranscriptEntry {
    fn contains(&self, start: f64) -> bool {
        self.start <= start && start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    pub is_auto_generated: bool,
    pub entries: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMatch {
    pub timestamp: String,
    pub start: f64,
    pub text: String,
}

impl Transcript {
    pub fn from_raw(json: &Value) -> Result<Self, EngineError> {
        let events = json["events"]
            .as_array()
            .ok_or_else(|| EngineError::Parse("caption track has no events".to_string()))?;

        let entries = events
            .iter()
            .filter_map(|event| {
                let segs = event["segs"].as_array()?;
                let text: String = segs
                    .iter()
                    .filter_map(|seg| seg["utf8"].as_str())
                    .collect::<String>()
                    .replace('\n', " ");
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }

                let start = event["tStartMs"].as_f64().unwrap_or(0.0) / 1000.0;
                let duration = event["dDurationMs"].as_f64().unwrap_or(0.0) / 1000.0;
                Some(TranscriptEntry {
                    start,
                    end: start + duration,
                    duration,
                    text: text.to_string(),
                    timestamp: format_timestamp(start),
                })
            })
            .collect();

        Ok(Self {
            video_id: json["video_id"].as_str().unwrap_or("").to_string(),
            language: json["language"].as_str().unwrap_or("").to_string(),
            is_auto_generated: json["is_auto_generated"].as_bool().unwrap_or(false),
            entries,
        })
    }

    pub fn full_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// End of the last entry, in seconds
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|e| e.end).fold(0.0, f64::max)
    }

    /// Text spoken at `seconds`, if any entry covers it
    pub fn text_at(&self, seconds: f64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.contains(seconds))
            .map(|e| e.text.as_str())
    }

    pub fn search(&self, query: &str, case_sensitive: bool) -> Vec<TranscriptMatch> {
        let needle = if case_sensitive {
            query.to_string()
        } else {
            query.to_lowercase()
        };

        self.entries
            .iter()
            .filter(|e| {
                if case_sensitive {
                    e.text.contains(&needle)
                } else {
                    e.text.to_lowercase().contains(&needle)
                }
            })
            .map(|e| TranscriptMatch {
                timestamp: e.timestamp.clone(),
                start: e.start,
                text: e.text.clone(),
            })
            .collect()
    }
}

fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
