// Comment threads rebuilt from the engine's flat comment list

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub author_id: Option<String>,
    pub text: String,
    pub like_count: u64,
    pub timestamp: Option<i64>,
    pub is_pinned: bool,
    pub is_hearted: bool,
    pub by_uploader: bool,
}

impl Comment {
    fn from_raw(json: &Value) -> Self {
        Self {
            id: json["id"].as_str().unwrap_or("").to_string(),
            author: json["author"].as_str().unwrap_or("").to_string(),
            author_id: json["author_id"].as_str().map(str::to_string),
            text: json["text"].as_str().unwrap_or("").to_string(),
            like_count: json["like_count"].as_u64().unwrap_or(0),
            timestamp: json["timestamp"].as_i64(),
            is_pinned: json["is_pinned"].as_bool().unwrap_or(false),
            is_hearted: json["is_favorited"].as_bool().unwrap_or(false),
            by_uploader: json["author_is_uploader"].as_bool().unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentThreads {
    pub video_id: String,
    pub title: String,
    /// Count reported by the platform, which may exceed what was fetched
    pub total_count: Option<u64>,
    pub threads: Vec<CommentThread>,
}

impl CommentThreads {
    pub fn from_raw(json: &Value, max_comments: usize) -> Result<Self, EngineError> {
        if !json.is_object() {
            return Err(EngineError::Parse("comment record is not a JSON object".to_string()));
        }

        let raw_comments = json["comments"].as_array().map(Vec::as_slice).unwrap_or(&[]);

        Ok(Self {
            video_id: json["id"].as_str().unwrap_or("").to_string(),
            title: json["title"].as_str().unwrap_or("").to_string(),
            total_count: json["comment_count"].as_u64(),
            threads: build_threads(raw_comments, max_comments),
        })
    }

    pub fn reply_count(&self) -> usize {
        self.threads.iter().map(|t| t.replies.len()).sum()
    }
}

/// Group comments into threads, keeping the engine's ordering of top-level
/// comments. Replies attach by `parent` id or arrive nested under `replies`.
fn build_threads(raw: &[Value], max_threads: usize) -> Vec<CommentThread> {
    let mut threads: Vec<CommentThread> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut orphans: Vec<(String, Comment)> = Vec::new();

    for item in raw {
        let comment = Comment::from_raw(item);
        match item["parent"].as_str() {
            Some(parent) if parent != "root" => orphans.push((parent.to_string(), comment)),
            _ => {
                let replies = item["replies"]
                    .as_array()
                    .map(|r| r.iter().map(Comment::from_raw).collect())
                    .unwrap_or_default();
                index.insert(comment.id.clone(), threads.len());
                threads.push(CommentThread { comment, replies });
            }
        }
    }

    for (parent, reply) in orphans {
        match index.get(&parent) {
            Some(&i) => threads[i].replies.push(reply),
            None => tracing::debug!(parent = %parent, "dropping reply without a parent thread"),
        }
    }

    threads.truncate(max_threads);
    threads
}
