// Tool surface: named operations with JSON arguments and JSON results

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::engine::{ExtractionEngine, YtDlpEngine};
use crate::extractor::{
    BatchDispatcher, BatchInput, DomainRecord, ExtractionError, ExtractionRequest, Extractor,
    HealthReporter, Parameters, ResourceKind, ResponseCache,
};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Extraction(e) => e.kind().as_str(),
            Self::Encode(_) => "internal",
        }
    }

    fn plain_json(&self) -> Value {
        json!({ "kind": self.kind(), "message": self.to_string() })
    }

    /// `{"kind", "message"}` plus reason/hint for extraction failures
    pub fn to_json(&self) -> Value {
        match self {
            Self::Extraction(e) => serde_json::to_value(e.to_report()).unwrap_or_else(|_| self.plain_json()),
            _ => self.plain_json(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// Argument names; a trailing `?` marks optional ones
    pub arguments: &'static [&'static str],
}

const TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "get_resource_info",
        description: "Metadata for a video, channel, playlist or search; kind inferred from the URL when omitted",
        arguments: &["url", "kind?"],
    },
    ToolDescriptor {
        name: "get_comments",
        description: "Comment threads of a video",
        arguments: &["url", "max_comments?"],
    },
    ToolDescriptor {
        name: "get_transcript",
        description: "Timed transcript of a video with full text, optionally the line spoken at a time",
        arguments: &["url", "language?", "at?"],
    },
    ToolDescriptor {
        name: "search_transcript",
        description: "Transcript lines containing a query, with timestamps",
        arguments: &["url", "query", "case_sensitive?", "language?"],
    },
    ToolDescriptor {
        name: "search_resources",
        description: "Search videos by query",
        arguments: &["query", "max_results?"],
    },
    ToolDescriptor {
        name: "get_trending",
        description: "Currently trending videos",
        arguments: &["max_results?"],
    },
    ToolDescriptor {
        name: "analyze_engagement",
        description: "Engagement rates of a video graded against typical benchmarks",
        arguments: &["url"],
    },
    ToolDescriptor {
        name: "batch_extract",
        description: "Extract many resources concurrently; reports per-item success or failure",
        arguments: &["requests", "concurrency?"],
    },
    ToolDescriptor {
        name: "get_health",
        description: "Engine availability, cache state and active configuration",
        arguments: &[],
    },
    ToolDescriptor {
        name: "get_config",
        description: "Active configuration",
        arguments: &[],
    },
    ToolDescriptor {
        name: "clear_cache",
        description: "Drop every cached response",
        arguments: &[],
    },
    ToolDescriptor {
        name: "list_tools",
        description: "Describe the available tools",
        arguments: &[],
    },
];

#[derive(Deserialize)]
struct ResourceArgs {
    url: String,
    kind: Option<String>,
}

#[derive(Deserialize)]
struct UrlArgs {
    url: String,
}

#[derive(Deserialize)]
struct CommentArgs {
    url: String,
    max_comments: Option<Value>,
}

#[derive(Deserialize)]
struct TranscriptArgs {
    url: String,
    language: Option<Value>,
    /// Seconds into the video
    at: Option<f64>,
}

#[derive(Deserialize)]
struct TranscriptSearchArgs {
    url: String,
    query: String,
    #[serde(default)]
    case_sensitive: bool,
    language: Option<Value>,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    max_results: Option<Value>,
}

#[derive(Deserialize)]
struct TrendingArgs {
    max_results: Option<Value>,
}

#[derive(Deserialize)]
struct BatchArgs {
    requests: Vec<BatchEntry>,
    concurrency: Option<usize>,
}

#[derive(Deserialize)]
struct BatchEntry {
    url: String,
    kind: Option<String>,
    #[serde(default)]
    parameters: Parameters,
}

#[derive(Deserialize)]
struct ToolCall {
    #[serde(default)]
    id: Value,
    tool: String,
    #[serde(default)]
    arguments: Value,
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(format!("{}: {}", tool, e)))
}

fn request_kind(url: &str, kind: Option<&str>) -> Result<ResourceKind, ExtractionError> {
    match kind {
        Some(kind) => ResourceKind::from_str(kind),
        None => Ok(ResourceKind::infer(url)),
    }
}

fn with_optional(request: ExtractionRequest, name: &str, value: Option<Value>) -> ExtractionRequest {
    match value {
        Some(value) => request.with_parameter(name, value),
        None => request,
    }
}

/// Owns the extractor stack and answers tool calls
pub struct ToolServer {
    extractor: Arc<Extractor>,
    batch: BatchDispatcher,
    health: HealthReporter,
}

impl ToolServer {
    /// Wire the stack around `engine`
    pub fn new(engine: Arc<dyn ExtractionEngine>, config: &Config) -> Self {
        let cache = Arc::new(ResponseCache::new(config.cache_ttl, config.enable_cache));
        let extractor = Arc::new(Extractor::new(
            engine,
            cache,
            config.retry_policy(),
            config.timeout,
        ));

        Self {
            batch: BatchDispatcher::new(Arc::clone(&extractor), config.batch_concurrency),
            health: HealthReporter::new(Arc::clone(&extractor), config.snapshot()),
            extractor,
        }
    }

    /// Production stack backed by yt-dlp
    pub fn from_config(config: &Config) -> Self {
        let engine = YtDlpEngine::new(config.engine_config());
        Self::new(Arc::new(engine), config)
    }

    pub fn extractor(&self) -> &Arc<Extractor> {
        &self.extractor
    }

    pub fn list_tools() -> &'static [ToolDescriptor] {
        TOOLS
    }

    pub async fn dispatch(&self, tool: &str, arguments: Value) -> Result<Value, ToolError> {
        tracing::debug!(tool, "tool call");

        match tool {
            "get_resource_info" => {
                let args: ResourceArgs = parse_args(tool, arguments)?;
                let kind = request_kind(&args.url, args.kind.as_deref())?;
                self.record(ExtractionRequest::new(kind, args.url)).await
            }
            "get_comments" => {
                let args: CommentArgs = parse_args(tool, arguments)?;
                let request = with_optional(ExtractionRequest::comments(args.url), "max_comments", args.max_comments);
                self.record(request).await
            }
            "get_transcript" => {
                let args: TranscriptArgs = parse_args(tool, arguments)?;
                let request = with_optional(ExtractionRequest::transcript(args.url), "language", args.language);
                let record = self.extractor.extract(&request).await?;
                let mut value = serde_json::to_value(record.as_ref())?;
                if let (Some(transcript), Some(obj)) = (record.as_transcript(), value.as_object_mut()) {
                    obj.insert("full_text".into(), transcript.full_text().into());
                    obj.insert("total_duration".into(), transcript.total_duration().into());
                    obj.insert("entry_count".into(), transcript.entries.len().into());
                    if let Some(at) = args.at {
                        obj.insert("at".into(), at.into());
                        obj.insert("text_at".into(), transcript.text_at(at).into());
                    }
                }
                Ok(value)
            }
            "search_transcript" => {
                let args: TranscriptSearchArgs = parse_args(tool, arguments)?;
                if args.query.trim().is_empty() {
                    return Err(ExtractionError::InvalidInput("search query cannot be empty".to_string()).into());
                }
                let request = with_optional(ExtractionRequest::transcript(args.url), "language", args.language);
                let record = self.extractor.extract(&request).await?;
                let transcript = record.as_transcript().ok_or_else(|| {
                    ToolError::InvalidArguments("resource is not a transcript".to_string())
                })?;
                let matches = transcript.search(&args.query, args.case_sensitive);
                Ok(json!({
                    "video_id": transcript.video_id,
                    "language": transcript.language,
                    "query": args.query,
                    "case_sensitive": args.case_sensitive,
                    "match_count": matches.len(),
                    "matches": matches,
                }))
            }
            "search_resources" => {
                let args: SearchArgs = parse_args(tool, arguments)?;
                let request = with_optional(ExtractionRequest::search(args.query), "max_results", args.max_results);
                self.record(request).await
            }
            "get_trending" => {
                let args: TrendingArgs = parse_args(tool, arguments)?;
                let request = with_optional(ExtractionRequest::trending(), "max_results", args.max_results);
                self.record(request).await
            }
            "analyze_engagement" => {
                let args: UrlArgs = parse_args(tool, arguments)?;
                let report = self.extractor.engagement(&args.url).await?;
                Ok(serde_json::to_value(report)?)
            }
            "batch_extract" => {
                let args: BatchArgs = parse_args(tool, arguments)?;
                // A bad entry fails as its own item, never the whole call
                let inputs: Vec<BatchInput> = args
                    .requests
                    .into_iter()
                    .map(|entry| match request_kind(&entry.url, entry.kind.as_deref()) {
                        Ok(kind) => BatchInput::Request(
                            ExtractionRequest::new(kind, entry.url).with_parameters(entry.parameters),
                        ),
                        Err(error) => BatchInput::Rejected {
                            kind: entry.kind.unwrap_or_default(),
                            resource_url: entry.url,
                            error,
                        },
                    })
                    .collect();
                let result = self.batch.batch_extract(inputs, args.concurrency).await;
                Ok(serde_json::to_value(result)?)
            }
            "get_health" => Ok(serde_json::to_value(self.health.health().await)?),
            "get_config" => Ok(serde_json::to_value(self.health.config())?),
            "clear_cache" => {
                let cleared = self.extractor.cache().clear();
                Ok(json!({ "cleared": cleared }))
            }
            "list_tools" => Ok(serde_json::to_value(TOOLS)?),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    /// Answer one newline-delimited call `{"id"?, "tool", "arguments"}`.
    /// Always produces a response, including for malformed lines.
    pub async fn handle_line(&self, line: &str) -> Value {
        let call: ToolCall = match serde_json::from_str(line) {
            Ok(call) => call,
            Err(e) => {
                let err = ToolError::InvalidArguments(format!("malformed call: {}", e));
                return json!({ "id": Value::Null, "ok": false, "error": err.to_json() });
            }
        };

        match self.dispatch(&call.tool, call.arguments).await {
            Ok(result) => json!({ "id": call.id, "ok": true, "result": result }),
            Err(e) => {
                tracing::info!(tool = %call.tool, kind = e.kind(), error = %e, "tool call failed");
                json!({ "id": call.id, "ok": false, "error": e.to_json() })
            }
        }
    }

    async fn record(&self, request: ExtractionRequest) -> Result<Value, ToolError> {
        let record: Arc<DomainRecord> = self.extractor.extract(&request).await?;
        Ok(serde_json::to_value(record.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;

    fn server(engine: MockEngine) -> ToolServer {
        ToolServer::new(Arc::new(engine), &Config::default())
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = server(MockEngine::new()).dispatch("nope", Value::Null).await.unwrap_err();
        assert_eq!(err.kind(), "unknown_tool");
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid_arguments() {
        let err = server(MockEngine::new())
            .dispatch("get_comments", json!({ "max_comments": 5 }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
        assert_eq!(err.to_json()["kind"], "invalid_arguments");
    }

    #[tokio::test]
    async fn test_empty_transcript_query_rejected_before_engine() {
        let err = server(MockEngine::new())
            .dispatch("search_transcript", json!({ "url": "https://youtu.be/abc", "query": "  " }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_unknown_kind_rejected() {
        let err = server(MockEngine::new())
            .dispatch("get_resource_info", json!({ "url": "https://youtu.be/abc", "kind": "podcast" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn test_malformed_line_answers_with_error() {
        let server = server(MockEngine::new());
        let response = server.handle_line("{not json").await;
        assert_eq!(response["ok"], false);
        assert_eq!(response["error"]["kind"], "invalid_arguments");

        let response = server.handle_line(r#"{"id": 7, "tool": "clear_cache"}"#).await;
        assert_eq!(response["id"], 7);
        assert_eq!(response["ok"], true);
        assert_eq!(response["result"]["cleared"], 0);
    }

    #[test]
    fn test_tool_list_names_every_operation() {
        let names: Vec<&str> = ToolServer::list_tools().iter().map(|t| t.name).collect();
        for expected in [
            "get_resource_info",
            "get_comments",
            "get_transcript",
            "search_transcript",
            "search_resources",
            "get_trending",
            "analyze_engagement",
            "batch_extract",
            "get_health",
            "get_config",
            "clear_cache",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }
}
