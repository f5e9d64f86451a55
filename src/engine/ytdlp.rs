// yt-dlp subprocess engine
//
// Every resource kind maps onto one yt-dlp invocation that prints JSON:
// - video / comments: --dump-json on the watch URL
// - channel / playlist / search / trending: --flat-playlist --dump-single-json
// - transcript: --dump-json for the caption listing, then an HTTP fetch of
//   the chosen json3 track

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::captions;
use super::command::YtDlpCommand;
use super::errors::EngineError;
use super::process::run_output_with_timeout;
use super::traits::{EngineConfig, EngineMode, ExtractionEngine};
use crate::extractor::request::{Parameters, ResourceKind};

const TRENDING_URL: &str = "https://www.youtube.com/feed/trending";
const CHANNEL_TABS: [&str; 6] = ["/videos", "/shorts", "/streams", "/playlists", "/featured", "/live"];

/// Engine backed by the yt-dlp program
pub struct YtDlpEngine {
    command: YtDlpCommand,
    config: EngineConfig,
}

impl YtDlpEngine {
    /// Locate yt-dlp for the configured mode
    pub fn new(config: EngineConfig) -> Self {
        let command = YtDlpCommand::resolve(&config);
        tracing::info!(program = command.program(), mode = %command.mode(), "yt-dlp engine ready");
        Self { command, config }
    }

    /// Use an already resolved command
    pub fn with_command(command: YtDlpCommand, config: EngineConfig) -> Self {
        Self { command, config }
    }

    pub fn mode(&self) -> EngineMode {
        self.command.mode()
    }

    /// Options shared by every invocation
    fn base_args(&self) -> Vec<String> {
        let mut args = self.command.prefix_args();
        args.push("--no-warnings".to_string());
        args.push("--socket-timeout".to_string());
        args.push(self.config.socket_timeout_seconds.to_string());

        if let Some(rate) = &self.config.rate_limit {
            args.push("--limit-rate".to_string());
            args.push(rate.clone());
        }

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        if let Some(path) = &self.config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.clone());
        }

        args
    }

    /// Full argument list for one fetch, target last
    fn build_args(&self, kind: ResourceKind, url: &str, parameters: &Parameters) -> Vec<String> {
        let mut args = self.base_args();
        let count = |name: &str, default: u64| {
            parameters
                .get(name)
                .and_then(Value::as_u64)
                .unwrap_or(default)
        };

        let target = match kind {
            ResourceKind::Video | ResourceKind::Transcript => {
                args.extend(["--dump-json", "--no-download", "--no-playlist"].map(String::from));
                url.to_string()
            }
            ResourceKind::Comments => {
                args.extend(
                    ["--dump-json", "--no-download", "--no-playlist", "--write-comments"].map(String::from),
                );
                args.push("--extractor-args".to_string());
                args.push(format!("youtube:max_comments={}", count("max_comments", 100)));
                url.to_string()
            }
            ResourceKind::Channel => {
                push_listing_args(&mut args, count("max_videos", 10));
                channel_videos_url(url)
            }
            ResourceKind::Playlist => {
                push_listing_args(&mut args, count("max_videos", 200));
                url.to_string()
            }
            ResourceKind::Search => {
                let n = count("max_results", 10);
                push_listing_args(&mut args, n);
                format!("ytsearch{}:{}", n, url)
            }
            ResourceKind::Trending => {
                push_listing_args(&mut args, count("max_results", 10));
                TRENDING_URL.to_string()
            }
        };

        args.push(target);
        args
    }

    async fn run_json(&self, args: Vec<String>) -> Result<Value, EngineError> {
        let limit = Duration::from_secs(self.config.process_timeout_seconds);
        let output = run_output_with_timeout(self.command.program(), &args, limit).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(status = ?output.status.code(), stderr = %stderr.trim(), "yt-dlp failed");
            return Err(EngineError::from(stderr.into_owned()));
        }

        parse_json(&output.stdout)
    }

    async fn fetch_transcript(&self, url: &str, parameters: &Parameters) -> Result<Value, EngineError> {
        let language = parameters
            .get("language")
            .and_then(Value::as_str)
            .unwrap_or("en");

        let info = self
            .run_json(self.build_args(ResourceKind::Transcript, url, parameters))
            .await?;
        let video_id = info["id"].as_str().unwrap_or("").to_string();

        let track = captions::select_track(&info, language).ok_or_else(|| {
            EngineError::Unavailable(format!("no captions for video {}", video_id))
        })?;
        if !track.language.eq_ignore_ascii_case(language) {
            tracing::info!(requested = language, using = %track.language, "requested caption language missing");
        }

        captions::fetch_track(
            &video_id,
            &track,
            self.config.proxy.as_deref(),
            Duration::from_secs(self.config.socket_timeout_seconds),
        )
        .await
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe_version(&self) -> Result<String, EngineError> {
        let mut args = self.command.prefix_args();
        args.push("--version".to_string());

        let limit = Duration::from_secs(self.config.socket_timeout_seconds.min(30));
        let output = run_output_with_timeout(self.command.program(), &args, limit).await?;

        if !output.status.success() {
            return Err(EngineError::from(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if version.is_empty() {
            return Err(EngineError::Parse("empty version output".to_string()));
        }
        Ok(version)
    }

    async fn fetch(
        &self,
        kind: ResourceKind,
        url: &str,
        parameters: &Parameters,
    ) -> Result<Value, EngineError> {
        tracing::debug!(kind = %kind, url, "yt-dlp fetch");

        match kind {
            ResourceKind::Transcript => self.fetch_transcript(url, parameters).await,
            _ => self.run_json(self.build_args(kind, url, parameters)).await,
        }
    }
}

fn push_listing_args(args: &mut Vec<String>, limit: u64) {
    args.extend(["--flat-playlist", "--dump-single-json"].map(String::from));
    args.push("--playlist-end".to_string());
    args.push(limit.to_string());
}

/// Point a channel URL at its uploads tab unless a tab is already named
fn channel_videos_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if CHANNEL_TABS.iter().any(|tab| trimmed.ends_with(tab)) {
        trimmed.to_string()
    } else {
        format!("{}/videos", trimmed)
    }
}

fn parse_json(stdout: &[u8]) -> Result<Value, EngineError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Err(EngineError::Parse("no data returned from yt-dlp".to_string()));
    }
    serde_json::from_str(text).map_err(|e| EngineError::Parse(format!("Invalid JSON: {}", e)))
}
