use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use youtube_toolkit::engine::EngineError;
use youtube_toolkit::testing::MockEngine;
use youtube_toolkit::{Config, ToolServer};

const VIDEO: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const OTHER: &str = "https://www.youtube.com/watch?v=aaaaaaaaaaa";

fn video_raw() -> Value {
    json!({
        "id": "dQw4w9WgXcQ",
        "title": "Never Gonna Give You Up",
        "uploader": "Rick Astley",
        "view_count": 1000,
        "like_count": 50,
        "comment_count": 25,
        "duration": 213,
    })
}

fn transcript_raw() -> Value {
    json!({
        "video_id": "dQw4w9WgXcQ",
        "language": "en",
        "is_auto_generated": false,
        "events": [
            { "tStartMs": 0, "dDurationMs": 4000, "segs": [{ "utf8": "We're no strangers to love" }] },
            { "tStartMs": 4000, "dDurationMs": 4000, "segs": [{ "utf8": "You know the rules" }] },
            { "tStartMs": 62000, "dDurationMs": 3000, "segs": [{ "utf8": "Never gonna give you up" }] },
        ],
    })
}

fn config() -> Config {
    Config {
        max_retries: 2,
        retry_delay: Duration::from_millis(10),
        ..Config::default()
    }
}

fn server(engine: &Arc<MockEngine>) -> ToolServer {
    ToolServer::new(engine.clone(), &config())
}

#[tokio::test(start_paused = true)]
async fn test_resource_info_is_cached_until_cleared() {
    let engine = Arc::new(MockEngine::new().with_response(VIDEO, video_raw()));
    let server = server(&engine);

    let first = server
        .dispatch("get_resource_info", json!({ "url": VIDEO }))
        .await
        .unwrap();
    assert_eq!(first["kind"], "video");
    assert_eq!(first["engagement"]["like_to_view_ratio"], 0.05);
    assert_eq!(first["engagement"]["comment_to_view_ratio"], 0.025);

    server
        .dispatch("get_resource_info", json!({ "url": VIDEO, "kind": "video" }))
        .await
        .unwrap();
    assert_eq!(engine.call_count(), 1);

    let health = server.dispatch("get_health", Value::Null).await.unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["cache"]["keys"], json!(["video:dQw4w9WgXcQ"]));

    let cleared = server.dispatch("clear_cache", json!({})).await.unwrap();
    assert_eq!(cleared["cleared"], 1);

    server
        .dispatch("get_resource_info", json!({ "url": VIDEO }))
        .await
        .unwrap();
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_batch_reports_partial_success() {
    let engine = Arc::new(
        MockEngine::new()
            .with_response(VIDEO, video_raw())
            .with_failures(OTHER, 3, EngineError::from("ERROR: HTTP Error 503: Service Unavailable")),
    );
    let server = server(&engine);

    let result = server
        .dispatch(
            "batch_extract",
            json!({
                "requests": [
                    { "url": VIDEO },
                    { "url": OTHER, "kind": "video" },
                    { "url": "definitely not a url" },
                ],
                "concurrency": 2,
            }),
        )
        .await
        .unwrap();

    assert_eq!(result["succeeded"], 1);
    assert_eq!(result["failed"], 2);
    let items = result["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["ok"], true);
    assert_eq!(items[1]["error"]["kind"], "exhausted_retries");
    assert_eq!(items[2]["error"]["kind"], "invalid_input");
    assert_eq!(engine.calls_for(OTHER), 3);
}

#[tokio::test(start_paused = true)]
async fn test_batch_with_unknown_kind_still_runs_valid_entries() {
    let engine = Arc::new(MockEngine::new().with_response(VIDEO, video_raw()));
    let server = server(&engine);

    let result = server
        .dispatch(
            "batch_extract",
            json!({ "requests": [{ "url": VIDEO }, { "url": VIDEO, "kind": "podcast" }] }),
        )
        .await
        .unwrap();

    assert_eq!(result["succeeded"], 1);
    assert_eq!(result["failed"], 1);
    let items = result["items"].as_array().unwrap();
    assert_eq!(items[0]["ok"], true);
    assert_eq!(items[0]["result"]["kind"], "video");
    assert_eq!(items[1]["ok"], false);
    assert_eq!(items[1]["request"]["kind"], "podcast");
    assert_eq!(items[1]["error"]["kind"], "invalid_input");
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transcript_tools() {
    let engine = Arc::new(MockEngine::new().with_response(VIDEO, transcript_raw()));
    let server = server(&engine);

    let transcript = server
        .dispatch("get_transcript", json!({ "url": VIDEO }))
        .await
        .unwrap();
    assert_eq!(transcript["kind"], "transcript");
    assert_eq!(transcript["entry_count"], 3);
    assert_eq!(transcript["total_duration"], 65.0);
    assert!(transcript.get("text_at").is_none());

    let spoken = server
        .dispatch("get_transcript", json!({ "url": VIDEO, "at": 5.5 }))
        .await
        .unwrap();
    assert_eq!(spoken["text_at"], "You know the rules");

    let silent = server
        .dispatch("get_transcript", json!({ "url": VIDEO, "at": 30 }))
        .await
        .unwrap();
    assert!(silent["text_at"].is_null());

    let found = server
        .dispatch("search_transcript", json!({ "url": VIDEO, "query": "never gonna" }))
        .await
        .unwrap();
    assert_eq!(found["match_count"], 1);
    assert_eq!(found["matches"][0]["timestamp"], "01:02");

    // Every call above is served from the cached transcript
    assert_eq!(engine.call_count(), 1);
    assert_eq!(engine.calls()[0].parameters["language"], "en");
}

#[tokio::test(start_paused = true)]
async fn test_engagement_and_comments() {
    let comments = json!({
        "id": "dQw4w9WgXcQ",
        "comments": [
            { "id": "c1", "text": "classic", "parent": "root" },
            { "id": "c1.a", "text": "agreed", "parent": "c1" },
        ],
    });
    let engine = Arc::new(MockEngine::new().with_response(VIDEO, video_raw()));
    let server = server(&engine);

    let report = server
        .dispatch("analyze_engagement", json!({ "url": VIDEO }))
        .await
        .unwrap();
    assert_eq!(report["like_performance"], "Excellent");
    assert_eq!(report["comment_performance"], "Excellent");

    let engine = Arc::new(MockEngine::new().with_response(VIDEO, comments));
    let server = ToolServer::new(engine.clone(), &config());
    let threads = server
        .dispatch("get_comments", json!({ "url": VIDEO, "max_comments": 10 }))
        .await
        .unwrap();
    assert_eq!(threads["threads"][0]["replies"][0]["text"], "agreed");
}

#[tokio::test(start_paused = true)]
async fn test_terminal_error_surfaces_directly() {
    let engine = Arc::new(
        MockEngine::new().always_failing(VIDEO, EngineError::from("ERROR: [youtube] dQw4w9WgXcQ: Video unavailable")),
    );
    let server = server(&engine);

    let response = server
        .handle_line(&json!({ "id": "x1", "tool": "get_resource_info", "arguments": { "url": VIDEO } }).to_string())
        .await;
    assert_eq!(response["id"], "x1");
    assert_eq!(response["ok"], false);
    assert_eq!(response["error"]["kind"], "engine_failure");
    assert_eq!(response["error"]["reason"], "video_unavailable");
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_degraded_health_and_config() {
    let engine = Arc::new(MockEngine::new().without_engine());
    let server = server(&engine);

    let health = server.dispatch("get_health", json!({})).await.unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["engine_available"], false);
    assert!(health["engine_version"].is_null());

    let config = server.dispatch("get_config", json!({})).await.unwrap();
    assert_eq!(config["max_retries"], 2);
    assert_eq!(config["cache_ttl_seconds"], 3600);
    assert_eq!(config["engine_mode"], "auto");
}

#[tokio::test(start_paused = true)]
async fn test_search_and_trending() {
    let listing = json!({ "entries": [{ "id": "aaaaaaaaaaa", "title": "Rust in 100 seconds" }] });
    let engine = Arc::new(
        MockEngine::new()
            .with_response("rust", listing.clone())
            .with_response("", listing),
    );
    let server = server(&engine);

    let search = server
        .dispatch("search_resources", json!({ "query": "rust", "max_results": 3 }))
        .await
        .unwrap();
    assert_eq!(search["query"], "rust");
    assert_eq!(search["results"][0]["url"], "https://www.youtube.com/watch?v=aaaaaaaaaaa");

    let trending = server.dispatch("get_trending", json!({})).await.unwrap();
    assert_eq!(trending["kind"], "trending");
    assert_eq!(trending["query"], "trending");

    let calls = engine.calls();
    assert_eq!(calls[0].parameters["max_results"], 3);
    assert_eq!(calls[1].parameters["max_results"], 10);
}
