// Caption track selection and download

use serde_json::{json, Map, Value};
use std::time::Duration;

use super::errors::EngineError;

/// A caption track chosen from the engine's track listing
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language: String,
    pub url: String,
    pub is_auto_generated: bool,
}

/// Pick the best `json3` caption track for `language`.
///
/// Preference: requested language, its regional variants, English, anything.
/// Within each tier uploader subtitles win over automatic captions.
pub fn select_track(info: &Value, language: &str) -> Option<CaptionTrack> {
    let manual = info["subtitles"].as_object();
    let automatic = info["automatic_captions"].as_object();

    let language = language.to_lowercase();
    let variant_prefix = format!("{}-", language);
    let tiers: [&dyn Fn(&str) -> bool; 4] = [
        &|key: &str| key == language,
        &|key: &str| key.starts_with(&variant_prefix),
        &|key: &str| key == "en" || key.starts_with("en-"),
        &|_: &str| true,
    ];

    for matches in tiers {
        for (tracks, is_auto) in [(manual, false), (automatic, true)] {
            if let Some(track) = tracks.and_then(|t| find_in(t, matches, is_auto)) {
                return Some(track);
            }
        }
    }

    None
}

fn find_in(tracks: &Map<String, Value>, matches: &dyn Fn(&str) -> bool, is_auto: bool) -> Option<CaptionTrack> {
    let mut keys: Vec<&String> = tracks
        .keys()
        .filter(|key| key.as_str() != "live_chat" && matches(key.to_lowercase().as_str()))
        .collect();
    keys.sort();

    keys.into_iter().find_map(|key| {
        tracks[key].as_array()?.iter().find_map(|format| {
            if format["ext"].as_str() != Some("json3") {
                return None;
            }
            Some(CaptionTrack {
                language: key.clone(),
                url: format["url"].as_str()?.to_string(),
                is_auto_generated: is_auto,
            })
        })
    })
}

/// Download a json3 track and wrap it with its identifying fields.
pub async fn fetch_track(
    video_id: &str,
    track: &CaptionTrack,
    proxy: Option<&str>,
    timeout: Duration,
) -> Result<Value, EngineError> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| EngineError::Execution(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }
    let client = builder
        .build()
        .map_err(|e| EngineError::Execution(format!("failed to build HTTP client: {}", e)))?;

    tracing::debug!(video_id, language = %track.language, "downloading caption track");

    let response = client.get(&track.url).send().await.map_err(|e| {
        if e.is_timeout() {
            EngineError::Timeout(timeout.as_secs())
        } else {
            EngineError::from(format!("caption download failed: {}", e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(EngineError::from(format!(
            "caption download failed: HTTP {}",
            status.as_u16()
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| EngineError::Parse(format!("invalid caption JSON: {}", e)))?;

    Ok(json!({
        "video_id": video_id,
        "language": track.language,
        "is_auto_generated": track.is_auto_generated,
        "events": body.get("events").cloned().unwrap_or_else(|| json!([])),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(langs: &[&str]) -> Value {
        let mut map = Map::new();
        for lang in langs {
            map.insert(
                lang.to_string(),
                json!([
                    {"ext": "vtt", "url": format!("https://t/{}.vtt", lang)},
                    {"ext": "json3", "url": format!("https://t/{}.json3", lang)},
                ]),
            );
        }
        Value::Object(map)
    }

    #[test]
    fn test_manual_track_preferred_in_same_tier() {
        let info = json!({
            "subtitles": tracks(&["de"]),
            "automatic_captions": tracks(&["de", "en"]),
        });
        let track = select_track(&info, "de").unwrap();
        assert_eq!(track.language, "de");
        assert!(!track.is_auto_generated);
        assert_eq!(track.url, "https://t/de.json3");
    }

    #[test]
    fn test_requested_language_beats_manual_english() {
        let info = json!({
            "subtitles": tracks(&["en"]),
            "automatic_captions": tracks(&["fr"]),
        });
        let track = select_track(&info, "fr").unwrap();
        assert_eq!(track.language, "fr");
        assert!(track.is_auto_generated);
    }

    #[test]
    fn test_regional_variant_then_english_fallback() {
        let info = json!({ "subtitles": tracks(&["pt-BR", "en-US"]) });
        assert_eq!(select_track(&info, "pt").unwrap().language, "pt-BR");
        assert_eq!(select_track(&info, "ja").unwrap().language, "en-US");
    }

    #[test]
    fn test_no_tracks() {
        assert!(select_track(&json!({}), "en").is_none());
        let info = json!({ "subtitles": { "live_chat": [{"ext": "json3", "url": "x"}] } });
        assert!(select_track(&info, "en").is_none());
    }
}
