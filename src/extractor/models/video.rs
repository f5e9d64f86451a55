// Video records and engagement metrics

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{format_duration, string_list};
use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// YYYYMMDD
    pub upload_date: Option<String>,
    pub channel: String,
    pub channel_id: String,
    pub channel_url: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub view_count: u64,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub duration_seconds: u64,
    pub duration_string: String,
}

/// Ratios against views; zero when there are no views
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub like_to_view_ratio: f64,
    pub comment_to_view_ratio: f64,
}

impl Engagement {
    pub fn compute(views: u64, likes: Option<u64>, comments: Option<u64>) -> Self {
        let ratio = |count: Option<u64>| {
            if views == 0 {
                0.0
            } else {
                count.unwrap_or(0) as f64 / views as f64
            }
        };
        Self {
            like_to_view_ratio: ratio(likes),
            comment_to_view_ratio: ratio(comments),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technical {
    pub age_limit: u64,
    pub availability: Option<String>,
    pub live_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub metadata: VideoMetadata,
    pub statistics: VideoStats,
    pub engagement: Engagement,
    pub technical: Technical,
    pub url: String,
    pub webpage_url: String,
}

impl VideoInfo {
    pub fn from_raw(json: &Value) -> Result<Self, EngineError> {
        if !json.is_object() {
            return Err(EngineError::Parse("video record is not a JSON object".to_string()));
        }

        let view_count = json["view_count"].as_u64().unwrap_or(0);
        let like_count = json["like_count"].as_u64();
        let comment_count = json["comment_count"].as_u64();
        let duration_seconds = json["duration"].as_f64().unwrap_or(0.0) as u64;

        let metadata = VideoMetadata {
            id: json["id"].as_str().unwrap_or("").to_string(),
            title: json["title"].as_str().unwrap_or("").to_string(),
            description: json["description"].as_str().map(str::to_string),
            upload_date: json["upload_date"]
                .as_str()
                .filter(|d| d.len() == 8)
                .map(str::to_string),
            channel: json["uploader"]
                .as_str()
                .or_else(|| json["channel"].as_str())
                .unwrap_or("")
                .to_string(),
            channel_id: json["channel_id"]
                .as_str()
                .or_else(|| json["uploader_id"].as_str())
                .unwrap_or("")
                .to_string(),
            channel_url: json["channel_url"]
                .as_str()
                .or_else(|| json["uploader_url"].as_str())
                .unwrap_or("")
                .to_string(),
            tags: string_list(&json["tags"]),
            categories: string_list(&json["categories"]),
            thumbnail: json["thumbnail"].as_str().map(str::to_string),
        };

        let statistics = VideoStats {
            view_count,
            like_count,
            comment_count,
            duration_seconds,
            duration_string: json["duration_string"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format_duration(duration_seconds)),
        };

        Ok(Self {
            metadata,
            engagement: Engagement::compute(view_count, like_count, comment_count),
            statistics,
            technical: Technical {
                age_limit: json["age_limit"].as_u64().unwrap_or(0),
                availability: json["availability"].as_str().map(str::to_string),
                live_status: json["live_status"].as_str().map(str::to_string),
            },
            url: json["original_url"].as_str().unwrap_or("").to_string(),
            webpage_url: json["webpage_url"].as_str().unwrap_or("").to_string(),
        })
    }

    pub fn engagement_report(&self) -> EngagementReport {
        EngagementReport::from_video(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Benchmark {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Below Average")]
    BelowAverage,
}

impl Benchmark {
    /// Grade a percentage rate against descending thresholds
    fn grade(rate: f64, thresholds: [f64; 3]) -> Self {
        if rate > thresholds[0] {
            Self::Excellent
        } else if rate > thresholds[1] {
            Self::Good
        } else if rate > thresholds[2] {
            Self::Average
        } else {
            Self::BelowAverage
        }
    }

    fn is_strong(&self) -> bool {
        matches!(self, Self::Excellent | Self::Good)
    }
}

/// Engagement analysis graded against typical platform rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementReport {
    pub title: String,
    pub channel: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    /// Percentages
    pub like_rate: f64,
    pub comment_rate: f64,
    pub total_engagement_rate: f64,
    pub like_performance: Benchmark,
    pub comment_performance: Benchmark,
    pub overall_assessment: Benchmark,
    pub recommendations: Vec<String>,
}

impl EngagementReport {
    const LIKE_THRESHOLDS: [f64; 3] = [4.0, 2.0, 1.0];
    const COMMENT_THRESHOLDS: [f64; 3] = [0.5, 0.2, 0.1];

    pub fn from_video(video: &VideoInfo) -> Self {
        let views = video.statistics.view_count;
        let likes = video.statistics.like_count.unwrap_or(0);
        let comments = video.statistics.comment_count.unwrap_or(0);
        let percent = |n: u64| if views == 0 { 0.0 } else { n as f64 * 100.0 / views as f64 };

        let like_rate = percent(likes);
        let comment_rate = percent(comments);
        let like_performance = Benchmark::grade(like_rate, Self::LIKE_THRESHOLDS);
        let comment_performance = Benchmark::grade(comment_rate, Self::COMMENT_THRESHOLDS);

        let overall_assessment = if like_performance == Benchmark::Excellent && comment_performance.is_strong() {
            Benchmark::Excellent
        } else if like_performance.is_strong() || comment_performance.is_strong() {
            Benchmark::Good
        } else {
            Benchmark::Average
        };

        let recommendations = vec![
            if comment_rate > 0.2 {
                "Comment activity is healthy; top comments are worth reviewing for audience feedback"
            } else {
                "Low comment engagement; asking viewers a question can encourage discussion"
            }
            .to_string(),
            if like_rate > 2.0 {
                "Strong like engagement indicates good content reception"
            } else {
                "Like rate is modest; title and thumbnail may need work"
            }
            .to_string(),
        ];

        Self {
            title: video.metadata.title.clone(),
            channel: video.metadata.channel.clone(),
            views,
            likes,
            comments,
            like_rate,
            comment_rate,
            total_engagement_rate: percent(likes.saturating_add(comments)),
            like_performance,
            comment_performance,
            overall_assessment,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ratios_from_engine_record() {
        let raw = json!({
            "id": "abc",
            "title": "A video",
            "view_count": 1000,
            "like_count": 50,
            "comment_count": 25,
            "duration": 213.0,
        });
        let video = VideoInfo::from_raw(&raw).unwrap();
        assert_eq!(video.engagement.like_to_view_ratio, 0.05);
        assert_eq!(video.engagement.comment_to_view_ratio, 0.025);
        assert_eq!(video.statistics.duration_string, "3:33");
    }

    #[test]
    fn test_zero_views_yield_zero_ratios() {
        let raw = json!({ "id": "abc", "view_count": 0, "like_count": 10, "comment_count": 3 });
        let video = VideoInfo::from_raw(&raw).unwrap();
        assert_eq!(video.engagement.like_to_view_ratio, 0.0);
        assert_eq!(video.engagement.comment_to_view_ratio, 0.0);

        let report = video.engagement_report();
        assert_eq!(report.like_rate, 0.0);
        assert_eq!(report.like_performance, Benchmark::BelowAverage);
    }

    #[test]
    fn test_missing_counts_default_sensibly() {
        let video = VideoInfo::from_raw(&json!({ "id": "abc" })).unwrap();
        assert_eq!(video.statistics.view_count, 0);
        assert_eq!(video.statistics.like_count, None);
        assert_eq!(video.statistics.duration_string, "0:00");
        assert!(VideoInfo::from_raw(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_engagement_benchmarks() {
        let raw = json!({ "id": "abc", "view_count": 1000, "like_count": 50, "comment_count": 3 });
        let report = VideoInfo::from_raw(&raw).unwrap().engagement_report();
        assert_eq!(report.like_performance, Benchmark::Excellent);
        assert_eq!(report.comment_performance, Benchmark::Good);
        assert_eq!(report.overall_assessment, Benchmark::Excellent);
        assert_eq!(report.recommendations.len(), 2);
    }

    #[test]
    fn test_absurd_counts_saturate() {
        let raw = json!({ "id": "abc", "view_count": 10, "like_count": u64::MAX, "comment_count": 5 });
        let report = VideoInfo::from_raw(&raw).unwrap().engagement_report();
        assert_eq!(report.likes, u64::MAX);
        assert!(report.total_engagement_rate.is_finite());
        assert_eq!(report.total_engagement_rate, report.like_rate);
    }
}
