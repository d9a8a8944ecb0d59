use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_LIST_LIMIT: u32 = 10;
pub const MAX_LIST_LIMIT: u32 = 50;
pub const DEFAULT_RELATED_LIMIT: u32 = 5;
pub const MAX_RELATED_LIMIT: u32 = 20;

/// Display columns of the videos table, as named in storage.
pub const VIDEO_COLUMNS: &[&str] = &[
    "videoid",
    "name",
    "description",
    "tags",
    "location",
    "preview_image_location",
    "youtube_id",
    "userid",
    "added_date",
    "content_rating",
    "category",
    "language",
    "views",
];

/// One catalog entry as stored by the ingestion pipeline.
///
/// Every field other than `id` is optional. `embedding` is present only for
/// videos that went through offline feature extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Video {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub preview_image: Option<String>,
    pub youtube_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub content_rating: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub view_count: Option<i64>,
    pub average_rating: Option<f32>,
    pub embedding: Option<Vec<f32>>,
}

impl Video {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// The embedding, if present and non-empty.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref().filter(|v| !v.is_empty())
    }

    /// Preview image, falling back to the YouTube thumbnail when only the
    /// YouTube id was ingested.
    pub fn thumbnail_url(&self) -> Option<String> {
        self.preview_image.clone().or_else(|| {
            self.youtube_id
                .as_ref()
                .map(|yt| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", yt))
        })
    }
}

/// A video returned by an ANN query with its store-native similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
    pub video: Video,
    pub score: Option<f32>,
}

/// Listing entry returned by `GET /videos`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub video_id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub user_id: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(rename = "content_rating")]
    pub content_rating: String,
    pub category: String,
    pub view_count: i64,
    pub average_rating: Option<f32>,
}

impl From<&Video> for VideoSummary {
    fn from(video: &Video) -> Self {
        Self {
            video_id: video.id,
            title: video.title.clone().unwrap_or_default(),
            thumbnail_url: video.thumbnail_url().unwrap_or_default(),
            user_id: video.user_id,
            submitted_at: video.submitted_at,
            content_rating: video.content_rating.clone().unwrap_or_default(),
            category: video.category.clone().unwrap_or_default(),
            view_count: video.view_count.unwrap_or_default(),
            average_rating: video.average_rating,
        }
    }
}

/// Full record returned by `GET /videos/id/{videoId}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub summary: VideoSummary,
    pub description: String,
    pub tags: Vec<String>,
    pub location: String,
    pub language: String,
}

impl From<&Video> for VideoDetail {
    fn from(video: &Video) -> Self {
        Self {
            summary: VideoSummary::from(video),
            description: video.description.clone().unwrap_or_default(),
            tags: video.tags.clone(),
            location: video.location.clone().unwrap_or_default(),
            language: video.language.clone().unwrap_or_default(),
        }
    }
}

/// Entry of `GET /videos/id/{videoId}/related`, best match first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatedVideo {
    pub video_id: Uuid,
    pub title: String,
    pub upload_date: Option<DateTime<Utc>>,
    pub thumbnail_url: String,
    /// Similarity in the store's native scale, passed through unchanged
    pub score: Option<f32>,
    pub views: i64,
    pub average_rating: Option<f32>,
}

impl From<SimilarityMatch> for RelatedVideo {
    fn from(m: SimilarityMatch) -> Self {
        let thumbnail_url = m.video.thumbnail_url().unwrap_or_default();
        Self {
            video_id: m.video.id,
            title: m.video.title.unwrap_or_default(),
            upload_date: m.video.submitted_at,
            thumbnail_url,
            score: m.score,
            views: m.video.view_count.unwrap_or_default(),
            average_rating: m.video.average_rating,
        }
    }
}

/// Query parameters for `GET /videos`
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListVideosParams {
    /// Number of videos to return (1-50)
    #[serde(default = "default_list_limit")]
    #[validate(range(min = 1, max = 50))]
    #[param(minimum = 1, maximum = 50, default = 10)]
    pub limit: u32,
}

fn default_list_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

impl Default for ListVideosParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Query parameters for `GET /videos/id/{videoId}/related`
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RelatedVideosParams {
    /// Number of related videos to return (1-20)
    #[serde(default = "default_related_limit")]
    #[validate(range(min = 1, max = 20))]
    #[param(minimum = 1, maximum = 20, default = 5)]
    pub limit: u32,
}

fn default_related_limit() -> u32 {
    DEFAULT_RELATED_LIMIT
}

impl Default for RelatedVideosParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RELATED_LIMIT,
        }
    }
}

/// Body of a successful `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub tables: Vec<String>,
}

impl HealthStatus {
    pub fn ok(tables: Vec<String>) -> Self {
        Self {
            status: "ok".to_string(),
            tables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_serialize_to_defaults() {
        let id = Uuid::new_v4();
        let summary = serde_json::to_value(VideoSummary::from(&Video::new(id))).unwrap();

        assert_eq!(summary["videoId"], id.to_string());
        assert_eq!(summary["title"], "");
        assert_eq!(summary["thumbnailUrl"], "");
        assert_eq!(summary["content_rating"], "");
        assert_eq!(summary["viewCount"], 0);
        assert!(summary["submittedAt"].is_null());
        assert!(summary["averageRating"].is_null());
    }

    #[test]
    fn test_detail_flattens_summary() {
        let mut video = Video::new(Uuid::new_v4());
        video.title = Some("Cassandra 101".into());
        video.tags = vec!["cql".into()];

        let detail = serde_json::to_value(VideoDetail::from(&video)).unwrap();
        assert_eq!(detail["title"], "Cassandra 101");
        assert_eq!(detail["tags"][0], "cql");
        assert_eq!(detail["description"], "");
        assert!(detail.get("summary").is_none());
    }

    #[test]
    fn test_related_video_passes_score_through() {
        let mut video = Video::new(Uuid::new_v4());
        video.view_count = Some(42);
        let related = RelatedVideo::from(SimilarityMatch {
            video,
            score: Some(0.87),
        });

        let json = serde_json::to_value(&related).unwrap();
        assert_eq!(json["views"], 42);
        assert!((json["score"].as_f64().unwrap() - 0.87).abs() < 1e-6);
        assert!(json["uploadDate"].is_null());
    }

    #[test]
    fn test_thumbnail_falls_back_to_youtube() {
        let mut video = Video::new(Uuid::new_v4());
        video.youtube_id = Some("dQw4w9WgXcQ".into());
        assert_eq!(
            video.thumbnail_url().as_deref(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg")
        );

        video.preview_image = Some("https://cdn/x.jpg".into());
        assert_eq!(video.thumbnail_url().as_deref(), Some("https://cdn/x.jpg"));
    }

    #[test]
    fn test_empty_embedding_counts_as_absent() {
        let mut video = Video::new(Uuid::new_v4());
        assert!(video.embedding().is_none());
        video.embedding = Some(vec![]);
        assert!(video.embedding().is_none());
        video.embedding = Some(vec![0.5]);
        assert_eq!(video.embedding(), Some(&[0.5][..]));
    }
}
