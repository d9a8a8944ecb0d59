//! Typed-vector adapter over the Astra Data API.
//!
//! Commands are JSON documents POSTed to
//! `{endpoint}/api/json/v1/{keyspace}/{table}`; the query vector travels as a
//! JSON number array in the `sort` clause and the store does the ANN ranking.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::{CatalogConfig, DataApiConfig};
use crate::error::{VideoError, VideoResult};
use crate::models::{SimilarityMatch, VIDEO_COLUMNS, Video};
use crate::repository::CatalogStore;

const API_PATH: &str = "api/json/v1";

/// Catalog adapter backed by the Astra Data API
pub struct DataApiCatalog {
    client: Client,
    token: String,
    keyspace_url: String,
    table_url: String,
    vector_column: String,
}

impl DataApiCatalog {
    /// Build the adapter. The HTTP client is created once and shared by all requests.
    pub fn new(config: DataApiConfig, catalog: &CatalogConfig) -> VideoResult<Self> {
        catalog.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VideoError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = config.endpoint.trim_end_matches('/');
        let keyspace_url = format!("{}/{}/{}", endpoint, API_PATH, catalog.keyspace);
        let table_url = format!("{}/{}", keyspace_url, catalog.table);

        Ok(Self {
            client,
            token: config.token,
            keyspace_url,
            table_url,
            vector_column: catalog.vector_column.clone(),
        })
    }

    fn projection(&self, with_vector: bool) -> Value {
        let mut projection: Map<String, Value> = VIDEO_COLUMNS
            .iter()
            .map(|c| (c.to_string(), json!(1)))
            .collect();
        if with_vector {
            projection.insert(self.vector_column.clone(), json!(1));
        }
        Value::Object(projection)
    }

    async fn command(&self, url: &str, command: Value) -> VideoResult<CommandResponse> {
        let response = self
            .client
            .post(url)
            .header("Token", &self.token)
            .json(&command)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VideoError::Store(format!(
                "Data API error ({}): {}",
                status, error_text
            )));
        }

        let body: CommandResponse = response.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.iter().map(ApiError::describe).collect();
            return Err(VideoError::Store(format!(
                "Data API error: {}",
                messages.join("; ")
            )));
        }

        Ok(body)
    }

    fn decode(&self, document: Map<String, Value>) -> VideoResult<(Video, Option<f32>)> {
        let mut doc: VideoDocument = serde_json::from_value(Value::Object(document))
            .map_err(|e| VideoError::Store(format!("Malformed Data API row: {}", e)))?;

        let embedding = match doc.rest.remove(&self.vector_column) {
            None | Some(Value::Null) => None,
            Some(raw) => Some(decode_vector(raw)?),
        };

        let video = Video {
            id: doc.videoid.into_uuid(),
            title: doc.name,
            description: doc.description,
            tags: doc.tags.unwrap_or_default(),
            location: doc.location,
            preview_image: doc.preview_image_location,
            youtube_id: doc.youtube_id,
            user_id: doc.userid.map(UuidValue::into_uuid),
            submitted_at: doc.added_date.map(Timestamp::into_datetime).transpose()?,
            content_rating: doc.content_rating,
            category: doc.category,
            language: doc.language,
            view_count: doc.views,
            average_rating: None,
            embedding,
        };

        Ok((video, doc.similarity))
    }
}

#[async_trait]
impl CatalogStore for DataApiCatalog {
    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> VideoResult<Option<Video>> {
        let command = json!({
            "findOne": {
                "filter": { "videoid": id },
                "projection": self.projection(true),
            }
        });

        let response = self.command(&self.table_url, command).await?;
        match response.data.and_then(|d| d.document) {
            Some(document) => Ok(Some(self.decode(document)?.0)),
            None => {
                debug!("No row for video");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, query), fields(dimensions = query.len()))]
    async fn ann_search(&self, query: &[f32], k: usize) -> VideoResult<Vec<SimilarityMatch>> {
        let mut sort = Map::new();
        sort.insert(self.vector_column.clone(), json!(query));

        let command = json!({
            "find": {
                "filter": {},
                "sort": sort,
                "projection": self.projection(false),
                "options": { "limit": k, "includeSimilarity": true },
            }
        });

        let response = self.command(&self.table_url, command).await?;
        let documents = response.data.map(|d| d.documents).unwrap_or_default();
        debug!(rows = documents.len(), "ANN query returned");

        documents
            .into_iter()
            .map(|doc| {
                self.decode(doc)
                    .map(|(video, score)| SimilarityMatch { video, score })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: usize) -> VideoResult<Vec<Video>> {
        let command = json!({
            "find": {
                "filter": {},
                "projection": self.projection(false),
                "options": { "limit": limit },
            }
        });

        let response = self.command(&self.table_url, command).await?;
        response
            .data
            .map(|d| d.documents)
            .unwrap_or_default()
            .into_iter()
            .map(|doc| self.decode(doc).map(|(video, _)| video))
            .collect()
    }

    #[instrument(skip(self))]
    async fn list_tables(&self) -> VideoResult<Vec<String>> {
        let response = self
            .command(&self.keyspace_url, json!({ "listTables": {} }))
            .await?;
        Ok(response.status.map(|s| s.tables).unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    data: Option<ResponseData>,
    #[serde(default)]
    status: Option<ResponseStatus>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(default)]
    document: Option<Map<String, Value>>,
    #[serde(default)]
    documents: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ResponseStatus {
    #[serde(default)]
    tables: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: String,
}

impl ApiError {
    fn describe(&self) -> String {
        match &self.error_code {
            Some(code) => format!("{}: {}", code, self.message),
            None => self.message.clone(),
        }
    }
}

/// Row shape; the vector column has a configurable name and stays in `rest`.
#[derive(Debug, Deserialize)]
struct VideoDocument {
    videoid: UuidValue,
    name: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    location: Option<String>,
    preview_image_location: Option<String>,
    youtube_id: Option<String>,
    userid: Option<UuidValue>,
    added_date: Option<Timestamp>,
    content_rating: Option<String>,
    category: Option<String>,
    language: Option<String>,
    views: Option<i64>,
    #[serde(rename = "$similarity")]
    similarity: Option<f32>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UuidValue {
    Plain(Uuid),
    Tagged {
        #[serde(rename = "$uuid")]
        uuid: Uuid,
    },
}

impl UuidValue {
    fn into_uuid(self) -> Uuid {
        match self {
            UuidValue::Plain(id) | UuidValue::Tagged { uuid: id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Text(DateTime<Utc>),
    Millis {
        #[serde(rename = "$date")]
        millis: i64,
    },
}

impl Timestamp {
    fn into_datetime(self) -> VideoResult<DateTime<Utc>> {
        match self {
            Timestamp::Text(dt) => Ok(dt),
            Timestamp::Millis { millis } => DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                VideoError::Store(format!("Malformed $date: {} ms is out of range", millis))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VectorValue {
    Floats(Vec<f32>),
    Binary {
        #[serde(rename = "$binary")]
        binary: String,
    },
}

/// Decode a vector column given either as a number array or as
/// `{"$binary": <base64 of big-endian f32s>}`.
fn decode_vector(raw: Value) -> VideoResult<Vec<f32>> {
    let value: VectorValue = serde_json::from_value(raw)
        .map_err(|e| VideoError::Store(format!("Malformed vector column: {}", e)))?;

    match value {
        VectorValue::Floats(values) => Ok(values),
        VectorValue::Binary { binary } => {
            let bytes = BASE64
                .decode(binary.as_bytes())
                .map_err(|e| VideoError::Store(format!("Malformed $binary vector: {}", e)))?;
            if bytes.len() % 4 != 0 {
                return Err(VideoError::Store(format!(
                    "Malformed $binary vector: {} bytes is not a whole number of f32s",
                    bytes.len()
                )));
            }
            Ok(bytes
                .chunks_exact(4)
                .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    const TOKEN: &str = "AstraCS:test-token";
    const TABLE_PATH: &str = "/api/json/v1/killrvideo/videos";

    fn catalog(server: &ServerGuard) -> DataApiCatalog {
        DataApiCatalog::new(
            DataApiConfig::new(server.url(), TOKEN),
            &CatalogConfig::default(),
        )
        .unwrap()
    }

    fn binary_vector(values: &[f32]) -> String {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        BASE64.encode(bytes)
    }

    #[tokio::test]
    async fn test_get_by_id_decodes_row() {
        let mut server = Server::new_async().await;
        let id = Uuid::new_v4();
        let owner = Uuid::new_v4();

        let mock = server
            .mock("POST", TABLE_PATH)
            .match_header("token", TOKEN)
            .match_body(Matcher::PartialJson(json!({
                "findOne": { "filter": { "videoid": id.to_string() } }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": { "document": {
                        "videoid": id.to_string(),
                        "name": "Intro to vector search",
                        "tags": ["ann", "cql"],
                        "userid": owner.to_string(),
                        "added_date": "2024-05-01T10:00:00.000Z",
                        "views": 12,
                        "content_features": [0.1, 0.2, 0.3]
                    }}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let video = catalog(&server).get_by_id(id).await.unwrap().unwrap();
        mock.assert_async().await;

        assert_eq!(video.id, id);
        assert_eq!(video.title.as_deref(), Some("Intro to vector search"));
        assert_eq!(video.tags, vec!["ann", "cql"]);
        assert_eq!(video.user_id, Some(owner));
        assert_eq!(video.view_count, Some(12));
        assert_eq!(video.embedding, Some(vec![0.1, 0.2, 0.3]));
        assert!(video.submitted_at.is_some());
        assert!(video.category.is_none());
    }

    #[tokio::test]
    async fn test_get_by_id_absent_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", TABLE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"document": null}}"#)
            .create_async()
            .await;

        let result = catalog(&server).get_by_id(Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_binary_vector_and_tagged_values() {
        let mut server = Server::new_async().await;
        let id = Uuid::new_v4();
        let _mock = server
            .mock("POST", TABLE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": { "document": {
                        "videoid": { "$uuid": id.to_string() },
                        "added_date": { "$date": 1_714_557_600_000_i64 },
                        "content_features": { "$binary": binary_vector(&[1.0, -0.5]) }
                    }}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let video = catalog(&server).get_by_id(id).await.unwrap().unwrap();
        assert_eq!(video.id, id);
        assert_eq!(video.embedding, Some(vec![1.0, -0.5]));
        assert_eq!(
            video.submitted_at.map(|d| d.timestamp_millis()),
            Some(1_714_557_600_000)
        );
    }

    #[tokio::test]
    async fn test_ann_search_sends_vector_and_reads_similarity() {
        let mut server = Server::new_async().await;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let mock = server
            .mock("POST", TABLE_PATH)
            .match_body(Matcher::PartialJson(json!({
                "find": {
                    "sort": { "content_features": [0.5, 0.25] },
                    "options": { "limit": 6, "includeSimilarity": true }
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": { "documents": [
                        { "videoid": a.to_string(), "name": "first", "$similarity": 0.99 },
                        { "videoid": b.to_string(), "name": "second", "$similarity": 0.75 }
                    ], "nextPageState": null }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let matches = catalog(&server).ann_search(&[0.5, 0.25], 6).await.unwrap();
        mock.assert_async().await;

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].video.id, a);
        assert_eq!(matches[1].video.id, b);
        assert!((matches[0].score.unwrap() - 0.99).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_error_body_is_store_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", TABLE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"errors": [{"errorCode": "TABLE_NOT_FOUND", "message": "no such table"}]}"#,
            )
            .create_async()
            .await;

        let err = catalog(&server).list(10).await.unwrap_err();
        match err {
            VideoError::Store(msg) => assert!(msg.contains("TABLE_NOT_FOUND")),
            other => panic!("expected Store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_failure_is_store_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", TABLE_PATH)
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let err = catalog(&server).get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, VideoError::Store(_)));
    }

    #[tokio::test]
    async fn test_list_tables_targets_keyspace() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/json/v1/killrvideo")
            .match_body(Matcher::Json(json!({ "listTables": {} })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": {"tables": ["users", "videos"]}}"#)
            .create_async()
            .await;

        let tables = catalog(&server).list_tables().await.unwrap();
        mock.assert_async().await;
        assert_eq!(tables, vec!["users", "videos"]);
    }

    #[tokio::test]
    async fn test_out_of_range_date_is_store_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", TABLE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": { "document": {
                        "videoid": Uuid::new_v4().to_string(),
                        "added_date": { "$date": i64::MAX }
                    }}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = catalog(&server).get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, VideoError::Store(msg) if msg.contains("$date")));
    }

    #[test]
    fn test_truncated_binary_is_rejected() {
        let raw = json!({ "$binary": BASE64.encode([0u8, 1, 2]) });
        assert!(decode_vector(raw).is_err());
    }
}
