//! Literal-embedding adapter over the CQL native protocol.
//!
//! Point lookups and listings bind their values. The ANN query cannot bind
//! the vector in `ANN OF`, so the embedding is rendered with
//! [`format_vector_literal`] and spliced into the statement text together
//! with the validated keyspace/table/column identifiers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::cassandra::{CassandraConfig, LazyCassandraSession, Session, lazy_session};
use scylla::DeserializeRow;
use scylla::response::query_result::QueryResult;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::error::{VideoError, VideoResult};
use crate::literal::format_vector_literal;
use crate::models::{SimilarityMatch, VIDEO_COLUMNS, Video};
use crate::repository::CatalogStore;

/// Catalog adapter backed by a Cassandra/Astra CQL session
pub struct CqlCatalog {
    session: LazyCassandraSession,
    catalog: CatalogConfig,
    columns: String,
}

impl CqlCatalog {
    /// Build the adapter; the session connects on the first query.
    pub fn new(cassandra: CassandraConfig, catalog: CatalogConfig) -> VideoResult<Self> {
        Self::with_session(lazy_session(cassandra), catalog)
    }

    pub fn with_session(session: LazyCassandraSession, catalog: CatalogConfig) -> VideoResult<Self> {
        catalog.validate()?;
        Ok(Self {
            session,
            catalog,
            columns: VIDEO_COLUMNS.join(", "),
        })
    }

    async fn session(&self) -> VideoResult<&Session> {
        Ok(&**self.session.get().await?)
    }

    fn lookup_query(&self) -> String {
        format!(
            "SELECT {}, {} AS embedding FROM {} WHERE videoid = ?",
            self.columns,
            self.catalog.vector_column,
            self.catalog.qualified_table()
        )
    }

    fn list_query(&self) -> String {
        format!(
            "SELECT {}, {} AS embedding FROM {} LIMIT ?",
            self.columns,
            self.catalog.vector_column,
            self.catalog.qualified_table()
        )
    }

    /// `SELECT ... ORDER BY <col> ANN OF [<literal>] LIMIT <k>`, scored with the
    /// configured similarity function.
    pub fn ann_query(&self, query: &[f32], k: usize) -> VideoResult<String> {
        let literal = format_vector_literal(query)?;
        let column = &self.catalog.vector_column;
        Ok(format!(
            "SELECT {columns}, {score}({column}, [{literal}]) AS similarity \
             FROM {table} ORDER BY {column} ANN OF [{literal}] LIMIT {k}",
            columns = self.columns,
            score = self.catalog.similarity.cql_function(),
            table = self.catalog.qualified_table(),
        ))
    }
}

#[async_trait]
impl CatalogStore for CqlCatalog {
    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> VideoResult<Option<Video>> {
        let result = self
            .session()
            .await?
            .query_unpaged(self.lookup_query(), (id,))
            .await
            .map_err(store_error)?;

        Ok(decode_rows::<VideoRow>(result)?
            .into_iter()
            .next()
            .map(Video::from))
    }

    #[instrument(skip(self, query), fields(dimensions = query.len()))]
    async fn ann_search(&self, query: &[f32], k: usize) -> VideoResult<Vec<SimilarityMatch>> {
        // The query vector is a stored embedding, so an unrenderable one is bad store data.
        let statement = self.ann_query(query, k).map_err(|e| match e {
            VideoError::Validation(msg) => VideoError::Store(format!("stored embedding: {}", msg)),
            other => other,
        })?;
        let result = self
            .session()
            .await?
            .query_unpaged(statement, &[])
            .await
            .map_err(store_error)?;

        let rows = decode_rows::<MatchRow>(result)?;
        debug!(rows = rows.len(), "ANN query returned");
        Ok(rows.into_iter().map(SimilarityMatch::from).collect())
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: usize) -> VideoResult<Vec<Video>> {
        let limit = i32::try_from(limit)
            .map_err(|_| VideoError::Validation(format!("limit {} is too large", limit)))?;

        let result = self
            .session()
            .await?
            .query_unpaged(self.list_query(), (limit,))
            .await
            .map_err(store_error)?;

        Ok(decode_rows::<VideoRow>(result)?
            .into_iter()
            .map(Video::from)
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_tables(&self) -> VideoResult<Vec<String>> {
        let session = self.session().await?;
        Ok(database::cassandra::list_tables(session, &self.catalog.keyspace).await?)
    }
}

fn store_error(err: impl std::fmt::Display) -> VideoError {
    VideoError::Store(err.to_string())
}

fn decode_rows<R>(result: QueryResult) -> VideoResult<Vec<R>>
where
    R: for<'frame, 'metadata> scylla::deserialize::row::DeserializeRow<'frame, 'metadata>,
{
    result
        .into_rows_result()
        .map_err(store_error)?
        .rows::<R>()
        .map_err(store_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(store_error)
}

#[derive(Debug, DeserializeRow)]
struct VideoRow {
    videoid: Uuid,
    name: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    location: Option<String>,
    preview_image_location: Option<String>,
    youtube_id: Option<String>,
    userid: Option<Uuid>,
    added_date: Option<DateTime<Utc>>,
    content_rating: Option<String>,
    category: Option<String>,
    language: Option<String>,
    views: Option<i32>,
    embedding: Option<Vec<f32>>,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Video {
            id: row.videoid,
            title: row.name,
            description: row.description,
            tags: row.tags.unwrap_or_default(),
            location: row.location,
            preview_image: row.preview_image_location,
            youtube_id: row.youtube_id,
            user_id: row.userid,
            submitted_at: row.added_date,
            content_rating: row.content_rating,
            category: row.category,
            language: row.language,
            view_count: row.views.map(i64::from),
            average_rating: None,
            embedding: row.embedding,
        }
    }
}

/// ANN result row; the embedding itself is not read back.
#[derive(Debug, DeserializeRow)]
struct MatchRow {
    videoid: Uuid,
    name: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    location: Option<String>,
    preview_image_location: Option<String>,
    youtube_id: Option<String>,
    userid: Option<Uuid>,
    added_date: Option<DateTime<Utc>>,
    content_rating: Option<String>,
    category: Option<String>,
    language: Option<String>,
    views: Option<i32>,
    similarity: Option<f32>,
}

impl From<MatchRow> for SimilarityMatch {
    fn from(row: MatchRow) -> Self {
        let video = Video {
            id: row.videoid,
            title: row.name,
            description: row.description,
            tags: row.tags.unwrap_or_default(),
            location: row.location,
            preview_image: row.preview_image_location,
            youtube_id: row.youtube_id,
            user_id: row.userid,
            submitted_at: row.added_date,
            content_rating: row.content_rating,
            category: row.category,
            language: row.language,
            view_count: row.views.map(i64::from),
            average_rating: None,
            embedding: None,
        };
        SimilarityMatch {
            video,
            score: row.similarity,
        }
    }
}
