use async_trait::async_trait;
use uuid::Uuid;

use crate::error::VideoResult;
use crate::models::{SimilarityMatch, Video};

/// Read-only access to the video catalog.
///
/// Implementations hide backend query construction. The resolver in
/// [`VideoService`](crate::service::VideoService) is written against this
/// trait only and cannot tell which backend is in use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Exact primary-key lookup. A well-formed but absent id is `Ok(None)`.
    async fn get_by_id(&self, id: Uuid) -> VideoResult<Option<Video>>;

    /// Approximate top-`k` by similarity to `query`, best match first.
    ///
    /// May return fewer than `k` rows. `query` must have the dimensionality
    /// the index was built with.
    async fn ann_search(&self, query: &[f32], k: usize) -> VideoResult<Vec<SimilarityMatch>>;

    /// First `limit` videos in the store's natural order.
    async fn list(&self, limit: usize) -> VideoResult<Vec<Video>>;

    /// Table names of the keyspace; doubles as the connectivity probe.
    async fn list_tables(&self) -> VideoResult<Vec<String>>;
}
