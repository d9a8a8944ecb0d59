use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{VideoError, VideoResult};
use crate::models::{
    HealthStatus, MAX_LIST_LIMIT, MAX_RELATED_LIMIT, RelatedVideo, VideoDetail, VideoSummary,
};
use crate::repository::CatalogStore;

/// Extra ANN candidates requested to absorb the source video's own match.
pub const SELF_MATCH_OVERFETCH: usize = 1;

/// Catalog service: related-video resolution plus pass-through lookups
pub struct VideoService<R: CatalogStore> {
    repository: R,
}

impl<R: CatalogStore> VideoService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Videos most similar to `id`, best match first, never including `id`.
    ///
    /// Fetches the source embedding, asks the store for `limit + 1` nearest
    /// neighbours, drops every row carrying the source id and truncates to
    /// `limit`. A missing video and a video without an embedding produce the
    /// same [`VideoError::RelatedUnavailable`].
    #[instrument(skip(self))]
    pub async fn related_videos(&self, id: Uuid, limit: u32) -> VideoResult<Vec<RelatedVideo>> {
        check_limit(limit, MAX_RELATED_LIMIT)?;
        let limit = limit as usize;

        let source = self.repository.get_by_id(id).await?;
        let Some(embedding) = source.as_ref().and_then(|v| v.embedding()) else {
            info!(found = source.is_some(), "No embedding to search with");
            return Err(VideoError::RelatedUnavailable(id));
        };

        let matches = self
            .repository
            .ann_search(embedding, limit + SELF_MATCH_OVERFETCH)
            .await?;

        Ok(matches
            .into_iter()
            .filter(|m| m.video.id != id)
            .take(limit)
            .map(RelatedVideo::from)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_video(&self, id: Uuid) -> VideoResult<VideoDetail> {
        self.repository
            .get_by_id(id)
            .await?
            .map(|video| VideoDetail::from(&video))
            .ok_or(VideoError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn list_videos(&self, limit: u32) -> VideoResult<Vec<VideoSummary>> {
        check_limit(limit, MAX_LIST_LIMIT)?;
        let videos = self.repository.list(limit as usize).await?;
        Ok(videos.iter().map(VideoSummary::from).collect())
    }

    /// Connectivity probe listing the keyspace's tables
    #[instrument(skip(self))]
    pub async fn health(&self) -> VideoResult<HealthStatus> {
        let tables = self.repository.list_tables().await?;
        Ok(HealthStatus::ok(tables))
    }
}

fn check_limit(limit: u32, max: u32) -> VideoResult<()> {
    if (1..=max).contains(&limit) {
        Ok(())
    } else {
        Err(VideoError::Validation(format!(
            "limit must be between 1 and {}, got {}",
            max, limit
        )))
    }
}
