use axum::{Json, Router, extract::State, routing::get};
use axum_helpers::{
    UuidPath, ValidatedQuery,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::VideoResult;
use crate::models::{
    HealthStatus, ListVideosParams, RelatedVideo, RelatedVideosParams, VideoDetail, VideoSummary,
};
use crate::repository::CatalogStore;
use crate::service::VideoService;

const TAG: &str = "videos";

/// OpenAPI documentation for the catalog API
#[derive(OpenApi)]
#[openapi(
    paths(health, list_videos, get_video, related_videos),
    components(
        schemas(HealthStatus, VideoSummary, VideoDetail, RelatedVideo),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Video catalog and related-video search")
    )
)]
pub struct ApiDoc;

/// Create the catalog router with all HTTP endpoints
pub fn router<R: CatalogStore + 'static>(service: VideoService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/health", get(health))
        .route("/videos", get(list_videos))
        .route("/videos/id/{videoId}", get(get_video))
        .route("/videos/id/{videoId}/related", get(related_videos))
        .with_state(shared_service)
}

/// Store connectivity probe
#[utoipa::path(
    get,
    path = "/health",
    tag = TAG,
    responses(
        (status = 200, description = "Store reachable", body = HealthStatus),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn health<R: CatalogStore>(
    State(service): State<Arc<VideoService<R>>>,
) -> VideoResult<Json<HealthStatus>> {
    Ok(Json(service.health().await?))
}

/// List videos in the store's natural order
#[utoipa::path(
    get,
    path = "/videos",
    tag = TAG,
    params(ListVideosParams),
    responses(
        (status = 200, description = "Video summaries", body = Vec<VideoSummary>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_videos<R: CatalogStore>(
    State(service): State<Arc<VideoService<R>>>,
    ValidatedQuery(params): ValidatedQuery<ListVideosParams>,
) -> VideoResult<Json<Vec<VideoSummary>>> {
    Ok(Json(service.list_videos(params.limit).await?))
}

/// Get a video by ID
#[utoipa::path(
    get,
    path = "/videos/id/{videoId}",
    tag = TAG,
    params(
        ("videoId" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video found", body = VideoDetail),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_video<R: CatalogStore>(
    State(service): State<Arc<VideoService<R>>>,
    UuidPath(id): UuidPath,
) -> VideoResult<Json<VideoDetail>> {
    Ok(Json(service.get_video(id).await?))
}

/// Videos similar to the given one by ANN search over content features
#[utoipa::path(
    get,
    path = "/videos/id/{videoId}/related",
    tag = TAG,
    params(
        ("videoId" = Uuid, Path, description = "Source video ID"),
        RelatedVideosParams
    ),
    responses(
        (status = 200, description = "Related videos, most similar first", body = Vec<RelatedVideo>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn related_videos<R: CatalogStore>(
    State(service): State<Arc<VideoService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedQuery(params): ValidatedQuery<RelatedVideosParams>,
) -> VideoResult<Json<Vec<RelatedVideo>>> {
    Ok(Json(service.related_videos(id, params.limit).await?))
}
