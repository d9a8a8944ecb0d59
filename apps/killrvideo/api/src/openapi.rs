use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "KillrVideo API",
        version = "0.1.0",
        description = "Video catalog with ANN-based related-video search"
    )
)]
struct BaseDoc;

/// Full document: service metadata plus the catalog routes, which live at the root.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        let mut doc = BaseDoc::openapi();
        doc.merge(domain_videos::ApiDoc::openapi());
        doc
    }
}
