//! Video catalog domain
//!
//! Read-only catalog endpoints and the related-videos resolver.
//!
//! ```text
//! ┌──────────────────┐
//! │   VideoService   │  ← over-fetch, drop self-match, truncate, map
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │   CatalogStore   │  get_by_id / ann_search / list / list_tables
//! │     (trait)      │
//! └───┬──────────┬───┘
//!     │          │
//! ┌───▼──────────┐ ┌─▼───────────┐
//! │DataApiCatalog│ │ CqlCatalog  │
//! │ typed vector │ │ CQL literal │
//! └──────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_videos::{CatalogConfig, DataApiCatalog, DataApiConfig, VideoService, handlers};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = CatalogConfig::from_env()?;
//! let store = DataApiCatalog::new(DataApiConfig::from_env()?, &catalog)?;
//! let router = handlers::router(VideoService::new(store));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cql;
pub mod data_api;
pub mod error;
pub mod handlers;
pub mod literal;
pub mod models;
pub mod repository;
pub mod service;

pub use config::{CatalogBackend, CatalogConfig, DataApiConfig, SimilarityFunction};
pub use cql::CqlCatalog;
pub use data_api::DataApiCatalog;
pub use error::{VideoError, VideoResult};
pub use handlers::ApiDoc;
pub use literal::{format_vector_literal, parse_vector_literal};
pub use models::{
    HealthStatus, ListVideosParams, RelatedVideo, RelatedVideosParams, SimilarityMatch, Video,
    VideoDetail, VideoSummary,
};
pub use repository::CatalogStore;
pub use service::{SELF_MATCH_OVERFETCH, VideoService};
