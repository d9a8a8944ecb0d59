//! Custom extractors for Axum handlers.
//!
//! Both extractors reject with the JSON error envelope before the handler runs.

pub mod uuid_path;
pub mod validated_query;

pub use uuid_path::UuidPath;
pub use validated_query::ValidatedQuery;
