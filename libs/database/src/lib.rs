//! Database connectors and connection lifecycle helpers.
//!
//! # Features
//!
//! - `cassandra` (default) - Cassandra/Astra support through the `scylla` driver
//! - `config` - Configuration support with `core_config::FromEnv`
//! - `all` - All features
//!
//! # Examples
//!
//! ## Cassandra, connected on first use
//!
//! ```ignore
//! use database::cassandra::{self, CassandraConfig};
//!
//! let config = CassandraConfig::with_keyspace(vec!["127.0.0.1:9042"], "killrvideo");
//! let lazy = cassandra::lazy_session(config);
//!
//! // The first caller connects; concurrent callers wait for the same session.
//! let session = lazy.get().await?;
//! session.query_unpaged("SELECT release_version FROM system.local", &[]).await?;
//! ```

// Always available modules
pub mod common;

#[cfg(feature = "cassandra")]
pub mod cassandra;

pub use common::LazyConnection;
