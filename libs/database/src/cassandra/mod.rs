//! Cassandra/Astra connector and utilities
//!
//! Uses the `scylla` driver, which speaks the CQL native protocol to Apache
//! Cassandra, DataStax Astra and ScyllaDB alike.
//!
//! # Example
//!
//! ```ignore
//! use database::cassandra::{connect_from_config, CassandraConfig};
//!
//! let config = CassandraConfig::with_keyspace(vec!["127.0.0.1:9042"], "killrvideo")
//!     .with_datacenter("dc1")
//!     .with_token("AstraCS:...");
//! let session = connect_from_config(&config).await?;
//!
//! let tables = database::cassandra::list_tables(&session, "killrvideo").await?;
//! ```
//!
//! Astra databases can instead be reached through their secure connect
//! bundle, fetched from the DevOps API when the session is first opened:
//!
//! ```ignore
//! use database::cassandra::{AstraBundleConfig, CassandraConfig, lazy_session};
//!
//! let bundle = AstraBundleConfig::new(api_endpoint, token.clone());
//! let lazy = lazy_session(CassandraConfig::default().with_secure_bundle(bundle).with_token(token));
//! ```

mod bundle;
mod config;
mod connector;
mod health;

pub use bundle::{
    AstraBundleConfig, BundleConnectInfo, DEFAULT_DEVOPS_URL, download_secure_bundle,
    parse_connect_info, read_connect_info,
};
pub use config::CassandraConfig;
pub use connector::{
    CassandraError, CassandraSession, LazyCassandraSession, connect_from_config, lazy_session,
};
pub use health::list_tables;

pub use scylla::client::session::Session;
