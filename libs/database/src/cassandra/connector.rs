use futures::FutureExt;
use scylla::client::PoolSize;
use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::errors::{ExecutionError, NewSessionError};
use scylla::policies::load_balancing::DefaultPolicy;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::CassandraConfig;
use super::bundle::{download_secure_bundle, read_connect_info};
use crate::common::LazyConnection;

/// Error type for Cassandra operations
#[derive(Debug, thiserror::Error)]
pub enum CassandraError {
    #[error("Cassandra error: {0}")]
    Scylla(#[from] NewSessionError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Secure connect bundle error: {0}")]
    Bundle(String),
}

/// Shared Cassandra session; cloning shares the underlying connection pool
pub type CassandraSession = Arc<Session>;

/// A Cassandra session established on first use
pub type LazyCassandraSession = LazyConnection<CassandraSession, CassandraError>;

/// Connect using a CassandraConfig
///
/// With `secure_bundle` set, the bundle is downloaded first and its proxy
/// address, keyspace and datacenter fill in what the config leaves unset.
/// Then applies credentials, keyspace, DC-aware load balancing, the per-request
/// timeout and pool size, then verifies the session with a `system.local` read.
///
/// # Example
/// ```ignore
/// use database::cassandra::{CassandraConfig, connect_from_config};
///
/// let config = CassandraConfig::with_keyspace(vec!["127.0.0.1:9042"], "killrvideo");
/// let session = connect_from_config(&config).await?;
/// ```
pub async fn connect_from_config(
    config: &CassandraConfig,
) -> Result<CassandraSession, CassandraError> {
    let resolved;
    let config = match &config.secure_bundle {
        Some(bundle) => {
            let path = download_secure_bundle(bundle).await?;
            let connect_info = read_connect_info(&path).await?;
            resolved = config.clone().apply_bundle(&connect_info);
            &resolved
        }
        None => config,
    };

    // TODO: terminate TLS with the bundle's client certificate (scylla `rustls-023`
    // feature) so Astra's SNI proxy accepts the connection.
    info!(
        "Attempting to connect to Cassandra at {:?}",
        config.contact_points
    );

    let connections_per_host = NonZeroUsize::new(config.connections_per_host).ok_or_else(|| {
        CassandraError::ConnectionFailed("connections_per_host must be at least 1".to_string())
    })?;

    let mut policy = DefaultPolicy::builder().token_aware(true);
    if let Some(ref datacenter) = config.local_datacenter {
        policy = policy.prefer_datacenter(datacenter.clone());
    }

    let profile = ExecutionProfile::builder()
        .load_balancing_policy(policy.build())
        .request_timeout(Some(Duration::from_secs(config.request_timeout_secs)))
        .build();

    let mut builder = SessionBuilder::new()
        .known_nodes(&config.contact_points)
        .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_size(PoolSize::PerHost(connections_per_host))
        .default_execution_profile_handle(profile.into_handle());

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        builder = builder.user(username, password);
    }

    if let Some(ref keyspace) = config.keyspace {
        builder = builder.use_keyspace(keyspace, true);
    }

    let session: Session = builder.build().await?;

    session
        .query_unpaged("SELECT release_version FROM system.local", &[])
        .await
        .map_err(|e| CassandraError::ConnectionFailed(e.to_string()))?;

    info!("Successfully connected to Cassandra");
    Ok(Arc::new(session))
}

/// Build a session handle that connects on first use.
///
/// No network traffic happens here; the first `get()` runs
/// [`connect_from_config`] and every later caller reuses that session.
pub fn lazy_session(config: CassandraConfig) -> LazyCassandraSession {
    let config = Arc::new(config);
    LazyConnection::new("cassandra", move || {
        let config = Arc::clone(&config);
        async move { connect_from_config(&config).await }.boxed()
    })
}
