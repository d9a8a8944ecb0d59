//! Astra secure connect bundle retrieval.
//!
//! The database id is read from the Data API endpoint
//! (`https://<db-id>-<region>.apps.astra.datastax.com`), the bundle URL is
//! looked up through the Astra DevOps API and the archive is written to a
//! cache directory. Connection settings come from the bundle's `config.json`.

use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use super::connector::CassandraError;

/// Public Astra DevOps API
pub const DEFAULT_DEVOPS_URL: &str = "https://api.astra.datastax.com";

static DATABASE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://([0-9a-f-]{36})").expect("static regex"));

/// Where to fetch a secure connect bundle from and where to keep it
#[derive(Clone)]
pub struct AstraBundleConfig {
    /// Data API endpoint the database id is taken from
    pub api_endpoint: String,

    /// Application token, sent as a bearer token to the DevOps API
    pub token: String,

    /// DevOps API base URL
    pub devops_url: String,

    /// Directory the downloaded archive is written to
    pub cache_dir: PathBuf,
}

impl std::fmt::Debug for AstraBundleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AstraBundleConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("token", &"<redacted>")
            .field("devops_url", &self.devops_url)
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

impl AstraBundleConfig {
    pub fn new(api_endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            token: token.into(),
            devops_url: DEFAULT_DEVOPS_URL.to_string(),
            cache_dir: std::env::temp_dir(),
        }
    }

    pub fn with_devops_url(mut self, url: impl Into<String>) -> Self {
        self.devops_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// The 36-character database id at the start of the endpoint host.
    pub fn database_id(&self) -> Result<String, CassandraError> {
        DATABASE_ID
            .captures(&self.api_endpoint)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                CassandraError::Bundle(format!(
                    "cannot read a database id from endpoint {}",
                    self.api_endpoint
                ))
            })
    }

    pub fn bundle_path(&self, database_id: &str) -> PathBuf {
        self.cache_dir
            .join(format!("secure-connect-{}.zip", database_id))
    }
}

#[derive(Deserialize)]
struct DatabaseInfo {
    info: DatabaseDetails,
}

#[derive(Deserialize)]
struct DatabaseDetails {
    #[serde(default)]
    datacenters: Vec<Datacenter>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Datacenter {
    secure_bundle_url: String,
}

/// Connection settings from the bundle's `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleConnectInfo {
    /// CQL proxy host
    pub host: String,

    pub cql_port: u16,

    #[serde(default)]
    pub keyspace: Option<String>,

    #[serde(rename = "localDC", default)]
    pub local_dc: Option<String>,
}

impl BundleConnectInfo {
    pub fn contact_point(&self) -> String {
        format!("{}:{}", self.host, self.cql_port)
    }
}

/// Look up the bundle URL of the database's first datacenter and download
/// the archive into `cache_dir`, returning its path.
pub async fn download_secure_bundle(config: &AstraBundleConfig) -> Result<PathBuf, CassandraError> {
    let database_id = config.database_id()?;
    let client = reqwest::Client::new();

    let url = format!("{}/v2/databases/{}", config.devops_url, database_id);
    info!(%database_id, "Looking up secure connect bundle");

    let response = client
        .get(&url)
        .bearer_auth(&config.token)
        .send()
        .await
        .map_err(bundle_error)?;

    if !response.status().is_success() {
        return Err(CassandraError::Bundle(format!(
            "DevOps API returned HTTP {} for database {}",
            response.status(),
            database_id
        )));
    }

    let details: DatabaseInfo = response.json().await.map_err(bundle_error)?;
    let bundle_url = details
        .info
        .datacenters
        .into_iter()
        .next()
        .map(|dc| dc.secure_bundle_url)
        .ok_or_else(|| {
            CassandraError::Bundle(format!("database {} lists no datacenters", database_id))
        })?;

    debug!("Downloading secure connect bundle");
    let response = client.get(&bundle_url).send().await.map_err(bundle_error)?;
    if !response.status().is_success() {
        return Err(CassandraError::Bundle(format!(
            "bundle download returned HTTP {}",
            response.status()
        )));
    }
    let bytes = response.bytes().await.map_err(bundle_error)?;

    let path = config.bundle_path(&database_id);
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        CassandraError::Bundle(format!("failed to write {}: {}", path.display(), e))
    })?;

    info!(path = %path.display(), bytes = bytes.len(), "Secure connect bundle stored");
    Ok(path)
}

/// Read `config.json` out of a downloaded bundle with the system `unzip`.
pub async fn read_connect_info(bundle: &Path) -> Result<BundleConnectInfo, CassandraError> {
    let output = tokio::process::Command::new("unzip")
        .arg("-p")
        .arg(bundle)
        .arg("config.json")
        .output()
        .await
        .map_err(|e| CassandraError::Bundle(format!("failed to run unzip: {}", e)))?;

    if !output.status.success() {
        return Err(CassandraError::Bundle(format!(
            "failed to read config.json from {}: {}",
            bundle.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_connect_info(&output.stdout)
}

pub fn parse_connect_info(raw: &[u8]) -> Result<BundleConnectInfo, CassandraError> {
    serde_json::from_slice(raw)
        .map_err(|e| CassandraError::Bundle(format!("invalid bundle config.json: {}", e)))
}

fn bundle_error(err: reqwest::Error) -> CassandraError {
    CassandraError::Bundle(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const DB_ID: &str = "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0";

    fn endpoint() -> String {
        format!("https://{}-us-east1.apps.astra.datastax.com", DB_ID)
    }

    #[test]
    fn test_database_id_from_endpoint() {
        let config = AstraBundleConfig::new(endpoint(), "AstraCS:t");
        assert_eq!(config.database_id().unwrap(), DB_ID);

        let config = AstraBundleConfig::new("http://localhost:8181", "AstraCS:t");
        assert!(matches!(config.database_id(), Err(CassandraError::Bundle(_))));
    }

    #[test]
    fn test_token_is_redacted() {
        let config = AstraBundleConfig::new(endpoint(), "AstraCS:secret");
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_parse_connect_info() {
        let info = parse_connect_info(
            br#"{"host":"abc.db.astra.datastax.com","port":29080,"cql_port":29042,
                "keyspace":"killrvideo","localDC":"us-east1","caCertLocation":"./ca.crt"}"#,
        )
        .unwrap();

        assert_eq!(info.contact_point(), "abc.db.astra.datastax.com:29042");
        assert_eq!(info.keyspace.as_deref(), Some("killrvideo"));
        assert_eq!(info.local_dc.as_deref(), Some("us-east1"));
        assert!(parse_connect_info(b"{}").is_err());
    }

    #[tokio::test]
    async fn test_download_secure_bundle() {
        let mut server = Server::new_async().await;
        let bundle_url = format!("{}/bundles/{}.zip", server.url(), DB_ID);

        let lookup = server
            .mock("GET", format!("/v2/databases/{}", DB_ID).as_str())
            .match_header("authorization", "Bearer AstraCS:t")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "id": DB_ID,
                    "info": {"datacenters": [{"secureBundleUrl": bundle_url}]}
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let download = server
            .mock("GET", Matcher::Regex(r"^/bundles/.*\.zip$".to_string()))
            .with_status(200)
            .with_body("PK-bundle-bytes")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = AstraBundleConfig::new(endpoint(), "AstraCS:t")
            .with_devops_url(server.url())
            .with_cache_dir(dir.path());

        let path = download_secure_bundle(&config).await.unwrap();

        assert_eq!(path, dir.path().join(format!("secure-connect-{}.zip", DB_ID)));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK-bundle-bytes");
        lookup.assert_async().await;
        download.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_rejected_token() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("/v2/databases/{}", DB_ID).as_str())
            .with_status(401)
            .with_body(r#"{"errors":[{"message":"unauthorized"}]}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = AstraBundleConfig::new(endpoint(), "bad")
            .with_devops_url(server.url())
            .with_cache_dir(dir.path());

        let err = download_secure_bundle(&config).await.unwrap_err();
        assert!(matches!(err, CassandraError::Bundle(msg) if msg.contains("401")));
        assert!(!config.bundle_path(DB_ID).exists());
    }

    #[tokio::test]
    async fn test_download_without_datacenters() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("/v2/databases/{}", DB_ID).as_str())
            .with_status(200)
            .with_body(r#"{"info":{"datacenters":[]}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = AstraBundleConfig::new(endpoint(), "AstraCS:t")
            .with_devops_url(server.url())
            .with_cache_dir(dir.path());

        let err = download_secure_bundle(&config).await.unwrap_err();
        assert!(matches!(err, CassandraError::Bundle(msg) if msg.contains("no datacenters")));
    }
}
