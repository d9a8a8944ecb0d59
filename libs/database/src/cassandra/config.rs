#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};

use super::bundle::{AstraBundleConfig, BundleConnectInfo};
#[cfg(feature = "config")]
use super::bundle::DEFAULT_DEVOPS_URL;

/// Username Astra expects when authenticating with an application token.
pub const ASTRA_TOKEN_USERNAME: &str = "token";

/// Cassandra connection configuration
///
/// Built manually or loaded from environment variables (with `config` feature).
///
/// # Example
///
/// ```ignore
/// use database::cassandra::CassandraConfig;
///
/// let config = CassandraConfig::with_keyspace(vec!["127.0.0.1:9042"], "killrvideo")
///     .with_credentials("cassandra", "cassandra");
/// ```
#[derive(Clone)]
pub struct CassandraConfig {
    /// Contact points (host:port pairs)
    pub contact_points: Vec<String>,

    /// Keyspace selected on every connection of the session
    pub keyspace: Option<String>,

    /// Optional datacenter for DC-aware load balancing
    pub local_datacenter: Option<String>,

    /// Optional username for authentication
    pub username: Option<String>,

    /// Optional password for authentication
    pub password: Option<String>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Per-request timeout in seconds, enforced by the driver
    pub request_timeout_secs: u64,

    /// Number of connections per host
    pub connections_per_host: usize,

    /// Astra bundle to derive the contact point from when connecting
    pub secure_bundle: Option<AstraBundleConfig>,
}

impl std::fmt::Debug for CassandraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CassandraConfig")
            .field("contact_points", &self.contact_points)
            .field("keyspace", &self.keyspace)
            .field("local_datacenter", &self.local_datacenter)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connections_per_host", &self.connections_per_host)
            .field("secure_bundle", &self.secure_bundle)
            .finish()
    }
}

impl CassandraConfig {
    /// Create a new CassandraConfig with contact points
    pub fn new<S: Into<String>>(contact_points: Vec<S>) -> Self {
        Self {
            contact_points: contact_points.into_iter().map(|s| s.into()).collect(),
            ..Self::default()
        }
    }

    /// Create a CassandraConfig with a specific keyspace
    pub fn with_keyspace<S: Into<String>>(
        contact_points: Vec<S>,
        keyspace: impl Into<String>,
    ) -> Self {
        Self {
            keyspace: Some(keyspace.into()),
            ..Self::new(contact_points)
        }
    }

    /// Set the local datacenter for DC-aware load balancing
    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.local_datacenter = Some(datacenter.into());
        self
    }

    /// Set authentication credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Authenticate with an Astra application token.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.with_credentials(ASTRA_TOKEN_USERNAME, token)
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Resolve the contact point from an Astra secure connect bundle on connect
    pub fn with_secure_bundle(mut self, bundle: AstraBundleConfig) -> Self {
        self.secure_bundle = Some(bundle);
        self
    }

    /// Point at the bundle's CQL proxy. Keyspace and datacenter are only
    /// taken from the bundle when not already set.
    pub fn apply_bundle(mut self, info: &BundleConnectInfo) -> Self {
        self.contact_points = vec![info.contact_point()];
        if self.keyspace.is_none() {
            self.keyspace = info.keyspace.clone();
        }
        if self.local_datacenter.is_none() {
            self.local_datacenter = info.local_dc.clone();
        }
        self
    }

    /// Get the keyspace
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }
}

impl Default for CassandraConfig {
    fn default() -> Self {
        Self {
            contact_points: vec!["127.0.0.1:9042".to_string()],
            keyspace: None,
            local_datacenter: None,
            username: None,
            password: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            connections_per_host: 1,
            secure_bundle: None,
        }
    }
}

/// Load CassandraConfig from environment variables
///
/// - `CASSANDRA_CONTACT_POINTS` - comma-separated host:port list. When unset,
///   `ASTRA_DB_API_ENDPOINT` and `ASTRA_DB_APPLICATION_TOKEN` are required and
///   the contact point comes from the database's secure connect bundle
/// - `ASTRA_DEVOPS_API_URL` (default: `https://api.astra.datastax.com`)
/// - `CASSANDRA_KEYSPACE` (optional) - falls back to `ASTRA_DB_KEYSPACE`
/// - `CASSANDRA_DATACENTER` (optional)
/// - `CASSANDRA_USERNAME` / `CASSANDRA_PASSWORD` (optional)
/// - `ASTRA_DB_APPLICATION_TOKEN` (optional) - token auth when no password is set
/// - `CASSANDRA_CONNECT_TIMEOUT_SECS` (default: 10)
/// - `CASSANDRA_REQUEST_TIMEOUT_SECS` (default: 30)
/// - `CASSANDRA_CONNECTIONS_PER_HOST` (default: 1)
#[cfg(feature = "config")]
impl FromEnv for CassandraConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let (contact_points, secure_bundle) = match std::env::var("CASSANDRA_CONTACT_POINTS") {
            Ok(raw) => {
                let contact_points: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();

                if contact_points.is_empty() {
                    return Err(ConfigError::ParseError {
                        key: "CASSANDRA_CONTACT_POINTS".to_string(),
                        details: "No valid contact points provided".to_string(),
                    });
                }
                (contact_points, None)
            }
            Err(_) => {
                let (Ok(endpoint), Ok(token)) = (
                    std::env::var("ASTRA_DB_API_ENDPOINT"),
                    std::env::var("ASTRA_DB_APPLICATION_TOKEN"),
                ) else {
                    return Err(ConfigError::MissingEnvVar(
                        "CASSANDRA_CONTACT_POINTS (or ASTRA_DB_API_ENDPOINT with ASTRA_DB_APPLICATION_TOKEN)"
                            .to_string(),
                    ));
                };
                let bundle = AstraBundleConfig::new(endpoint, token)
                    .with_devops_url(env_or_default("ASTRA_DEVOPS_API_URL", DEFAULT_DEVOPS_URL));
                (Vec::new(), Some(bundle))
            }
        };

        let keyspace = std::env::var("CASSANDRA_KEYSPACE")
            .or_else(|_| std::env::var("ASTRA_DB_KEYSPACE"))
            .ok();

        let (username, password) = match (
            std::env::var("CASSANDRA_USERNAME").ok(),
            std::env::var("CASSANDRA_PASSWORD").ok(),
        ) {
            (user, Some(password)) => (user, Some(password)),
            (user, None) => match std::env::var("ASTRA_DB_APPLICATION_TOKEN") {
                Ok(token) => (Some(ASTRA_TOKEN_USERNAME.to_string()), Some(token)),
                Err(_) => (user, None),
            },
        };

        Ok(Self {
            contact_points,
            keyspace,
            local_datacenter: std::env::var("CASSANDRA_DATACENTER").ok(),
            username,
            password,
            connect_timeout_secs: env_parse_or("CASSANDRA_CONNECT_TIMEOUT_SECS", 10)?,
            request_timeout_secs: env_parse_or("CASSANDRA_REQUEST_TIMEOUT_SECS", 30)?,
            connections_per_host: env_parse_or("CASSANDRA_CONNECTIONS_PER_HOST", 1)?,
            secure_bundle,
        })
    }
}
