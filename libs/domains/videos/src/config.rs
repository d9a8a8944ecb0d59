use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or, env_required};
use regex::Regex;
use std::sync::LazyLock;
use strum::{Display, EnumString};

/// Table and column names are interpolated into query text, so only plain
/// CQL identifiers are accepted.
static CQL_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,47}$").expect("static regex"));

pub const DEFAULT_KEYSPACE: &str = "killrvideo";
pub const DEFAULT_TABLE: &str = "videos";
pub const DEFAULT_VECTOR_COLUMN: &str = "content_features";

/// Which adapter answers catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CatalogBackend {
    /// Astra Data API over HTTPS; vectors travel as typed JSON arrays
    #[default]
    DataApi,
    /// Native CQL driver; vectors are inlined as literals in `ANN OF`
    Cql,
}

/// Similarity function the vector index was built with.
///
/// ANN results are ordered by the index's function, so the score selected
/// alongside them must use the same one to decrease in result order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SimilarityFunction {
    #[default]
    Cosine,
    DotProduct,
    Euclidean,
}

impl SimilarityFunction {
    /// CQL scoring function for this metric
    pub fn cql_function(&self) -> &'static str {
        match self {
            Self::Cosine => "similarity_cosine",
            Self::DotProduct => "similarity_dot_product",
            Self::Euclidean => "similarity_euclidean",
        }
    }
}

/// Where the videos live, shared by both backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub backend: CatalogBackend,
    pub keyspace: String,
    pub table: String,
    pub vector_column: String,
    pub similarity: SimilarityFunction,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackend::default(),
            keyspace: DEFAULT_KEYSPACE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            vector_column: DEFAULT_VECTOR_COLUMN.to_string(),
            similarity: SimilarityFunction::default(),
        }
    }
}

impl CatalogConfig {
    /// `keyspace.table`, safe to splice into CQL after [`validate`](Self::validate).
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier("ASTRA_DB_KEYSPACE", &self.keyspace)?;
        validate_identifier("CATALOG_TABLE", &self.table)?;
        validate_identifier("CATALOG_VECTOR_COLUMN", &self.vector_column)
    }
}

impl FromEnv for CatalogConfig {
    /// - CATALOG_BACKEND: `data_api` (default) or `cql`
    /// - ASTRA_DB_KEYSPACE: defaults to `killrvideo`
    /// - CATALOG_TABLE: defaults to `videos`
    /// - CATALOG_VECTOR_COLUMN: defaults to `content_features`
    /// - CATALOG_SIMILARITY_FUNCTION: `cosine` (default), `dot_product` or `euclidean`
    fn from_env() -> Result<Self, ConfigError> {
        let raw_backend = env_or_default("CATALOG_BACKEND", "data_api");
        let backend = raw_backend
            .parse::<CatalogBackend>()
            .map_err(|e| ConfigError::ParseError {
                key: "CATALOG_BACKEND".to_string(),
                details: format!("{:?}: {}", raw_backend, e),
            })?;

        let raw_similarity = env_or_default("CATALOG_SIMILARITY_FUNCTION", "cosine");
        let similarity = raw_similarity
            .parse::<SimilarityFunction>()
            .map_err(|e| ConfigError::ParseError {
                key: "CATALOG_SIMILARITY_FUNCTION".to_string(),
                details: format!("{:?}: {}", raw_similarity, e),
            })?;

        let config = Self {
            backend,
            keyspace: env_or_default("ASTRA_DB_KEYSPACE", DEFAULT_KEYSPACE),
            table: env_or_default("CATALOG_TABLE", DEFAULT_TABLE),
            vector_column: env_or_default("CATALOG_VECTOR_COLUMN", DEFAULT_VECTOR_COLUMN),
            similarity,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Connection settings for the Astra Data API backend.
#[derive(Clone)]
pub struct DataApiConfig {
    /// `https://<db-id>-<region>.apps.astra.datastax.com`
    pub endpoint: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for DataApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataApiConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl DataApiConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout_secs: 30,
        }
    }
}

impl FromEnv for DataApiConfig {
    /// - ASTRA_DB_API_ENDPOINT: required
    /// - ASTRA_DB_APPLICATION_TOKEN: required
    /// - ASTRA_DB_TIMEOUT_SECS: defaults to 30
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(
            env_required("ASTRA_DB_API_ENDPOINT")?,
            env_required("ASTRA_DB_APPLICATION_TOKEN")?,
        );
        config.timeout_secs = env_parse_or("ASTRA_DB_TIMEOUT_SECS", 30u64)?;
        Ok(config)
    }
}

fn validate_identifier(key: &str, value: &str) -> Result<(), ConfigError> {
    if CQL_IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("{:?} is not a valid CQL identifier", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_defaults() {
        temp_env::with_vars(
            [
                ("CATALOG_BACKEND", None::<&str>),
                ("ASTRA_DB_KEYSPACE", None),
                ("CATALOG_TABLE", None),
                ("CATALOG_VECTOR_COLUMN", None),
                ("CATALOG_SIMILARITY_FUNCTION", None),
            ],
            || {
                let config = CatalogConfig::from_env().unwrap();
                assert_eq!(config, CatalogConfig::default());
                assert_eq!(config.similarity, SimilarityFunction::Cosine);
                assert_eq!(config.qualified_table(), "killrvideo.videos");
            },
        );
    }

    #[test]
    fn test_backend_parsing() {
        temp_env::with_var("CATALOG_BACKEND", Some("cql"), || {
            assert_eq!(CatalogConfig::from_env().unwrap().backend, CatalogBackend::Cql);
        });
        temp_env::with_var("CATALOG_BACKEND", Some("DATA_API"), || {
            assert_eq!(
                CatalogConfig::from_env().unwrap().backend,
                CatalogBackend::DataApi
            );
        });
        temp_env::with_var("CATALOG_BACKEND", Some("mongo"), || {
            assert!(matches!(
                CatalogConfig::from_env(),
                Err(ConfigError::ParseError { .. })
            ));
        });
    }

    #[test]
    fn test_similarity_function_parsing() {
        temp_env::with_var("CATALOG_SIMILARITY_FUNCTION", Some("dot_product"), || {
            let config = CatalogConfig::from_env().unwrap();
            assert_eq!(config.similarity, SimilarityFunction::DotProduct);
            assert_eq!(config.similarity.cql_function(), "similarity_dot_product");
        });
        temp_env::with_var("CATALOG_SIMILARITY_FUNCTION", Some("manhattan"), || {
            assert!(matches!(
                CatalogConfig::from_env(),
                Err(ConfigError::ParseError { .. })
            ));
        });
    }

    #[test]
    fn test_unsafe_identifiers_are_rejected() {
        for bad in ["videos; DROP TABLE users", "1videos", "", "vid-eos", "a.b"] {
            temp_env::with_var("CATALOG_TABLE", Some(bad), || {
                assert!(CatalogConfig::from_env().is_err(), "accepted {:?}", bad);
            });
        }
        temp_env::with_var("CATALOG_VECTOR_COLUMN", Some("embedding_v2"), || {
            assert!(CatalogConfig::from_env().is_ok());
        });
    }

    #[test]
    fn test_data_api_requires_endpoint_and_token() {
        temp_env::with_vars(
            [
                ("ASTRA_DB_API_ENDPOINT", None::<&str>),
                ("ASTRA_DB_APPLICATION_TOKEN", Some("AstraCS:abc")),
            ],
            || {
                assert!(matches!(
                    DataApiConfig::from_env(),
                    Err(ConfigError::MissingEnvVar(_))
                ));
            },
        );

        temp_env::with_vars(
            [
                ("ASTRA_DB_API_ENDPOINT", Some("https://db-us-east1.apps.astra.datastax.com/")),
                ("ASTRA_DB_APPLICATION_TOKEN", Some("AstraCS:abc")),
                ("ASTRA_DB_TIMEOUT_SECS", Some("5")),
            ],
            || {
                let config = DataApiConfig::from_env().unwrap();
                assert_eq!(config.endpoint, "https://db-us-east1.apps.astra.datastax.com");
                assert_eq!(config.timeout_secs, 5);
                assert!(!format!("{:?}", config).contains("AstraCS"));
            },
        );
    }
}
