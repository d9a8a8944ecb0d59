use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use database::cassandra::CassandraConfig;
use domain_videos::{CatalogBackend, CatalogConfig, DataApiConfig};

pub use core_config::Environment;

/// Backend-specific connection settings
#[derive(Clone, Debug)]
pub enum StoreConfig {
    DataApi(DataApiConfig),
    Cql(CassandraConfig),
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let catalog = CatalogConfig::from_env()?;

        // Only the selected backend's variables are required
        let store = match catalog.backend {
            CatalogBackend::DataApi => StoreConfig::DataApi(DataApiConfig::from_env()?),
            CatalogBackend::Cql => StoreConfig::Cql(CassandraConfig::from_env()?),
        };

        Ok(Self {
            app: app_info!(),
            catalog,
            store,
            server,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_api_backend_is_default() {
        temp_env::with_vars(
            [
                ("CATALOG_BACKEND", None::<&str>),
                ("ASTRA_DB_API_ENDPOINT", Some("https://db-region.apps.astra.datastax.com")),
                ("ASTRA_DB_APPLICATION_TOKEN", Some("AstraCS:token")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(matches!(config.store, StoreConfig::DataApi(_)));
                assert_eq!(config.catalog.table, "videos");
            },
        );
    }

    #[test]
    fn test_data_api_backend_requires_token() {
        temp_env::with_vars(
            [
                ("CATALOG_BACKEND", Some("data_api")),
                ("ASTRA_DB_API_ENDPOINT", Some("https://db-region.apps.astra.datastax.com")),
                ("ASTRA_DB_APPLICATION_TOKEN", None),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_cql_backend_does_not_need_data_api_endpoint() {
        temp_env::with_vars(
            [
                ("CATALOG_BACKEND", Some("cql")),
                ("ASTRA_DB_API_ENDPOINT", None::<&str>),
                ("CASSANDRA_CONTACT_POINTS", Some("10.0.0.1:9042")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(matches!(config.store, StoreConfig::Cql(_)));
            },
        );
    }
}
