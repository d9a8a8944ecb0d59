use futures::future::BoxFuture;
use std::fmt;
use tokio::sync::OnceCell;
use tracing::{debug, info};

type Connector<T, E> = Box<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// A connection handle that is established on first use and then shared.
///
/// Concurrent first callers are serialized on the same initialization: exactly
/// one connect attempt runs and every waiter receives the resulting handle.
/// A failed attempt is not cached, so the next caller starts a fresh one.
///
/// # Example
/// ```ignore
/// use database::LazyConnection;
///
/// let lazy = LazyConnection::new("cassandra", move || {
///     let config = config.clone();
///     Box::pin(async move { connect_from_config(&config).await })
/// });
///
/// let session = lazy.get().await?;
/// ```
pub struct LazyConnection<T, E> {
    name: &'static str,
    cell: OnceCell<T>,
    connector: Connector<T, E>,
}

impl<T, E> LazyConnection<T, E>
where
    T: Send + Sync,
    E: fmt::Display,
{
    /// Create an uninitialized handle. `connector` runs at most once per
    /// successful initialization.
    pub fn new<F>(name: &'static str, connector: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync + 'static,
    {
        Self {
            name,
            cell: OnceCell::new(),
            connector: Box::new(connector),
        }
    }

    /// Return the shared handle, connecting first if no caller has yet.
    pub async fn get(&self) -> Result<&T, E> {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        self.cell
            .get_or_try_init(|| async {
                info!(connection = self.name, "Establishing connection on first use");
                let result = (self.connector)().await;
                match &result {
                    Ok(_) => info!(connection = self.name, "Connection established"),
                    Err(e) => debug!(connection = self.name, error = %e, "Connection attempt failed"),
                }
                result
            })
            .await
    }

    /// Whether a handle has been established.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

impl<T, E> fmt::Debug for LazyConnection<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyConnection")
            .field("name", &self.name)
            .field("initialized", &self.cell.initialized())
            .finish()
    }
}
