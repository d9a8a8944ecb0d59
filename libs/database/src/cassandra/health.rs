use scylla::client::session::Session;

use super::connector::CassandraError;

/// List the tables of `keyspace` from the schema tables, sorted by name.
///
/// # Example
/// ```ignore
/// let tables = database::cassandra::list_tables(&session, "killrvideo").await?;
/// assert!(tables.contains(&"videos".to_string()));
/// ```
pub async fn list_tables(session: &Session, keyspace: &str) -> Result<Vec<String>, CassandraError> {
    let result = session
        .query_unpaged(
            "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ?",
            (keyspace,),
        )
        .await?;

    let rows_result = result
        .into_rows_result()
        .map_err(|e| CassandraError::Query(e.to_string()))?;

    let mut tables = rows_result
        .rows::<(String,)>()
        .map_err(|e| CassandraError::Query(e.to_string()))?
        .map(|row| row.map(|(name,)| name))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CassandraError::Query(e.to_string()))?;

    tables.sort();
    Ok(tables)
}
