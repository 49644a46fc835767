//! `Session` — statement execution against one scoped connection.

use quarry_core::errors::AccessError;
use quarry_core::types::{Params, Row};
use rusqlite::{Connection, ToSql};

use crate::stream::RowStream;

/// Execution surface of one scoped connection. Sessions are handed to scope
/// bodies by [`Database::with_session`](crate::Database::with_session) and
/// [`Database::with_transaction`](crate::Database::with_transaction); they
/// never outlive their scope.
pub struct Session<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Session<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Session { conn }
    }

    /// Execute a DML statement, returning the number of affected rows.
    pub fn run(&self, statement: &str, params: &Params) -> Result<usize, AccessError> {
        let statement = ensure_statement(statement)?;
        tracing::debug!(statement, "executing statement");
        let mut stmt = self
            .conn
            .prepare(statement)
            .map_err(|e| AccessError::Execution { message: e.to_string() })?;
        let affected = match params {
            Params::None => stmt.execute([]),
            Params::Positional(values) => {
                let refs: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
                stmt.execute(refs.as_slice())
            }
            Params::Named(pairs) => {
                let refs: Vec<(&str, &dyn ToSql)> = pairs
                    .iter()
                    .map(|(k, v)| (k.as_str(), v as &dyn ToSql))
                    .collect();
                stmt.execute(refs.as_slice())
            }
        }
        .map_err(|e| AccessError::Execution { message: e.to_string() })?;
        Ok(affected)
    }

    /// Execute several semicolon-separated statements (schema setup etc.).
    pub fn run_batch(&self, statements: &str) -> Result<(), AccessError> {
        let statements = ensure_statement(statements)?;
        tracing::debug!(statement = statements, "executing batch");
        self.conn
            .execute_batch(statements)
            .map_err(|e| AccessError::Execution { message: e.to_string() })
    }

    /// Hand a lazy row stream to `consume`. The cursor is opened once, takes
    /// one fetch per advance, and is finalized on every exit path — natural
    /// exhaustion, early return, or error — exactly once.
    pub fn stream_rows<T, F>(
        &self,
        statement: &str,
        params: &Params,
        consume: F,
    ) -> Result<T, AccessError>
    where
        F: FnOnce(&mut RowStream<'_>) -> Result<T, AccessError>,
    {
        let statement = ensure_statement(statement)?;
        tracing::debug!(statement, "executing query");
        let mut stmt = self
            .conn
            .prepare(statement)
            .map_err(|e| AccessError::Execution { message: e.to_string() })?;
        let columns = stmt.column_count();
        let mut stream = RowStream::query(&mut stmt, params, columns)?;
        consume(&mut stream)
    }

    /// Fetch every row of a query eagerly.
    pub fn fetch_all(&self, statement: &str, params: &Params) -> Result<Vec<Row>, AccessError> {
        self.stream_rows(statement, params, |stream| {
            let mut rows = Vec::new();
            while let Some(row) = stream.advance()? {
                rows.push(row);
            }
            Ok(rows)
        })
    }

    /// Fetch the first row of a query, if any.
    pub fn fetch_optional(
        &self,
        statement: &str,
        params: &Params,
    ) -> Result<Option<Row>, AccessError> {
        self.stream_rows(statement, params, |stream| stream.advance())
    }
}

/// Rejects empty statements before they reach the data source.
pub(crate) fn ensure_statement(statement: &str) -> Result<&str, AccessError> {
    let trimmed = statement.trim();
    if trimmed.is_empty() {
        return Err(AccessError::InvalidArgument {
            message: "empty statement".to_string(),
        });
    }
    Ok(trimmed)
}
