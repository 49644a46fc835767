//! Lazy row stream over a non-buffering cursor.
//!
//! One fetch per advance, O(1) memory in the result-set size, single
//! consumer, not restartable. An advance failure marks the stream exhausted
//! before the error surfaces.

use quarry_core::errors::AccessError;
use quarry_core::types::{Params, Row};
use rusqlite::{Rows, Statement, ToSql};

/// A single-pass stream of rows from one executed statement.
pub struct RowStream<'stmt> {
    rows: Rows<'stmt>,
    columns: usize,
    exhausted: bool,
}

impl<'stmt> RowStream<'stmt> {
    /// Bind parameters and open the cursor.
    pub(crate) fn query(
        stmt: &'stmt mut Statement<'_>,
        params: &Params,
        columns: usize,
    ) -> Result<Self, AccessError> {
        let rows = match params {
            Params::None => stmt.query([]),
            Params::Positional(values) => {
                let refs: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
                stmt.query(refs.as_slice())
            }
            Params::Named(pairs) => {
                let refs: Vec<(&str, &dyn ToSql)> = pairs
                    .iter()
                    .map(|(k, v)| (k.as_str(), v as &dyn ToSql))
                    .collect();
                stmt.query(refs.as_slice())
            }
        }
        .map_err(|e| AccessError::Execution { message: e.to_string() })?;

        Ok(RowStream {
            rows,
            columns,
            exhausted: false,
        })
    }

    /// Pull the next row. `Ok(None)` once the cursor is drained; stays
    /// `Ok(None)` on every call after that.
    pub fn advance(&mut self) -> Result<Option<Row>, AccessError> {
        if self.exhausted {
            return Ok(None);
        }
        match self.rows.next() {
            Ok(Some(row)) => match Row::from_sql_row(row, self.columns) {
                Ok(row) => Ok(Some(row)),
                Err(e) => {
                    self.exhausted = true;
                    Err(e)
                }
            },
            Ok(None) => {
                self.exhausted = true;
                Ok(None)
            }
            Err(e) => {
                self.exhausted = true;
                Err(AccessError::Execution { message: e.to_string() })
            }
        }
    }

    /// Whether the stream has reached its end (or failed).
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Iterator for RowStream<'_> {
    type Item = Result<Row, AccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
