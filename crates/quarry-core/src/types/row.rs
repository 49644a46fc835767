//! An ordered, fixed-arity tuple of typed fields.

use serde::{Deserialize, Serialize};

use crate::errors::AccessError;

use super::Value;

/// One row from the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row(values)
    }

    /// Converts one cursor position into an owned row. `columns` is the
    /// statement's column count, captured before the cursor was opened.
    pub fn from_sql_row(row: &rusqlite::Row<'_>, columns: usize) -> Result<Self, AccessError> {
        let mut values = Vec::with_capacity(columns);
        for idx in 0..columns {
            let value = row
                .get_ref(idx)
                .map_err(|e| AccessError::Execution { message: e.to_string() })?;
            values.push(Value::from(value));
        }
        Ok(Row(values))
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.0.get(idx)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Field at `idx` as an integer, if present and integral.
    pub fn as_i64(&self, idx: usize) -> Option<i64> {
        self.get(idx).and_then(Value::as_i64)
    }

    /// Field at `idx` widened to a float (integers widen losslessly enough
    /// for aggregation).
    pub fn as_f64(&self, idx: usize) -> Option<f64> {
        self.get(idx).and_then(Value::as_f64)
    }

    pub fn as_str(&self, idx: usize) -> Option<&str> {
        self.get(idx).and_then(Value::as_str)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row(values)
    }
}
