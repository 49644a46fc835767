//! Bound statement parameters.
//!
//! Named parameter sets are order-insensitive: two sets with the same
//! key/value pairs in different order are the same parameters, and the
//! canonical encoding (used for cache fingerprints) sorts by key to make
//! that hold.

use serde::{Deserialize, Serialize};

use super::Value;

/// Parameters bound to one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Params {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Params::Named(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Positional(values) => values.is_empty(),
            Params::Named(pairs) => pairs.is_empty(),
        }
    }

    /// Appends a canonical encoding of the parameter set. Empty sets of any
    /// shape encode identically, and named sets encode key-sorted.
    pub fn write_canonical(&self, buf: &mut Vec<u8>) {
        if self.is_empty() {
            buf.push(0);
            return;
        }
        match self {
            Params::None => {}
            Params::Positional(values) => {
                buf.push(1);
                buf.extend_from_slice(&(values.len() as u64).to_le_bytes());
                for value in values {
                    value.write_canonical(buf);
                }
            }
            Params::Named(pairs) => {
                buf.push(2);
                buf.extend_from_slice(&(pairs.len() as u64).to_le_bytes());
                let mut sorted: Vec<&(String, Value)> = pairs.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                for (key, value) in sorted {
                    buf.extend_from_slice(&(key.len() as u64).to_le_bytes());
                    buf.extend_from_slice(key.as_bytes());
                    value.write_canonical(buf);
                }
            }
        }
    }
}
