//! # quarry-core
//!
//! Foundation crate for the Quarry data-access engine.
//! Defines the value/row/parameter types, the error taxonomy, configuration,
//! and tracing setup. The engine crate depends on this.

pub mod config;
pub mod errors;
pub mod tracing;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::AccessConfig;
pub use errors::error_code::QuarryErrorCode;
pub use errors::AccessError;
pub use types::{Params, Row, Value};
