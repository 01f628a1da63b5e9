//! Repository Module
//!
//! Data access layer for the server.
//! Each repository handles database operations for a specific domain entity.

pub mod alert;
pub mod pipeline;
pub mod run;

use std::str::FromStr;

use pipewatch_core::domain::ParseStatusError;

// Re-export for convenience
pub use alert as alert_repository;
pub use pipeline as pipeline_repository;
pub use run as run_repository;

/// Decode a status column, surfacing unknown values as a decode error
fn decode_status<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = ParseStatusError>,
{
    raw.parse::<T>()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}
