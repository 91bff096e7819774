//! Contact sources: where raw rows come from.
//!
//! The engine only sees the `ContactSource` trait; the concrete source
//! here reads a JSON snapshot file, standing in for a device provider.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::RawContactRow;

/// The raw source failed outright; no rows were obtained for this load.
///
/// The message is what gets surfaced to the presentation boundary, so
/// it is kept verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SourceUnavailable {
    message: String,
}

impl SourceUnavailable {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Abstraction over the provider that yields raw contact rows.
///
/// There is no partial-result contract: a failure means zero rows were
/// obtained for this load.
#[allow(async_fn_in_trait)]
pub trait ContactSource {
    /// Fetch every raw row for one load cycle.
    async fn fetch_all(&self) -> Result<Vec<RawContactRow>, SourceUnavailable>;
}

/// Reads raw rows from a JSON snapshot file: an array of row objects
/// with `id` and optional `name`, `number`, `email` fields.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContactSource for JsonFileSource {
    async fn fetch_all(&self) -> Result<Vec<RawContactRow>, SourceUnavailable> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceUnavailable::new(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            SourceUnavailable::new(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }
}
