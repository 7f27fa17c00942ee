//! Forecast document store
//!
//! Abstracts where forecasts and forecast outputs live so the service only
//! hands over pipeline descriptions:
//! - `InMemoryStore`: in-memory store for tests and seeded demo deployments
//! - `SledStore`: embedded sled database, one JSON document per output
//!
//! Both evaluate pipelines with the shared [`executor`].

pub mod executor;
pub mod memory;
pub mod sled_store;

pub use memory::InMemoryStore;
pub use sled_store::SledStore;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::grouping::{Pipeline, WellForecastGroup};
use crate::model::{Forecast, ForecastOutput};

/// Store errors. Never retried inside the engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pipeline error: {0}")]
    Pipeline(String),
    #[error("store task failed: {0}")]
    Task(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Pluggable document store backend.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across request handlers.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    async fn find_forecast(
        &self,
        project: &str,
        forecast: &str,
    ) -> Result<Option<Forecast>, StoreError>;

    /// Run a grouping pipeline and return its groups in pipeline order.
    async fn aggregate_groups(&self, pipeline: &Pipeline) -> Result<Vec<WellForecastGroup>, StoreError>;

    /// Run a pipeline ending in a count stage.
    async fn aggregate_count(&self, pipeline: &Pipeline) -> Result<u64, StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Seed document set, as found in `seed_file` and the `import` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub forecasts: Vec<Forecast>,
    #[serde(default)]
    pub forecast_outputs: Vec<ForecastOutput>,
}

impl SeedData {
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }
}
