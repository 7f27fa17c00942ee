//! Sled-backed forecast store.
//!
//! Trees:
//! - `forecasts`: key `project\0forecast`, value JSON [`Forecast`]
//! - `forecast_outputs`: key `project\0forecast\0well\0phase`, value JSON [`ForecastOutput`]
//!
//! The key layout turns a pipeline's leading match scope into a prefix scan.
//! Ids may contain `/`, so key parts are joined with NUL.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::executor::execute;
use super::{ForecastStore, SeedData, StoreError};
use crate::grouping::{Pipeline, WellForecastGroup};
use crate::model::{Forecast, ForecastOutput};

const FORECASTS_TREE: &str = "forecasts";
const OUTPUTS_TREE: &str = "forecast_outputs";
const KEY_SEP: char = '\0';

fn forecast_key(project: &str, forecast: &str) -> String {
    format!("{project}{KEY_SEP}{forecast}")
}

fn scope_prefix(project: &str, forecast: &str) -> String {
    format!("{project}{KEY_SEP}{forecast}{KEY_SEP}")
}

fn output_key(output: &ForecastOutput) -> String {
    format!(
        "{}{}{KEY_SEP}{}",
        scope_prefix(&output.project, &output.forecast),
        output.well,
        output.phase
    )
}

#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
}

impl SledStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;

        info!("Forecast store opened at {:?}", path_ref);

        Ok(Self { db: Arc::new(db) })
    }

    pub fn put_forecast(&self, forecast: &Forecast) -> Result<(), StoreError> {
        let tree = self.db.open_tree(FORECASTS_TREE)?;
        let value = serde_json::to_vec(forecast)?;
        tree.insert(forecast_key(&forecast.project, &forecast.id), value)?;
        Ok(())
    }

    /// Insert or replace the output for its (well, phase) pair.
    pub fn put_output(&self, output: &ForecastOutput) -> Result<(), StoreError> {
        let tree = self.db.open_tree(OUTPUTS_TREE)?;
        let value = serde_json::to_vec(output)?;
        tree.insert(output_key(output), value)?;
        Ok(())
    }

    /// Write every document of `seed` and flush. Returns the documents written.
    pub fn import(&self, seed: &SeedData) -> Result<usize, StoreError> {
        for forecast in &seed.forecasts {
            self.put_forecast(forecast)?;
        }
        for output in &seed.forecast_outputs {
            self.put_output(output)?;
        }
        self.db.flush()?;

        let written = seed.forecasts.len() + seed.forecast_outputs.len();
        info!(
            forecasts = seed.forecasts.len(),
            outputs = seed.forecast_outputs.len(),
            "Imported seed documents"
        );
        Ok(written)
    }

    async fn scoped_records(&self, pipeline: &Pipeline) -> Result<Vec<ForecastOutput>, StoreError> {
        let scope = pipeline
            .scope()
            .ok_or_else(|| StoreError::Pipeline("pipeline must start with a match stage".to_string()))?;
        let prefix = scope_prefix(&scope.project, &scope.forecast);
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> Result<Vec<ForecastOutput>, StoreError> {
            let tree = db.open_tree(OUTPUTS_TREE)?;
            tree.scan_prefix(prefix.as_bytes())
                .map(|item| -> Result<ForecastOutput, StoreError> {
                    let (_key, value) = item?;
                    Ok(serde_json::from_slice(&value)?)
                })
                .collect()
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl ForecastStore for SledStore {
    async fn find_forecast(
        &self,
        project: &str,
        forecast: &str,
    ) -> Result<Option<Forecast>, StoreError> {
        let key = forecast_key(project, forecast);
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> Result<Option<Forecast>, StoreError> {
            let tree = db.open_tree(FORECASTS_TREE)?;
            match tree.get(key.as_bytes())? {
                Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn aggregate_groups(&self, pipeline: &Pipeline) -> Result<Vec<WellForecastGroup>, StoreError> {
        execute(self.scoped_records(pipeline).await?, pipeline)?.into_groups()
    }

    async fn aggregate_count(&self, pipeline: &Pipeline) -> Result<u64, StoreError> {
        execute(self.scoped_records(pipeline).await?, pipeline)?.into_count()
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
