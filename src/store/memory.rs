//! In-memory forecast store.
//!
//! Thread-safe via `RwLock`. Not durable; data lives as long as the process.

use std::sync::RwLock;

use async_trait::async_trait;

use super::executor::execute;
use super::{ForecastStore, SeedData, StoreError};
use crate::grouping::{Pipeline, WellForecastGroup};
use crate::model::{Forecast, ForecastOutput};

#[derive(Default)]
pub struct InMemoryStore {
    forecasts: RwLock<Vec<Forecast>>,
    outputs: RwLock<Vec<ForecastOutput>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        Self {
            forecasts: RwLock::new(seed.forecasts),
            outputs: RwLock::new(seed.forecast_outputs),
        }
    }

    pub fn insert_forecast(&self, forecast: Forecast) -> Result<(), StoreError> {
        let mut store = self
            .forecasts
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        store.retain(|f| !(f.id == forecast.id && f.project == forecast.project));
        store.push(forecast);
        Ok(())
    }

    /// Insert or replace the output for its (well, phase) pair.
    pub fn insert_output(&self, output: ForecastOutput) -> Result<(), StoreError> {
        let mut store = self
            .outputs
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        store.retain(|o| {
            !(o.project == output.project
                && o.forecast == output.forecast
                && o.well == output.well
                && o.phase == output.phase)
        });
        store.push(output);
        Ok(())
    }

    fn scoped_records(&self, pipeline: &Pipeline) -> Result<Vec<ForecastOutput>, StoreError> {
        let scope = pipeline
            .scope()
            .ok_or_else(|| StoreError::Pipeline("pipeline must start with a match stage".to_string()))?;
        let store = self
            .outputs
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(store
            .iter()
            .filter(|o| o.project == scope.project && o.forecast == scope.forecast)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ForecastStore for InMemoryStore {
    async fn find_forecast(
        &self,
        project: &str,
        forecast: &str,
    ) -> Result<Option<Forecast>, StoreError> {
        let store = self
            .forecasts
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(store
            .iter()
            .find(|f| f.project == project && f.id == forecast)
            .cloned())
    }

    async fn aggregate_groups(&self, pipeline: &Pipeline) -> Result<Vec<WellForecastGroup>, StoreError> {
        execute(self.scoped_records(pipeline)?, pipeline)?.into_groups()
    }

    async fn aggregate_count(&self, pipeline: &Pipeline) -> Result<u64, StoreError> {
        execute(self.scoped_records(pipeline)?, pipeline)?.into_count()
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::PipelineBuilder;
    use crate::model::{ForecastKind, OutputType, Phase};
    use crate::query::StoreFilter;
    use std::collections::BTreeMap;

    fn output(well: &str, phase: Phase) -> ForecastOutput {
        ForecastOutput {
            id: format!("{well}-{phase}"),
            project: "p".to_string(),
            forecast: "f".to_string(),
            well: well.to_string(),
            phase,
            forecast_type: OutputType::Rate,
            p_dict: BTreeMap::new(),
            ratio: None,
            updated_at: None,
        }
    }

    fn scope() -> StoreFilter {
        StoreFilter {
            project: "p".to_string(),
            forecast: "f".to_string(),
            ..StoreFilter::default()
        }
    }

    #[tokio::test]
    async fn test_insert_output_replaces_same_phase() {
        let store = InMemoryStore::new();
        store.insert_output(output("A", Phase::Oil)).unwrap();
        store.insert_output(output("A", Phase::Oil)).unwrap();
        store.insert_output(output("A", Phase::Gas)).unwrap();

        let pipeline = PipelineBuilder::new(scope()).build();
        let groups = store.aggregate_groups(&pipeline).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].outputs.len(), 2);
    }

    #[tokio::test]
    async fn test_find_forecast_scoped_by_project() {
        let store = InMemoryStore::new();
        store
            .insert_forecast(Forecast {
                id: "f".to_string(),
                project: "p".to_string(),
                name: "Base case".to_string(),
                kind: ForecastKind::Deterministic,
                wells: vec!["A".to_string()],
            })
            .unwrap();

        assert!(store.find_forecast("p", "f").await.unwrap().is_some());
        assert!(store.find_forecast("other", "f").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trait_object() {
        let store: Box<dyn ForecastStore> = Box::new(InMemoryStore::from_seed(SeedData {
            forecasts: Vec::new(),
            forecast_outputs: vec![output("A", Phase::Oil), output("B", Phase::Oil)],
        }));
        assert_eq!(store.backend_name(), "InMemory");
        let pipeline = PipelineBuilder::new(scope()).count().build();
        assert_eq!(store.aggregate_count(&pipeline).await.unwrap(), 2);
    }
}
