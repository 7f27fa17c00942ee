//! Forecast Volume Service
//!
//! Entry point for volume requests: parses filters and sort, pages wells
//! through the store's grouping pipeline, then assembles each well's volumes
//! in parallel.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::VolumeSettings;
use crate::grouping::{count_wells, fetch_well_groups};
use crate::model::{Forecast, ForecastVolumes, Resolution};
use crate::query::{get_filters, get_sort, QueryError, QueryFilters};
use crate::store::{ForecastStore, StoreError};
use crate::volumes::{assemble_well, DateRange, VolumeError};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Volume(#[from] VolumeError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("forecast {forecast} not found in project {project}")]
    ForecastNotFound { project: String, forecast: String },
    #[error("volume worker failed: {0}")]
    Worker(String),
}

impl ServiceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Volume(VolumeError::Cancelled))
    }
}

// ============================================================================
// Request / Response
// ============================================================================

/// One volume request against a forecast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeRequest {
    pub skip: usize,
    /// Wells per page; `None` uses the configured default.
    pub take: Option<usize>,
    pub sort: Option<String>,
    pub range: DateRange,
    pub filters: QueryFilters,
    pub resolution: Resolution,
    pub cursor: Option<String>,
}

/// A page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub result: Vec<T>,
    pub has_next: bool,
    /// Well id to resume after, when the sort supports cursors.
    pub cursor: Option<String>,
}

// ============================================================================
// Service
// ============================================================================

pub struct ForecastVolumeService {
    store: Arc<dyn ForecastStore>,
    settings: Arc<ArcSwap<VolumeSettings>>,
}

impl ForecastVolumeService {
    pub fn new(store: Arc<dyn ForecastStore>, settings: VolumeSettings) -> Self {
        Self {
            store,
            settings: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<VolumeSettings> {
        self.settings.load_full()
    }

    /// Swap in new settings; requests already running keep their snapshot.
    pub fn update_settings(&self, settings: VolumeSettings) {
        info!(
            daily_year_limit = settings.daily_year_limit,
            default_take = settings.default_take,
            max_take = settings.max_take,
            "Volume settings updated"
        );
        self.settings.store(Arc::new(settings));
    }

    pub async fn find_forecast(&self, project: &str, forecast: &str) -> Result<Forecast, ServiceError> {
        self.store
            .find_forecast(project, forecast)
            .await?
            .ok_or_else(|| ServiceError::ForecastNotFound {
                project: project.to_string(),
                forecast: forecast.to_string(),
            })
    }

    /// Number of distinct wells matching `filters`.
    pub async fn count(
        &self,
        filters: &QueryFilters,
        project: &str,
        forecast: &Forecast,
    ) -> Result<u64, ServiceError> {
        let filter = get_filters(filters, project, &forecast.id, None)?;
        Ok(count_wells(self.store.as_ref(), filter).await?)
    }

    /// One page of well volumes.
    pub async fn get_forecast_volumes(
        &self,
        request: &VolumeRequest,
        project: &str,
        forecast: &Forecast,
        cancel: &CancellationToken,
    ) -> Result<Page<ForecastVolumes>, ServiceError> {
        let started = Instant::now();
        let settings = self.settings();
        let take = settings.page_size(request.take);

        let plan = get_sort(request.sort.as_deref(), request.cursor.as_deref())?;
        let filter = get_filters(&request.filters, project, &forecast.id, plan.cursor_filter.clone())?;
        let page = fetch_well_groups(self.store.as_ref(), filter, plan.sort_query, request.skip, take).await?;

        if cancel.is_cancelled() {
            return Err(VolumeError::Cancelled.into());
        }

        let cursor = page.groups.last().and_then(|g| plan.cursor_after(g));
        let wells = page.groups.len();
        debug!(project, forecast = %forecast.id, wells, "Assembling well volumes");

        let kind = forecast.kind;
        let range = request.range;
        let resolution = request.resolution;
        let daily_year_limit = settings.daily_year_limit;
        let token = cancel.clone();
        let groups = page.groups;

        let result = tokio::task::spawn_blocking(move || -> Result<Vec<ForecastVolumes>, VolumeError> {
            groups
                .par_iter()
                .map(|group| {
                    if token.is_cancelled() {
                        return Err(VolumeError::Cancelled);
                    }
                    assemble_well(group, kind, &range, resolution, daily_year_limit)
                })
                .collect()
        })
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))??;

        info!(
            project,
            forecast = %forecast.id,
            wells,
            %resolution,
            has_next = page.has_next,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Forecast volumes computed"
        );

        Ok(Page {
            result,
            has_next: page.has_next,
            cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ForecastKind, ForecastOutput, OutputType, Phase, Segment, SegmentKind, Series, SeriesForecast,
    };
    use crate::store::{InMemoryStore, SeedData};
    use std::collections::BTreeMap;

    fn flat_output(well: &str, phase: Phase, start: i64, end: i64) -> ForecastOutput {
        let mut segment = Segment::with_kind(SegmentKind::Flat, start, end);
        segment.c = 10.0;
        ForecastOutput {
            id: format!("{well}-{phase}"),
            project: "p".to_string(),
            forecast: "f".to_string(),
            well: well.to_string(),
            phase,
            forecast_type: OutputType::Rate,
            p_dict: BTreeMap::from([(
                Series::Best,
                SeriesForecast {
                    segments: vec![segment],
                    eur: None,
                },
            )]),
            ratio: None,
            updated_at: None,
        }
    }

    fn service() -> (ForecastVolumeService, Forecast) {
        let forecast = Forecast {
            id: "f".to_string(),
            project: "p".to_string(),
            name: "Base".to_string(),
            kind: ForecastKind::Deterministic,
            wells: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        };
        let store = InMemoryStore::from_seed(SeedData {
            forecasts: vec![forecast.clone()],
            forecast_outputs: vec![
                flat_output("C", Phase::Oil, 45_290, 45_299),
                flat_output("A", Phase::Oil, 45_290, 45_299),
                flat_output("A", Phase::Gas, 45_295, 45_309),
                flat_output("B", Phase::Water, 45_290, 45_290),
            ],
        });
        (
            ForecastVolumeService::new(Arc::new(store), VolumeSettings::default()),
            forecast,
        )
    }

    #[tokio::test]
    async fn test_count_respects_well_filter() {
        let (service, forecast) = service();
        assert_eq!(service.count(&QueryFilters::default(), "p", &forecast).await.unwrap(), 3);

        let filters = QueryFilters {
            well: Some("A".to_string()),
            ..QueryFilters::default()
        };
        assert_eq!(service.count(&filters, "p", &forecast).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_forecast() {
        let (service, _) = service();
        let err = service.find_forecast("p", "missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::ForecastNotFound { .. }));
    }

    #[tokio::test]
    async fn test_page_and_cursor() {
        let (service, forecast) = service();
        let request = VolumeRequest {
            take: Some(2),
            ..VolumeRequest::default()
        };
        let page = service
            .get_forecast_volumes(&request, "p", &forecast, &CancellationToken::new())
            .await
            .unwrap();

        let wells: Vec<_> = page.result.iter().map(|v| v.well.as_str()).collect();
        assert_eq!(wells, vec!["A", "B"]);
        assert!(page.has_next);
        assert_eq!(page.cursor.as_deref(), Some("B"));

        let next = VolumeRequest {
            cursor: page.cursor.clone(),
            ..request
        };
        let page = service
            .get_forecast_volumes(&next, "p", &forecast, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.result.len(), 1);
        assert_eq!(page.result[0].well, "C");
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_forecast_sort_has_no_cursor() {
        let (service, forecast) = service();
        let request = VolumeRequest {
            sort: Some("-forecast".to_string()),
            ..VolumeRequest::default()
        };
        let page = service
            .get_forecast_volumes(&request, "p", &forecast, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.result.len(), 3);
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_assembly() {
        let (service, forecast) = service();
        let token = CancellationToken::new();
        token.cancel();
        let err = service
            .get_forecast_volumes(&VolumeRequest::default(), "p", &forecast, &token)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_settings_swap_applies_to_next_request() {
        let (service, forecast) = service();
        service.update_settings(VolumeSettings {
            default_take: 1,
            ..VolumeSettings::default()
        });
        let page = service
            .get_forecast_volumes(&VolumeRequest::default(), "p", &forecast, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.result.len(), 1);
        assert!(page.has_next);
    }
}
