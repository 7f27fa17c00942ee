//! API handlers.
//!
//! All handlers return `Response` via the [`envelope`](super::envelope) types.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use super::envelope::{ApiErrorResponse, ApiPage, ApiResponse};
use super::wire::to_api_forecast_volumes;
use crate::config::ServiceConfig;
use crate::model::{Forecast, Resolution};
use crate::query::QueryFilters;
use crate::service::{ForecastVolumeService, ServiceError, VolumeRequest};
use crate::volumes::{DateRange, VolumeError};

pub const QUERY_COUNT_HEADER: HeaderName = HeaderName::from_static("x-query-count");

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ForecastVolumeService>,
}

impl AppState {
    pub fn new(service: ForecastVolumeService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

// ============================================================================
// Query types
// ============================================================================

/// Query string of the volume endpoints. `well`, `phase` and `forecastType`
/// take comma-separated lists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesQuery {
    pub skip: Option<usize>,
    pub take: Option<usize>,
    pub sort: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub resolution: Option<Resolution>,
    pub cursor: Option<String>,
    pub well: Option<String>,
    pub phase: Option<String>,
    pub forecast_type: Option<String>,
}

impl VolumesQuery {
    fn filters(&self) -> QueryFilters {
        QueryFilters {
            well: self.well.clone(),
            phase: self.phase.clone(),
            forecast_type: self.forecast_type.clone(),
        }
    }

    fn into_request(self) -> VolumeRequest {
        let filters = self.filters();
        VolumeRequest {
            skip: self.skip.unwrap_or(0),
            take: self.take,
            sort: self.sort,
            range: DateRange {
                start_date: self.start_date,
                end_date: self.end_date,
            },
            filters,
            resolution: self.resolution.unwrap_or_default(),
            cursor: self.cursor,
        }
    }
}

// ============================================================================
// Error mapping
// ============================================================================

fn error_response(err: ServiceError) -> Response {
    match &err {
        ServiceError::Volume(VolumeError::Cancelled) => {
            ApiErrorResponse::service_unavailable(err.to_string())
        }
        ServiceError::Volume(e) => ApiErrorResponse::invalid_fields(e.to_string(), e.fields()),
        ServiceError::Query(e) => ApiErrorResponse::invalid_fields(e.to_string(), e.fields()),
        ServiceError::ForecastNotFound { .. } => ApiErrorResponse::not_found(err.to_string()),
        ServiceError::Store(_) | ServiceError::Worker(_) => {
            error!(error = %err, "Forecast volume request failed");
            ApiErrorResponse::internal(err.to_string())
        }
    }
}

fn parse_query(query: Result<Query<VolumesQuery>, QueryRejection>) -> Result<VolumesQuery, Response> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiErrorResponse::bad_request(e.body_text()))
}

async fn resolve_forecast(
    service: &ForecastVolumeService,
    project: &str,
    forecast: &str,
) -> Result<Forecast, Response> {
    service
        .find_forecast(project, forecast)
        .await
        .map_err(error_response)
}

// ============================================================================
// Volume endpoints
// ============================================================================

/// GET /api/v1/projects/:project/forecasts/:forecast/volumes
pub async fn get_volumes(
    State(state): State<AppState>,
    Path((project, forecast_id)): Path<(String, String)>,
    query: Result<Query<VolumesQuery>, QueryRejection>,
) -> Response {
    let query = match parse_query(query) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let forecast = match resolve_forecast(&state.service, &project, &forecast_id).await {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    // Dropping the handler future (client went away) cancels assembly.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let request = query.into_request();
    match state
        .service
        .get_forecast_volumes(&request, &project, &forecast, &cancel)
        .await
    {
        Ok(page) => {
            let data = page.result.iter().map(to_api_forecast_volumes).collect();
            ApiPage::ok(data, page.has_next, page.cursor)
        }
        Err(e) => {
            if e.is_cancelled() {
                warn!(project = %project, forecast = %forecast_id, "Volume request cancelled");
            }
            error_response(e)
        }
    }
}

async fn count_for(
    state: &AppState,
    project: &str,
    forecast_id: &str,
    query: Result<Query<VolumesQuery>, QueryRejection>,
) -> Result<u64, Response> {
    let query = parse_query(query)?;
    let forecast = resolve_forecast(&state.service, project, forecast_id).await?;
    state
        .service
        .count(&query.filters(), project, &forecast)
        .await
        .map_err(error_response)
}

/// GET /api/v1/projects/:project/forecasts/:forecast/volumes/count
pub async fn count_volumes(
    State(state): State<AppState>,
    Path((project, forecast_id)): Path<(String, String)>,
    query: Result<Query<VolumesQuery>, QueryRejection>,
) -> Response {
    match count_for(&state, &project, &forecast_id, query).await {
        Ok(count) => ApiResponse::ok(serde_json::json!({ "count": count })),
        Err(resp) => resp,
    }
}

/// HEAD /api/v1/projects/:project/forecasts/:forecast/volumes
///
/// Well count in the `X-Query-Count` header, no body.
pub async fn head_volumes(
    State(state): State<AppState>,
    Path((project, forecast_id)): Path<(String, String)>,
    query: Result<Query<VolumesQuery>, QueryRejection>,
) -> Response {
    match count_for(&state, &project, &forecast_id, query).await {
        Ok(count) => (
            StatusCode::OK,
            [(QUERY_COUNT_HEADER, HeaderValue::from(count))],
        )
            .into_response(),
        Err(resp) => {
            let (parts, _body) = resp.into_parts();
            parts.status.into_response()
        }
    }
}

// ============================================================================
// Service endpoints
// ============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    ApiResponse::ok(serde_json::json!({
        "status": "ok",
        "backend": state.service.backend_name(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/v1/config/reload: re-read the `[volumes]` settings.
pub async fn reload_config(State(state): State<AppState>) -> Response {
    match ServiceConfig::reload() {
        Ok(config) => {
            let previous = state.service.settings();
            let changed = *previous != config.volumes;
            state.service.update_settings(config.volumes.clone());
            ApiResponse::ok(serde_json::json!({
                "reloaded": true,
                "changed": changed,
                "volumes": config.volumes,
            }))
        }
        Err(e) => ApiErrorResponse::internal(format!("Reload failed: {e}")),
    }
}
