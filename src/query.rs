//! Filter and sort translation for forecast volume queries.
//!
//! Turns the raw query parameters of a request into a [`StoreFilter`] for the
//! match stage and a [`SortPlan`] for the sort stage and cursor paging.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{ForecastOutput, OutputType, Phase};

/// Errors from translating filter and sort parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("`{0}` is not a valid phase, expected one of oil, gas, water")]
    InvalidPhase(String),
    #[error("`{0}` is not a valid forecastType")]
    InvalidForecastType(String),
    #[error("`{0}` is not a sortable field, expected well or forecast")]
    InvalidSortField(String),
    #[error("cursor paging is not supported when sorting by {0}")]
    CursorNotSupported(&'static str),
    #[error("cursor must not be empty")]
    EmptyCursor,
}

impl QueryError {
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::InvalidPhase(_) => &["phase"],
            Self::InvalidForecastType(_) => &["forecastType"],
            Self::InvalidSortField(_) => &["sort"],
            Self::CursorNotSupported(_) => &["sort", "cursor"],
            Self::EmptyCursor => &["cursor"],
        }
    }
}

/// Raw filter parameters. Multi-valued filters are comma separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilters {
    #[serde(default)]
    pub well: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub forecast_type: Option<String>,
}

/// Keyset bound derived from a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WellBound {
    After(String),
    Before(String),
}

/// Match-stage filter over forecast output records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFilter {
    pub project: String,
    pub forecast: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wells: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<Phase>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_types: Option<Vec<OutputType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub well_bound: Option<WellBound>,
}

impl StoreFilter {
    pub fn matches(&self, output: &ForecastOutput) -> bool {
        output.project == self.project
            && output.forecast == self.forecast
            && self.wells.as_ref().map_or(true, |w| w.contains(&output.well))
            && self.phases.as_ref().map_or(true, |p| p.contains(&output.phase))
            && self
                .output_types
                .as_ref()
                .map_or(true, |t| t.contains(&output.forecast_type))
            && match &self.well_bound {
                None => true,
                Some(WellBound::After(w)) => output.well.as_str() > w.as_str(),
                Some(WellBound::Before(w)) => output.well.as_str() < w.as_str(),
            }
    }
}

fn split_values(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|v| !v.is_empty())
}

/// Build the match filter for one forecast.
pub fn get_filters(
    filters: &QueryFilters,
    project: &str,
    forecast: &str,
    cursor_filter: Option<WellBound>,
) -> Result<StoreFilter, QueryError> {
    let wells = filters
        .well
        .as_deref()
        .map(|raw| split_values(raw).map(str::to_string).collect());

    let phases = filters
        .phase
        .as_deref()
        .map(|raw| {
            split_values(raw)
                .map(|v| Phase::parse(v).ok_or_else(|| QueryError::InvalidPhase(v.to_string())))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let output_types = filters
        .forecast_type
        .as_deref()
        .map(|raw| {
            split_values(raw)
                .map(|v| {
                    OutputType::parse(v).ok_or_else(|| QueryError::InvalidForecastType(v.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(StoreFilter {
        project: project.to_string(),
        forecast: forecast.to_string(),
        wells,
        phases,
        output_types,
        well_bound: cursor_filter,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Well,
    Forecast,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Well => "well",
            Self::Forecast => "forecast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Records and groups the sort stage can order.
pub trait SortKeys {
    fn well_key(&self) -> &str;
    fn forecast_key(&self) -> &str;
}

impl SortKeys for ForecastOutput {
    fn well_key(&self) -> &str {
        &self.well
    }

    fn forecast_key(&self) -> &str {
        &self.forecast
    }
}

/// A total order: ties on the primary field break on well id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortQuery {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortQuery {
    fn default() -> Self {
        Self {
            field: SortField::Well,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortQuery {
    pub fn compare<T: SortKeys>(&self, a: &T, b: &T) -> Ordering {
        let primary = match self.field {
            SortField::Well => a.well_key().cmp(b.well_key()),
            SortField::Forecast => a
                .forecast_key()
                .cmp(b.forecast_key())
                .then_with(|| a.well_key().cmp(b.well_key())),
        };
        match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        }
    }
}

/// Sort stage plus cursor handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPlan {
    pub sort_query: SortQuery,
    pub cursor_filter: Option<WellBound>,
    pub allow_cursor: bool,
}

impl SortPlan {
    /// Cursor to hand back for a page ending at `last`.
    pub fn cursor_after<T: SortKeys>(&self, last: &T) -> Option<String> {
        self.allow_cursor.then(|| last.well_key().to_string())
    }
}

/// Parse `sort` (`well`, `-well`, `+forecast`, ...) and an optional cursor.
///
/// Only well-id sorts support cursors; the cursor is the last well id seen.
pub fn get_sort(sort_spec: Option<&str>, cursor: Option<&str>) -> Result<SortPlan, QueryError> {
    let sort_query = match sort_spec.map(str::trim).filter(|s| !s.is_empty()) {
        None => SortQuery::default(),
        Some(spec) => {
            let (direction, name) = match spec.strip_prefix('-') {
                Some(rest) => (SortDirection::Descending, rest),
                None => (SortDirection::Ascending, spec.strip_prefix('+').unwrap_or(spec)),
            };
            let field = match name {
                "well" => SortField::Well,
                "forecast" => SortField::Forecast,
                other => return Err(QueryError::InvalidSortField(other.to_string())),
            };
            SortQuery { field, direction }
        }
    };

    let allow_cursor = sort_query.field == SortField::Well;
    let cursor_filter = match cursor {
        None => None,
        Some(c) if c.trim().is_empty() => return Err(QueryError::EmptyCursor),
        Some(_) if !allow_cursor => {
            return Err(QueryError::CursorNotSupported(sort_query.field.as_str()))
        }
        Some(c) => Some(match sort_query.direction {
            SortDirection::Ascending => WellBound::After(c.to_string()),
            SortDirection::Descending => WellBound::Before(c.to_string()),
        }),
    };

    Ok(SortPlan {
        sort_query,
        cursor_filter,
        allow_cursor,
    })
}
