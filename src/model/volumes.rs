//! Computed volume results.
//!
//! These are never persisted; the service rebuilds them on every request.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::forecast::{Phase, Series};

/// Output granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Daily,
    Monthly,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::Monthly => f.write_str("monthly"),
        }
    }
}

/// Volumes of one P-series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesVolumes {
    pub eur: Option<f64>,
    pub series: Series,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub volumes: Vec<f64>,
}

/// Volumes of a ratio phase, already multiplied by its base phase.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioVolumes {
    pub eur: Option<f64>,
    pub base_phase: Phase,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub volumes: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseVolumes {
    pub phase: Phase,
    pub forecast_output_id: String,
    pub series: Vec<SeriesVolumes>,
    pub ratio: Option<RatioVolumes>,
}

/// All phase volumes of one well.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastVolumes {
    pub project: String,
    pub forecast: String,
    pub well: String,
    pub resolution: Resolution,
    pub phases: Vec<PhaseVolumes>,
}
