//! Wire representation of forecast volumes.
//!
//! Pure mapping from the engine's volume types to camelCase JSON with
//! `YYYY-MM-DD` dates.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{
    ForecastVolumes, Phase, PhaseVolumes, RatioVolumes, Resolution, Series, SeriesVolumes,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSeriesVolumes {
    pub series: Series,
    pub eur: Option<f64>,
    pub start_date: String,
    pub end_date: String,
    pub volumes: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRatioVolumes {
    pub base_phase: Phase,
    pub eur: Option<f64>,
    pub start_date: String,
    pub end_date: String,
    pub volumes: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPhaseVolumes {
    pub phase: Phase,
    pub forecast_output_id: String,
    pub series: Vec<ApiSeriesVolumes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<ApiRatioVolumes>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiForecastVolumes {
    pub project: String,
    pub forecast: String,
    pub well: String,
    pub resolution: Resolution,
    pub phases: Vec<ApiPhaseVolumes>,
}

impl From<&SeriesVolumes> for ApiSeriesVolumes {
    fn from(v: &SeriesVolumes) -> Self {
        Self {
            series: v.series,
            eur: v.eur,
            start_date: format_date(v.start_date),
            end_date: format_date(v.end_date),
            volumes: v.volumes.clone(),
        }
    }
}

impl From<&RatioVolumes> for ApiRatioVolumes {
    fn from(v: &RatioVolumes) -> Self {
        Self {
            base_phase: v.base_phase,
            eur: v.eur,
            start_date: format_date(v.start_date),
            end_date: format_date(v.end_date),
            volumes: v.volumes.clone(),
        }
    }
}

impl From<&PhaseVolumes> for ApiPhaseVolumes {
    fn from(v: &PhaseVolumes) -> Self {
        Self {
            phase: v.phase,
            forecast_output_id: v.forecast_output_id.clone(),
            series: v.series.iter().map(ApiSeriesVolumes::from).collect(),
            ratio: v.ratio.as_ref().map(ApiRatioVolumes::from),
        }
    }
}

pub fn to_api_forecast_volumes(volumes: &ForecastVolumes) -> ApiForecastVolumes {
    ApiForecastVolumes {
        project: volumes.project.clone(),
        forecast: volumes.forecast.clone(),
        well: volumes.well.clone(),
        resolution: volumes.resolution,
        phases: volumes.phases.iter().map(ApiPhaseVolumes::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_wire_shape() {
        let volumes = ForecastVolumes {
            project: "p".to_string(),
            forecast: "f".to_string(),
            well: "W1".to_string(),
            resolution: Resolution::Monthly,
            phases: vec![PhaseVolumes {
                phase: Phase::Gas,
                forecast_output_id: "fo-1".to_string(),
                series: Vec::new(),
                ratio: Some(RatioVolumes {
                    eur: Some(12.5),
                    base_phase: Phase::Oil,
                    start_date: date(2024, 1, 15),
                    end_date: date(2024, 3, 15),
                    volumes: vec![1.0, 2.0, 3.0],
                }),
            }],
        };

        let json = serde_json::to_value(to_api_forecast_volumes(&volumes)).unwrap();
        assert_eq!(json["resolution"], "monthly");
        let phase = &json["phases"][0];
        assert_eq!(phase["phase"], "gas");
        assert_eq!(phase["forecastOutputId"], "fo-1");
        assert_eq!(phase["ratio"]["basePhase"], "oil");
        assert_eq!(phase["ratio"]["startDate"], "2024-01-15");
        assert_eq!(phase["ratio"]["endDate"], "2024-03-15");
    }

    #[test]
    fn test_series_without_ratio() {
        let phase = PhaseVolumes {
            phase: Phase::Oil,
            forecast_output_id: "fo-2".to_string(),
            series: vec![SeriesVolumes {
                eur: None,
                series: Series::P50,
                start_date: date(2023, 12, 31),
                end_date: date(2024, 1, 1),
                volumes: vec![5.0, 5.0],
            }],
            ratio: None,
        };

        let json = serde_json::to_value(ApiPhaseVolumes::from(&phase)).unwrap();
        assert!(json.get("ratio").is_none());
        assert_eq!(json["series"][0]["series"], "P50");
        assert_eq!(json["series"][0]["startDate"], "2023-12-31");
        assert!(json["series"][0]["eur"].is_null());
    }
}
