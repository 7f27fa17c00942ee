//! Forecast and forecast output documents.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::segment::Segment;

// ============================================================================
// Enumerations
// ============================================================================

/// Produced fluid phase. Ordering is the order phases are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Oil,
    Gas,
    Water,
}

impl Phase {
    pub const ALL: [Self; 3] = [Self::Oil, Self::Gas, Self::Water];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oil => "oil",
            Self::Gas => "gas",
            Self::Water => "water",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named probabilistic scenario inside a `P_dict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Series {
    #[serde(rename = "best")]
    Best,
    P10,
    P50,
    P90,
}

impl Series {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::P10 => "P10",
            Self::P50 => "P50",
            Self::P90 => "P90",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecast flavour. Decides which outputs take part in volume assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastKind {
    Probabilistic,
    Deterministic,
}

/// How a forecast output was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Rate,
    Ratio,
    #[default]
    NotForecasted,
    Typecurve,
    #[serde(other)]
    Other,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rate => "rate",
            Self::Ratio => "ratio",
            Self::NotForecasted => "not_forecasted",
            Self::Typecurve => "typecurve",
            Self::Other => "other",
        }
    }

    /// Parse a filter value. `other` is not a selectable type.
    pub fn parse(value: &str) -> Option<Self> {
        [Self::Rate, Self::Ratio, Self::NotForecasted, Self::Typecurve]
            .into_iter()
            .find(|t| t.as_str() == value)
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A forecast: a named set of wells with one forecast kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub id: String,
    pub project: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ForecastKind,
    #[serde(default)]
    pub wells: Vec<String>,
}

/// Segments and EUR of one P-series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesForecast {
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub eur: Option<f64>,
}

/// A ratio curve applied on top of another phase's volumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioForecast {
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub eur: Option<f64>,
    pub base_phase: Phase,
}

/// Forecast result for one (well, phase) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastOutput {
    pub id: String,
    pub project: String,
    pub forecast: String,
    pub well: String,
    pub phase: Phase,
    #[serde(default)]
    pub forecast_type: OutputType,
    #[serde(rename = "P_dict", default)]
    pub p_dict: BTreeMap<Series, SeriesForecast>,
    #[serde(default)]
    pub ratio: Option<RatioForecast>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_document_deserializes() {
        let json = r#"{
            "id": "fo-1",
            "project": "p1",
            "forecast": "f1",
            "well": "w1",
            "phase": "oil",
            "forecastType": "rate",
            "P_dict": {
                "best": {"segments": [{"name": "flat", "start_idx": 10, "end_idx": 20, "c": 5.0}], "eur": 55.0},
                "P90": {"segments": [], "eur": null}
            }
        }"#;
        let output: ForecastOutput = serde_json::from_str(json).unwrap();
        assert_eq!(output.phase, Phase::Oil);
        assert_eq!(output.forecast_type, OutputType::Rate);
        assert_eq!(output.p_dict.len(), 2);
        assert_eq!(output.p_dict[&Series::Best].segments.len(), 1);
        assert!(output.ratio.is_none());
    }

    #[test]
    fn test_series_order_is_best_first() {
        let mut series = vec![Series::P90, Series::P10, Series::Best, Series::P50];
        series.sort();
        assert_eq!(series, vec![Series::Best, Series::P10, Series::P50, Series::P90]);
    }

    #[test]
    fn test_unknown_output_type_maps_to_other() {
        let t: OutputType = serde_json::from_str("\"proximity\"").unwrap();
        assert_eq!(t, OutputType::Other);
        assert_eq!(OutputType::parse("other"), None);
        assert_eq!(OutputType::parse("ratio"), Some(OutputType::Ratio));
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!(Phase::parse("gas"), Some(Phase::Gas));
        assert_eq!(Phase::parse("Gas"), None);
    }
}
