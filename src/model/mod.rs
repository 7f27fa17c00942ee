//! Forecast data model
//!
//! Stored documents (forecasts, forecast outputs, decline-curve segments) and
//! the derived volume types the engine produces from them.
//!
//! - `forecast`: forecasts, forecast outputs, phases and P-series
//! - `segment`: decline-curve segment definitions and their curve kind
//! - `volumes`: computed per-well volume results

pub mod forecast;
pub mod segment;
pub mod volumes;

pub use forecast::{
    Forecast, ForecastKind, ForecastOutput, OutputType, Phase, RatioForecast, Series,
    SeriesForecast,
};
pub use segment::{Segment, SegmentKind};
pub use volumes::{
    ForecastVolumes, PhaseVolumes, RatioVolumes, Resolution, SeriesVolumes,
};
