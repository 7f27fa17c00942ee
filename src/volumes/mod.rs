//! Forecast Volume Computation Engine
//!
//! Turns stored decline-curve segments into aligned per-well volume series.
//!
//! ## Layers
//!
//! - **segments**: curve-family strategies, segment → daily volumes
//! - **dates**: day-index ↔ calendar date, month boundaries
//! - **resolution**: windowed daily generation, year-limit budget, monthly roll-up
//! - **assembler**: well window, base series, ratio phases

pub mod assembler;
pub mod dates;
pub mod resolution;
pub mod segments;

pub use assembler::{assemble_well, DateRange};
pub use resolution::{DayBudget, IndexWindow};

use chrono::NaiveDate;

/// Errors raised while assembling a well's volumes.
///
/// Window variants name the query parameters that caused them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VolumeError {
    #[error("endDate {end_date} is before the first forecast segment of well {well}, which starts {first_segment}")]
    EndDateBeforeFirstSegment {
        well: String,
        end_date: NaiveDate,
        first_segment: NaiveDate,
    },
    #[error("startDate {start_date} is after the last forecast segment of well {well}, which ends {last_segment}")]
    StartDateAfterLastSegment {
        well: String,
        start_date: NaiveDate,
        last_segment: NaiveDate,
    },
    #[error("startDate {start_date} is after endDate {end_date}")]
    StartDateAfterEndDate {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    #[error("volume computation cancelled")]
    Cancelled,
}

impl VolumeError {
    /// Query parameters the error refers to.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::EndDateBeforeFirstSegment { .. } => &["endDate"],
            Self::StartDateAfterLastSegment { .. } => &["startDate"],
            Self::StartDateAfterEndDate { .. } => &["startDate", "endDate"],
            Self::Cancelled => &[],
        }
    }
}
