//! Phase & ratio volume assembly for one well.
//!
//! All series and ratio curves of a well are generated against one shared
//! window, so every emitted volume array of the well has the same length.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use super::dates::{date_to_index, index_to_date, max_index};
use super::resolution::{daily_series, resolve, DayBudget, IndexWindow};
use super::VolumeError;
use crate::grouping::WellForecastGroup;
use crate::model::{
    ForecastKind, ForecastOutput, ForecastVolumes, OutputType, Phase, PhaseVolumes,
    RatioForecast, RatioVolumes, Resolution, Segment, SeriesVolumes,
};

/// Optional explicit date filter narrowing every well's window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Role an output plays in assembly, given the forecast kind.
enum CurveRole<'a> {
    Base(&'a ForecastOutput),
    Ratio(&'a ForecastOutput, &'a RatioForecast),
}

impl<'a> CurveRole<'a> {
    fn classify(output: &'a ForecastOutput, kind: ForecastKind) -> Option<Self> {
        match kind {
            ForecastKind::Probabilistic => Some(Self::Base(output)),
            ForecastKind::Deterministic => match output.forecast_type {
                OutputType::Rate => Some(Self::Base(output)),
                OutputType::Ratio => output.ratio.as_ref().map(|r| Self::Ratio(output, r)),
                _ => None,
            },
        }
    }

    fn segment_lists(&self) -> Vec<&'a [Segment]> {
        match *self {
            Self::Base(output) => output.p_dict.values().map(|s| s.segments.as_slice()).collect(),
            Self::Ratio(_, ratio) => vec![ratio.segments.as_slice()],
        }
    }
}

/// Smallest window covering every segment, ignoring non-positive placeholder
/// indices of curves that have not started. Indices past the last calendar
/// date are clamped to it.
pub fn natural_window<'a>(lists: impl IntoIterator<Item = &'a [Segment]>) -> Option<IndexWindow> {
    let mut start: Option<i64> = None;
    let mut end: Option<i64> = None;

    for segment in lists.into_iter().flatten() {
        if segment.start_idx > 0 {
            start = Some(start.map_or(segment.start_idx, |s| s.min(segment.start_idx)));
        }
        if segment.end_idx > 0 {
            end = Some(end.map_or(segment.end_idx, |e| e.max(segment.end_idx)));
        }
    }

    let last = max_index();
    match (start, end) {
        (Some(start), Some(end)) if start <= end && start <= last => {
            Some(IndexWindow::new(start, end.min(last)))
        }
        _ => None,
    }
}

/// Intersect the natural window with the requested date range.
pub fn resolve_window(
    well: &str,
    natural: IndexWindow,
    range: &DateRange,
) -> Result<IndexWindow, VolumeError> {
    if let (Some(start_date), Some(end_date)) = (range.start_date, range.end_date) {
        if start_date > end_date {
            return Err(VolumeError::StartDateAfterEndDate { start_date, end_date });
        }
    }

    let start = range
        .start_date
        .map_or(natural.start, |d| date_to_index(d).max(natural.start));
    let end = range
        .end_date
        .map_or(natural.end, |d| date_to_index(d).min(natural.end));
    if start <= end {
        return Ok(IndexWindow::new(start, end));
    }

    let end_before_first = |end_date: NaiveDate| VolumeError::EndDateBeforeFirstSegment {
        well: well.to_string(),
        end_date,
        first_segment: index_to_date(natural.start),
    };
    let start_after_last = |start_date: NaiveDate| VolumeError::StartDateAfterLastSegment {
        well: well.to_string(),
        start_date,
        last_segment: index_to_date(natural.end),
    };

    match (range.start_date, range.end_date) {
        (None, Some(end_date)) => Err(end_before_first(end_date)),
        (Some(start_date), None) => Err(start_after_last(start_date)),
        (Some(start_date), Some(end_date)) => {
            if date_to_index(end_date) < natural.start {
                Err(end_before_first(end_date))
            } else {
                Err(start_after_last(start_date))
            }
        }
        (None, None) => Ok(natural),
    }
}

/// Build the volumes of one well.
///
/// Base phases come first so ratio phases can look up their base phase's
/// first series. A ratio whose base phase is missing or has no series is
/// dropped.
pub fn assemble_well(
    group: &WellForecastGroup,
    kind: ForecastKind,
    range: &DateRange,
    resolution: Resolution,
    daily_year_limit: f64,
) -> Result<ForecastVolumes, VolumeError> {
    let mut volumes = ForecastVolumes {
        project: group.project.clone(),
        forecast: group.forecast.clone(),
        well: group.well.clone(),
        resolution,
        phases: Vec::new(),
    };

    let roles: Vec<CurveRole<'_>> = group
        .outputs
        .iter()
        .filter_map(|o| CurveRole::classify(o, kind))
        .collect();

    let Some(natural) = natural_window(roles.iter().flat_map(CurveRole::segment_lists)) else {
        debug!(well = %group.well, "No forecast segments, emitting well without phases");
        return Ok(volumes);
    };
    let window = resolve_window(&group.well, natural, range)?;
    let budget = DayBudget::for_resolution(resolution, daily_year_limit);

    let mut phases: BTreeMap<Phase, PhaseVolumes> = BTreeMap::new();
    let mut base_daily: BTreeMap<Phase, Vec<f64>> = BTreeMap::new();

    for role in &roles {
        let CurveRole::Base(output) = role else { continue };

        let mut series = Vec::new();
        for (name, forecast) in &output.p_dict {
            if forecast.segments.is_empty() {
                continue;
            }
            let daily = daily_series(&forecast.segments, window, budget);
            base_daily.entry(output.phase).or_insert_with(|| daily.clone());

            let resolved = resolve(daily, window.start, resolution);
            series.push(SeriesVolumes {
                eur: forecast.eur,
                series: *name,
                start_date: resolved.start_date,
                end_date: resolved.end_date,
                volumes: resolved.volumes,
            });
        }

        phases.insert(
            output.phase,
            PhaseVolumes {
                phase: output.phase,
                forecast_output_id: output.id.clone(),
                series,
                ratio: None,
            },
        );
    }

    for role in &roles {
        let CurveRole::Ratio(output, ratio) = role else { continue };

        let Some(base) = base_daily.get(&ratio.base_phase) else {
            debug!(
                well = %group.well,
                phase = %output.phase,
                base_phase = %ratio.base_phase,
                "Base phase has no volumes, dropping ratio phase"
            );
            continue;
        };

        let own = daily_series(&ratio.segments, window, budget);
        let daily: Vec<f64> = own.iter().zip(base).map(|(r, b)| r * b).collect();
        let resolved = resolve(daily, window.start, resolution);

        phases.insert(
            output.phase,
            PhaseVolumes {
                phase: output.phase,
                forecast_output_id: output.id.clone(),
                series: Vec::new(),
                ratio: Some(RatioVolumes {
                    eur: ratio.eur,
                    base_phase: ratio.base_phase,
                    start_date: resolved.start_date,
                    end_date: resolved.end_date,
                    volumes: resolved.volumes,
                }),
            },
        );
    }

    volumes.phases = phases.into_values().collect();
    Ok(volumes)
}
