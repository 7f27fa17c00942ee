//! Decline-curve segment definitions.
//!
//! A segment covers an inclusive day-index range `[start_idx, end_idx]` with
//! one curve family and its parameters. Parameters are stored flat on the
//! document; which of them are meaningful depends on [`SegmentKind`].

use serde::{Deserialize, Serialize};

/// Curve family of a segment.
///
/// Unknown or missing names resolve to [`SegmentKind::Empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum SegmentKind {
    Arps,
    ArpsInc,
    ExpDec,
    ExpInc,
    Linear,
    Flat,
    ArpsModified,
    #[default]
    Empty,
}

impl SegmentKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "arps" => Self::Arps,
            "arps_inc" => Self::ArpsInc,
            "exp_dec" => Self::ExpDec,
            "exp_inc" => Self::ExpInc,
            "linear" => Self::Linear,
            "flat" => Self::Flat,
            "arps_modified" => Self::ArpsModified,
            _ => Self::Empty,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arps => "arps",
            Self::ArpsInc => "arps_inc",
            Self::ExpDec => "exp_dec",
            Self::ExpInc => "exp_inc",
            Self::Linear => "linear",
            Self::Flat => "flat",
            Self::ArpsModified => "arps_modified",
            Self::Empty => "empty",
        }
    }
}

impl From<Option<String>> for SegmentKind {
    fn from(name: Option<String>) -> Self {
        name.as_deref().map_or(Self::Empty, Self::from_name)
    }
}

impl From<SegmentKind> for &'static str {
    fn from(kind: SegmentKind) -> Self {
        kind.as_str()
    }
}

/// One decline-curve segment.
///
/// Rates are per day; declines (`D`, `D_exp`) are nominal per-day declines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub name: SegmentKind,
    pub start_idx: i64,
    pub end_idx: i64,
    #[serde(default)]
    pub q_start: f64,
    #[serde(default)]
    pub q_end: f64,
    #[serde(default, rename = "D")]
    pub d: f64,
    #[serde(default, rename = "D_eff")]
    pub d_eff: f64,
    #[serde(default)]
    pub b: f64,
    /// Linear slope (rate change per day).
    #[serde(default)]
    pub k: f64,
    /// Flat rate.
    #[serde(default)]
    pub c: f64,
    /// Switch index of a modified Arps segment.
    #[serde(default)]
    pub sw_idx: f64,
    #[serde(default)]
    pub q_sw: f64,
    #[serde(default, rename = "D_exp")]
    pub d_exp: f64,
}

impl Segment {
    /// A zero-volume segment over `[start_idx, end_idx]`.
    pub fn empty(start_idx: i64, end_idx: i64) -> Self {
        Self::with_kind(SegmentKind::Empty, start_idx, end_idx)
    }

    /// A segment of `kind` with every curve parameter zeroed.
    pub fn with_kind(kind: SegmentKind, start_idx: i64, end_idx: i64) -> Self {
        Self {
            name: kind,
            start_idx,
            end_idx,
            q_start: 0.0,
            q_end: 0.0,
            d: 0.0,
            d_eff: 0.0,
            b: 0.0,
            k: 0.0,
            c: 0.0,
            sw_idx: 0.0,
            q_sw: 0.0,
            d_exp: 0.0,
        }
    }

    /// Number of days covered, `end_idx - start_idx + 1` (zero when inverted).
    pub fn day_span(&self) -> usize {
        usize::try_from(self.end_idx - self.start_idx + 1).unwrap_or(0)
    }
}
