//! Segment volume strategies.
//!
//! Each curve family maps a segment to one volume per day of its range. The
//! volume of day `t` (days since `start_idx`) is the rate integrated over
//! `[t, t + 1]`, computed as the difference of closed-form cumulatives so
//! that summing a segment's days reproduces its cumulative production.

use crate::model::{Segment, SegmentKind};

/// Below this magnitude a decline or exponent is treated as zero.
const EPS: f64 = 1e-10;

/// Daily volumes over the whole segment, `day_span()` values long.
pub fn daily_volumes(segment: &Segment) -> Vec<f64> {
    daily_volumes_between(segment, segment.start_idx, segment.end_idx)
}

/// Daily volumes for the indices `[from, to]` of `segment`.
///
/// The range is clipped to the segment; an empty range yields an empty vec.
pub fn daily_volumes_between(segment: &Segment, from: i64, to: i64) -> Vec<f64> {
    let from = from.max(segment.start_idx);
    let to = to.min(segment.end_idx);
    let len = usize::try_from(to - from + 1).unwrap_or(0);

    if segment.name == SegmentKind::Empty {
        return vec![0.0; len];
    }

    let offset = (from - segment.start_idx) as f64;
    (0..len)
        .map(|i| {
            let t = offset + i as f64;
            let v = cumulative(segment, t + 1.0) - cumulative(segment, t);
            if v.is_finite() && v > 0.0 {
                v
            } else {
                0.0
            }
        })
        .collect()
}

/// Cumulative volume from the segment start to `t` days in.
fn cumulative(segment: &Segment, t: f64) -> f64 {
    match segment.name {
        SegmentKind::Arps | SegmentKind::ArpsInc => {
            hyperbolic_cum(segment.q_start, segment.d, segment.b, t)
        }
        SegmentKind::ExpDec | SegmentKind::ExpInc => exponential_cum(segment.q_start, segment.d, t),
        SegmentKind::Linear => linear_cum(segment.q_start, segment.k, t),
        SegmentKind::Flat => flat_rate(segment) * t,
        SegmentKind::ArpsModified => modified_arps_cum(segment, t),
        SegmentKind::Empty => 0.0,
    }
}

fn flat_rate(segment: &Segment) -> f64 {
    if segment.c.abs() > EPS {
        segment.c
    } else {
        segment.q_start
    }
}

fn exponential_cum(q0: f64, d: f64, t: f64) -> f64 {
    if d.abs() < EPS {
        q0 * t
    } else {
        q0 / d * (1.0 - (-d * t).exp())
    }
}

fn hyperbolic_rate(q0: f64, d: f64, b: f64, t: f64) -> f64 {
    if b.abs() < EPS {
        q0 * (-d * t).exp()
    } else {
        q0 * (1.0 + b * d * t).powf(-1.0 / b)
    }
}

fn hyperbolic_cum(q0: f64, d: f64, b: f64, t: f64) -> f64 {
    if b.abs() < EPS {
        return exponential_cum(q0, d, t);
    }
    if d.abs() < EPS {
        return q0 * t;
    }
    if (b - 1.0).abs() < EPS {
        // harmonic
        return q0 / d * (1.0 + d * t).ln();
    }
    let base = 1.0 + b * d * t;
    q0 / ((1.0 - b) * d) * (1.0 - base.powf((b - 1.0) / b))
}

/// Rate clamped at zero once a negative slope drives it down.
fn linear_cum(q0: f64, k: f64, t: f64) -> f64 {
    let t = if k < 0.0 { t.min((-q0 / k).max(0.0)) } else { t };
    q0 * t + 0.5 * k * t * t
}

/// Hyperbolic decline until the switch point, exponential afterwards.
fn modified_arps_cum(segment: &Segment, t: f64) -> f64 {
    let (q0, d, b) = (segment.q_start, segment.d, segment.b);
    let sw = (segment.sw_idx - segment.start_idx as f64).max(0.0);
    if t <= sw {
        return hyperbolic_cum(q0, d, b, t);
    }

    let q_sw = if segment.q_sw > 0.0 {
        segment.q_sw
    } else {
        hyperbolic_rate(q0, d, b, sw)
    };
    // Continuous decline at the switch unless a terminal decline is stored.
    let d_exp = if segment.d_exp.abs() > EPS {
        segment.d_exp
    } else {
        d / (1.0 + b * d * sw)
    };
    hyperbolic_cum(q0, d, b, sw) + exponential_cum(q_sw, d_exp, t - sw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(kind: SegmentKind, start: i64, end: i64) -> Segment {
        Segment::with_kind(kind, start, end)
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    #[test]
    fn test_empty_yields_zeros_of_span() {
        let v = daily_volumes(&Segment::empty(100, 129));
        assert_eq!(v.len(), 30);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_every_kind_covers_the_segment_span() {
        let kinds = [
            SegmentKind::Arps,
            SegmentKind::ArpsInc,
            SegmentKind::ExpDec,
            SegmentKind::ExpInc,
            SegmentKind::Linear,
            SegmentKind::Flat,
            SegmentKind::ArpsModified,
            SegmentKind::Empty,
        ];
        for kind in kinds {
            let mut s = seg(kind, 44_000, 44_364);
            s.q_start = 120.0;
            s.d = 0.002;
            s.b = 0.8;
            s.k = -0.1;
            s.c = 50.0;
            s.sw_idx = 44_200.0;
            assert_eq!(daily_volumes(&s).len(), 365, "{kind:?}");
        }
    }

    #[test]
    fn test_flat_is_constant() {
        let mut s = seg(SegmentKind::Flat, 0, 9);
        s.c = 12.5;
        assert!(daily_volumes(&s).iter().all(|v| close(*v, 12.5, 1e-12)));
    }

    #[test]
    fn test_flat_without_c_uses_q_start() {
        let mut s = seg(SegmentKind::Flat, 0, 4);
        s.q_start = 3.0;
        assert!(daily_volumes(&s).iter().all(|v| close(*v, 3.0, 1e-12)));
    }

    #[test]
    fn test_exponential_sum_matches_closed_form() {
        let mut s = seg(SegmentKind::ExpDec, 0, 999);
        s.q_start = 1000.0;
        s.d = 0.001;
        let total: f64 = daily_volumes(&s).iter().sum();
        let expected = 1000.0 / 0.001 * (1.0 - (-0.001_f64 * 1000.0).exp());
        assert!(close(total, expected, 1e-9));
    }

    #[test]
    fn test_exponential_incline_grows() {
        let mut s = seg(SegmentKind::ExpInc, 0, 30);
        s.q_start = 10.0;
        s.d = -0.01;
        let v = daily_volumes(&s);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_harmonic_sum_matches_log_integral() {
        let mut s = seg(SegmentKind::Arps, 0, 364);
        s.q_start = 500.0;
        s.d = 0.01;
        s.b = 1.0;
        let total: f64 = daily_volumes(&s).iter().sum();
        let expected = 500.0 / 0.01 * (1.0 + 0.01_f64 * 365.0).ln();
        assert!(close(total, expected, 1e-9));
    }

    #[test]
    fn test_hyperbolic_declines_monotonically() {
        let mut s = seg(SegmentKind::Arps, 0, 730);
        s.q_start = 800.0;
        s.d = 0.005;
        s.b = 1.2;
        let v = daily_volumes(&s);
        assert!(v[0] < 800.0);
        assert!(v.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_linear_clamps_at_zero() {
        let mut s = seg(SegmentKind::Linear, 0, 19);
        s.q_start = 10.0;
        s.k = -1.0;
        let v = daily_volumes(&s);
        assert!(close(v[0], 9.5, 1e-12));
        assert!(v[10..].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_modified_arps_is_continuous_at_switch() {
        let mut s = seg(SegmentKind::ArpsModified, 0, 400);
        s.q_start = 300.0;
        s.d = 0.01;
        s.b = 1.5;
        s.sw_idx = 200.0;
        let v = daily_volumes(&s);
        let jump = (v[200] - v[199]).abs();
        let step = (v[199] - v[198]).abs();
        assert!(jump < step * 2.0);
        assert!(v[201..].windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_between_clips_to_segment() {
        let mut s = seg(SegmentKind::Flat, 10, 19);
        s.c = 1.0;
        assert_eq!(daily_volumes_between(&s, 5, 12).len(), 3);
        assert_eq!(daily_volumes_between(&s, 18, 40).len(), 2);
        assert!(daily_volumes_between(&s, 20, 40).is_empty());
    }

    #[test]
    fn test_strategies_are_deterministic() {
        let mut s = seg(SegmentKind::Arps, 100, 500);
        s.q_start = 250.0;
        s.d = 0.003;
        s.b = 0.5;
        assert_eq!(daily_volumes(&s), daily_volumes(&s));
    }
}
