use log::warn;
use serde::{Deserialize, Serialize};

use crate::signal::{detect_peaks, SignalBuffer, ViewerError};
use crate::view::{Coordinates, TraceSet, ViewContext};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarMode {
    /// One revolution over the current zoom window, radius `|x|`.
    #[default]
    Fixed,
    /// One revolution over everything from the origin to `position + zoom`.
    Cumulative,
    /// One revolution per detected cycle, radius `x` (ECG only).
    Cycles,
}

pub fn polar(ctx: &ViewContext<'_>, zoom_secs: f64, mode: PolarMode) -> TraceSet {
    if ctx.buffer.is_empty() {
        return TraceSet::new();
    }
    match mode {
        PolarMode::Fixed => polar_fixed(ctx, zoom_secs),
        PolarMode::Cumulative => polar_cumulative(ctx, zoom_secs),
        PolarMode::Cycles => or_fixed(ctx, zoom_secs, polar_cycles(ctx, zoom_secs)),
    }
}

fn or_fixed(ctx: &ViewContext<'_>, zoom_secs: f64, cycles: Result<TraceSet, ViewerError>) -> TraceSet {
    cycles.unwrap_or_else(|err| {
        warn!("polar cycles failed ({err}), falling back to fixed mode");
        polar_fixed(ctx, zoom_secs)
    })
}

fn zoom_window_samples(buffer: &SignalBuffer, zoom_secs: f64) -> i64 {
    buffer.samples_for(zoom_secs).max(1)
}

pub fn polar_fixed(ctx: &ViewContext<'_>, zoom_secs: f64) -> TraceSet {
    let buffer = ctx.buffer;
    let start = buffer.start_index(ctx.position_secs);
    revolution_traces(ctx, start, zoom_window_samples(buffer, zoom_secs))
}

pub fn polar_cumulative(ctx: &ViewContext<'_>, zoom_secs: f64) -> TraceSet {
    let length = ctx.buffer.samples_for(ctx.position_secs + zoom_secs).max(1);
    revolution_traces(ctx, 0, length)
}

fn revolution_traces(ctx: &ViewContext<'_>, start: i64, length: i64) -> TraceSet {
    let window = ctx.buffer.slice(start, length);
    ctx.valid_channels()
        .filter_map(|(slot, ch)| {
            let segment = window.channel(ch)?;
            let coords = Coordinates::Polar {
                r: segment.iter().map(|v| v.abs()).collect(),
                theta: revolution(0.0, segment.len()),
            };
            Some(ctx.trace(slot, ch, coords))
        })
        .collect()
}

/// Fold each beat-to-beat interval onto its own 360 degree turn.
///
/// Angles keep growing across cycles. A channel with fewer than two peaks is
/// drawn as a single turn with signed radius.
pub fn polar_cycles(ctx: &ViewContext<'_>, zoom_secs: f64) -> Result<TraceSet, ViewerError> {
    let buffer = ctx.buffer;
    if buffer.is_empty() {
        return Ok(TraceSet::new());
    }
    let start = buffer.start_index(ctx.position_secs);
    let window = buffer.slice(start, zoom_window_samples(buffer, zoom_secs));

    let mut traces = TraceSet::new();
    for (slot, ch) in ctx.valid_channels() {
        let Some(segment) = window.channel(ch) else {
            continue;
        };
        let peaks = detect_peaks(segment, buffer.sample_rate_hz());
        let (r, theta) = if peaks.len() < 2 {
            (segment.to_vec(), revolution(0.0, segment.len()))
        } else {
            unroll_cycles(segment, &peaks)?
        };
        traces.push(ctx.trace(slot, ch, Coordinates::Polar { r, theta }));
    }
    Ok(traces)
}

fn unroll_cycles(segment: &[f64], peaks: &[usize]) -> Result<(Vec<f64>, Vec<f64>), ViewerError> {
    let mut r = Vec::new();
    let mut theta = Vec::new();
    let mut angle = 0.0;
    for pair in peaks.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if to > segment.len() || from > to {
            return Err(ViewerError::PeakOutOfRange {
                index: to,
                len: segment.len(),
            });
        }
        let cycle = &segment[from..to];
        r.extend_from_slice(cycle);
        theta.extend(revolution(angle, cycle.len()));
        angle += 360.0;
    }
    Ok((r, theta))
}

/// `len` angles from `start` up to, not including, `start + 360`.
fn revolution(start: f64, len: usize) -> Vec<f64> {
    let step = if len == 0 { 0.0 } else { 360.0 / len as f64 };
    (0..len).map(|k| start + k as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Palette;

    fn polar_parts(traces: &TraceSet, index: usize) -> (&Vec<f64>, &Vec<f64>) {
        match &traces[index].coords {
            Coordinates::Polar { r, theta } => (r, theta),
            Coordinates::Cartesian { .. } => panic!("expected polar trace"),
        }
    }

    #[test]
    fn fixed_mode_uses_absolute_radius() {
        let buffer = SignalBuffer::new(vec![vec![1.0, -2.0, 3.0, -4.0]], 4).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[0], &palette);
        let traces = polar(&ctx, 1.0, PolarMode::Fixed);
        let (r, theta) = polar_parts(&traces, 0);
        assert_eq!(r, &vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(theta, &vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn cumulative_mode_grows_from_origin() {
        let buffer = SignalBuffer::new(vec![(0..10).map(|i| i as f64).collect()], 2).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 2.0, &[0], &palette);
        let traces = polar(&ctx, 1.0, PolarMode::Cumulative);
        let (r, _) = polar_parts(&traces, 0);
        assert_eq!(r, &vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        let later = ViewContext::new(&buffer, 6.0, &[0], &palette);
        let traces = polar(&later, 1.0, PolarMode::Cumulative);
        // 14 samples wrap past the 10-sample buffer
        assert_eq!(polar_parts(&traces, 0).0.len(), 14);
    }

    #[test]
    fn cycles_turn_once_per_beat() {
        let mut beat = vec![0.0; 100];
        beat[10] = 1.0;
        let samples = beat.repeat(4);
        let buffer = SignalBuffer::new(vec![samples], 100).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[0], &palette);
        let traces = polar(&ctx, 4.0, PolarMode::Cycles);
        let (r, theta) = polar_parts(&traces, 0);
        // peaks at 10, 110, 210, 310 -> three cycles of 100 samples
        assert_eq!(r.len(), 300);
        assert_eq!(theta[0], 0.0);
        assert_eq!(theta[100], 360.0);
        assert_eq!(theta[200], 720.0);
        assert!(theta.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(r[0], 1.0);
    }

    #[test]
    fn cycles_without_two_peaks_match_fixed_for_positive_signal() {
        let buffer = SignalBuffer::new(vec![vec![2.0; 50]], 100).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.1, &[0], &palette);
        let cycles = polar(&ctx, 0.3, PolarMode::Cycles);
        let fixed = polar(&ctx, 0.3, PolarMode::Fixed);
        assert_eq!(cycles, fixed);
    }

    #[test]
    fn cycles_fallback_keeps_sign() {
        let buffer = SignalBuffer::new(vec![vec![-1.0, 1.0, -1.0, 1.0]], 100).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[0], &palette);
        let traces = polar_cycles(&ctx, 0.04).unwrap();
        let (r, theta) = polar_parts(&traces, 0);
        // a single peak is found, so the whole window becomes one signed turn
        assert_eq!(r, &vec![-1.0, 1.0, -1.0, 1.0]);
        assert_eq!(theta, &vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn out_of_range_peaks_are_reported() {
        let err = unroll_cycles(&[0.0; 5], &[1, 9]).unwrap_err();
        assert!(matches!(err, ViewerError::PeakOutOfRange { index: 9, len: 5 }));
    }

    #[test]
    fn failed_cycles_fall_back_to_fixed() {
        let buffer = SignalBuffer::new(vec![vec![1.0, -2.0, 3.0, -4.0, 5.0]], 1).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 1.0, &[0], &palette);
        let err = unroll_cycles(&[0.0; 5], &[1, 9]).map(|_| TraceSet::new());
        let traces = or_fixed(&ctx, 3.0, err);
        assert_eq!(traces, polar_fixed(&ctx, 3.0));
        let (r, _) = polar_parts(&traces, 0);
        assert_eq!(r, &vec![2.0, 3.0, 4.0]);

        let ok = or_fixed(&ctx, 3.0, Ok(TraceSet::new()));
        assert!(ok.is_empty());
    }
}
