//! Stride decimation used to simulate sampling below the Nyquist rate.
//!
//! No anti-alias filter is applied; the aliasing is the point.

use log::{debug, warn};

use crate::signal::SignalBuffer;

/// Result of [`decimate`]. `effective_rate_hz` is the nominal rate the caller
/// asked for, not `original / factor`.
#[derive(Clone, Debug, PartialEq)]
pub struct Decimated {
    pub buffer: SignalBuffer,
    pub effective_rate_hz: u32,
    pub factor: usize,
}

impl Decimated {
    fn unchanged(buffer: &SignalBuffer) -> Self {
        Self {
            buffer: buffer.clone(),
            effective_rate_hz: buffer.sample_rate_hz(),
            factor: 1,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.factor == 1
    }
}

/// Keep every `floor(rate / target)`-th sample of each channel.
///
/// A missing, non-positive, or not-lower target rate returns the input
/// unchanged, as does a factor that rounds down to one.
pub fn decimate(buffer: &SignalBuffer, target_rate_hz: Option<i64>) -> Decimated {
    let original = buffer.sample_rate_hz();
    let Some(target) = target_rate_hz else {
        return Decimated::unchanged(buffer);
    };
    if target <= 0 || target >= original as i64 {
        return Decimated::unchanged(buffer);
    }
    let factor = (original as i64 / target) as usize;
    if factor <= 1 {
        return Decimated::unchanged(buffer);
    }
    let Ok(effective_rate_hz) = u32::try_from(target) else {
        warn!("decimation target {target} Hz out of range, keeping {original} Hz");
        return Decimated::unchanged(buffer);
    };
    let samples = buffer
        .samples()
        .iter()
        .map(|channel| channel.iter().step_by(factor).copied().collect())
        .collect();
    debug!(
        "decimated {} Hz -> {} Hz (factor {factor})",
        original, effective_rate_hz
    );
    Decimated {
        buffer: buffer.derive(samples, effective_rate_hz),
        effective_rate_hz,
        factor,
    }
}

/// Audio rate conversion for the downsample operation.
///
/// `new_rate <= 0` halves the rate and a rate at or above the original keeps
/// it. Output length is `floor(n * new / old)`, filled by linear
/// interpolation over the original time axis.
pub fn resample(buffer: &SignalBuffer, new_rate_hz: i64) -> SignalBuffer {
    let original = buffer.sample_rate_hz();
    let target = if new_rate_hz <= 0 {
        (original / 2).max(1)
    } else if new_rate_hz >= original as i64 {
        original
    } else {
        new_rate_hz as u32
    };
    if target == original {
        return buffer.clone();
    }
    let n = buffer.total_samples();
    let out_len = (n as u64 * target as u64 / original as u64) as usize;
    let ratio = original as f64 / target as f64;
    let samples = buffer
        .samples()
        .iter()
        .map(|channel| {
            (0..out_len)
                .map(|i| {
                    let pos = i as f64 * ratio;
                    let lo = pos.floor() as usize;
                    let hi = (lo + 1).min(n - 1);
                    let frac = pos - lo as f64;
                    channel[lo] * (1.0 - frac) + channel[hi] * frac
                })
                .collect()
        })
        .collect();
    debug!("resampled {original} Hz -> {target} Hz ({n} -> {out_len} samples)");
    buffer.derive(samples, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(len: usize, rate: u32) -> SignalBuffer {
        SignalBuffer::new(vec![(0..len).map(|i| i as f64).collect()], rate).unwrap()
    }

    #[test]
    fn noop_targets_return_input() {
        let buffer = counting(20, 100);
        for target in [None, Some(0), Some(-5), Some(100), Some(250), Some(51)] {
            let out = decimate(&buffer, target);
            assert!(out.is_noop(), "target {target:?}");
            assert_eq!(out.buffer, buffer);
            assert_eq!(out.effective_rate_hz, 100);
        }
    }

    #[test]
    fn strides_and_reports_nominal_rate() {
        let buffer = counting(10, 100);
        let out = decimate(&buffer, Some(30));
        assert_eq!(out.factor, 3);
        assert_eq!(out.effective_rate_hz, 30);
        assert_eq!(out.buffer.sample_rate_hz(), 30);
        assert_eq!(out.buffer.samples()[0], vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn keeps_lead_names() {
        let buffer = counting(8, 40).with_lead_names(vec!["II".into()]).unwrap();
        let out = decimate(&buffer, Some(10));
        assert_eq!(out.buffer.lead_names().unwrap(), ["II".to_string()]);
        assert_eq!(out.buffer.total_samples(), 2);
    }

    #[test]
    fn resample_halves_by_default_and_clamps_upward() {
        let buffer = counting(100, 100);
        let half = resample(&buffer, 0);
        assert_eq!(half.sample_rate_hz(), 50);
        assert_eq!(half.total_samples(), 50);
        assert_eq!(half.samples()[0][1], 2.0);
        assert_eq!(resample(&buffer, 400), buffer);
    }

    #[test]
    fn resample_interpolates_between_samples() {
        let buffer = counting(10, 4);
        let out = resample(&buffer, 3);
        assert_eq!(out.total_samples(), 7);
        let expected = 4.0 / 3.0;
        assert!((out.samples()[0][1] - expected).abs() < 1e-12);
    }
}
