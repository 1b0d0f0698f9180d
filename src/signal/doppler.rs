//! Doppler shift effects on mono audio.

use crate::signal::{linspace, ViewerError};

pub const SPEED_OF_SOUND: f64 = 343.0;
const EPS: f64 = 1e-8;

/// Frequency heard by a stationary observer from a source moving at `velocity` (m/s, approaching positive).
pub fn observed_frequency(f_source: f64, velocity: f64) -> f64 {
    f_source * (SPEED_OF_SOUND / (SPEED_OF_SOUND - velocity + EPS))
}

/// Time-warp `samples` for a source whose speed ramps linearly from `v_start` to `v_end`.
///
/// The output has the same length and is peak-normalised.
pub fn apply_doppler(samples: &[f64], v_start: f64, v_end: f64) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let velocity = linspace(v_start, v_end, n);
    let mut warped = Vec::with_capacity(n);
    let mut acc = 0.0;
    for v in velocity {
        acc += SPEED_OF_SOUND / (SPEED_OF_SOUND - v + EPS);
        warped.push(acc);
    }
    let (first, last) = (warped[0], warped[n - 1]);
    let positions: Vec<f64> = if last - first == 0.0 {
        linspace(0.0, (n - 1) as f64, n)
    } else {
        warped
            .iter()
            .map(|w| (w - first) / (last - first) * (n - 1) as f64)
            .collect()
    };
    let shifted: Vec<f64> = positions.iter().map(|&p| interpolate(samples, p)).collect();
    normalize_peak(shifted)
}

pub fn linear_envelope(len: usize, start_level: f64, end_level: f64) -> Vec<f64> {
    linspace(start_level, end_level, len)
}

/// Approaching sources swell, receding ones fade.
pub fn approach_envelope(len: usize, v_start: f64, v_end: f64) -> Vec<f64> {
    if v_end > v_start {
        linear_envelope(len, 0.2, 1.0)
    } else {
        linear_envelope(len, 1.0, 0.2)
    }
}

pub fn apply_envelope(samples: &mut [f64], envelope: &[f64]) {
    for (s, e) in samples.iter_mut().zip(envelope) {
        *s *= e;
    }
}

/// Doppler plus approach envelope over the whole clip.
pub fn doppler_clip(samples: &[f64], v_start: f64, v_end: f64) -> Vec<f64> {
    let mut out = apply_doppler(samples, v_start, v_end);
    let envelope = approach_envelope(out.len(), v_start, v_end);
    apply_envelope(&mut out, &envelope);
    out
}

/// Receding speed range used after the source passes the observer.
pub fn recede_speeds(v_end: f64) -> (f64, f64) {
    let start = v_end.abs();
    (start, start + 5.0)
}

/// A car passing by: the first half approaches, the second half recedes.
pub fn simulate_passing(samples: &[f64], v_start: f64, v_end: f64) -> Result<Vec<f64>, ViewerError> {
    if samples.is_empty() {
        return Err(ViewerError::invalid("samples", "audio has no samples"));
    }
    let mid = samples.len() / 2;
    let mut approach = doppler_clip(&samples[..mid], v_start, v_end);

    let (rec_start, rec_end) = recede_speeds(v_end);
    let mut recede = apply_doppler(&samples[mid..], rec_start, rec_end);
    let fade = linear_envelope(recede.len(), 1.0, 0.12);
    apply_envelope(&mut recede, &fade);

    approach.extend(recede);
    Ok(normalize_peak(approach))
}

fn interpolate(samples: &[f64], position: f64) -> f64 {
    let last = samples.len() - 1;
    if position <= 0.0 {
        return samples[0];
    }
    if position >= last as f64 {
        return samples[last];
    }
    let lo = position.floor() as usize;
    let frac = position - lo as f64;
    samples[lo] + (samples[lo + 1] - samples[lo]) * frac
}

fn normalize_peak(mut samples: Vec<f64>) -> Vec<f64> {
    let peak = samples.iter().fold(0.0f64, |acc, v| acc.max(v.abs())) + EPS;
    samples.iter_mut().for_each(|v| *v /= peak);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stationary_source_keeps_shape() {
        let tone = vec![0.0, 0.5, 1.0, 0.5, 0.0, -0.5];
        let out = apply_doppler(&tone, 0.0, 0.0);
        for (a, b) in tone.iter().zip(&out) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn approaching_source_raises_pitch() {
        assert!(observed_frequency(440.0, 30.0) > 440.0);
        assert!(observed_frequency(440.0, -30.0) < 440.0);
    }

    #[test]
    fn envelope_direction_follows_speed() {
        let close = |a: &[f64], b: &[f64]| a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12);
        assert!(close(&approach_envelope(3, 0.0, 10.0), &[0.2, 0.6, 1.0]));
        assert!(close(&approach_envelope(3, 10.0, 0.0), &[1.0, 0.6, 0.2]));
    }

    #[test]
    fn passing_keeps_length_and_rejects_silence() {
        let samples: Vec<f64> = (0..101).map(|i| (i as f64 * 0.3).sin()).collect();
        let out = simulate_passing(&samples, 5.0, 20.0).unwrap();
        assert_eq!(out.len(), samples.len());
        assert!(out.iter().all(|v| v.abs() <= 1.0));
        assert!(simulate_passing(&[], 5.0, 20.0).is_err());
    }
}
