//! Greedy single-pass peak finder used to split a channel into cycles.
//!
//! Tolerances are fixed: the threshold sits at half the normalised maximum,
//! the apex search looks 100 ms past the crossing, and accepted peaks are at
//! least 300 ms apart regardless of the true cycle length.

/// Guards the z-score against a zero standard deviation.
pub const NORMALIZE_EPSILON: f64 = 1e-8;
/// Fraction of the normalised maximum a sample must exceed.
pub const THRESHOLD_RATIO: f64 = 0.5;
/// Refractory period in seconds.
pub const REFRACTORY_SECS: f64 = 0.3;
/// Apex search window in seconds.
pub const APEX_SEARCH_SECS: f64 = 0.1;

/// Indices of detected cycle peaks, strictly increasing.
pub type CyclePeaks = Vec<usize>;

/// Locate cycle peaks in one channel.
///
/// Consecutive peaks are at least `floor(0.3 * sample_rate_hz)` samples apart.
/// Constant or non-finite input yields no peaks.
pub fn detect_peaks(samples: &[f64], sample_rate_hz: u32) -> CyclePeaks {
    let z = normalize(samples);
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Vec::new();
    }
    let threshold = THRESHOLD_RATIO * max;
    let min_distance = (REFRACTORY_SECS * sample_rate_hz as f64).floor() as usize;
    let search = (APEX_SEARCH_SECS * sample_rate_hz as f64).floor() as usize;

    let mut peaks = Vec::new();
    let mut i = 0;
    while i < z.len() {
        if z[i] > threshold {
            let end = (i + search).min(z.len());
            let mut apex = i;
            for j in i + 1..end {
                if z[j] > z[apex] {
                    apex = j;
                }
            }
            peaks.push(apex);
            // Always move forward, even when the refractory period rounds to zero.
            i = (apex + min_distance).max(i + 1);
        } else {
            i += 1;
        }
    }
    peaks
}

fn normalize(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let scale = variance.sqrt() + NORMALIZE_EPSILON;
    samples.iter().map(|v| (v - mean) / scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spikes(len: usize, every: usize, offset: usize) -> Vec<f64> {
        (0..len)
            .map(|i| if i >= offset && (i - offset) % every == 0 { 1.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn constant_signal_has_no_peaks() {
        assert!(detect_peaks(&vec![3.5; 500], 250).is_empty());
        assert!(detect_peaks(&[], 250).is_empty());
    }

    #[test]
    fn finds_regular_spikes() {
        let signal = spikes(1000, 200, 50);
        assert_eq!(detect_peaks(&signal, 250), vec![50, 250, 450, 650, 850]);
    }

    #[test]
    fn refractory_period_drops_close_spikes() {
        // Spikes 40 samples apart at 250 Hz fall inside the 75-sample refractory period.
        let signal = spikes(400, 40, 0);
        let peaks = detect_peaks(&signal, 250);
        assert!(peaks.windows(2).all(|w| w[1] - w[0] >= 75));
        assert_eq!(peaks, vec![0, 80, 160, 240, 320]);
    }

    #[test]
    fn moves_from_rising_edge_to_apex() {
        let mut signal = vec![0.0; 300];
        signal[100] = 0.8;
        signal[101] = 0.9;
        signal[103] = 1.0;
        signal[104] = 0.2;
        assert_eq!(detect_peaks(&signal, 100), vec![103]);
    }

    #[test]
    fn terminates_at_tiny_sample_rates() {
        let signal = spikes(20, 2, 0);
        let peaks = detect_peaks(&signal, 2);
        assert!(peaks.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(peaks.len(), 10);
    }

    #[test]
    fn nan_input_yields_nothing() {
        assert!(detect_peaks(&[1.0, f64::NAN, 2.0], 100).is_empty());
    }
}
