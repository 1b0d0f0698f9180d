use log::warn;

use crate::signal::SignalBuffer;
use crate::view::Histogram;

pub const DEFAULT_BINS: usize = 50;

/// Joint histogram of two channels over the current zoom window.
///
/// Returns `None` when either channel is missing, the buffer is empty, or the
/// window holds no finite sample pairs.
pub fn recurrence(
    buffer: &SignalBuffer,
    position_secs: f64,
    zoom_secs: f64,
    x_channel: usize,
    y_channel: usize,
    bins: usize,
) -> Option<Histogram> {
    if buffer.is_empty() || bins == 0 {
        return None;
    }
    if x_channel >= buffer.num_channels() || y_channel >= buffer.num_channels() {
        return None;
    }
    let start = buffer.start_index(position_secs);
    let length = buffer.samples_for(zoom_secs).max(1);
    let xs = buffer.slice_channel(x_channel, start, length);
    let ys = buffer.slice_channel(y_channel, start, length);
    let pairs: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.is_empty() {
        warn!("recurrence window has no finite samples");
        return None;
    }

    let x_edges = edges(pairs.iter().map(|p| p.0), bins);
    let y_edges = edges(pairs.iter().map(|p| p.1), bins);
    // z[y][x]: rows follow the y axis.
    let mut z = vec![vec![0.0; bins]; bins];
    for (x, y) in pairs {
        z[bin_of(&y_edges, y)][bin_of(&x_edges, x)] += 1.0;
    }
    Some(Histogram {
        z,
        x_edges,
        y_edges,
    })
}

fn edges(values: impl Iterator<Item = f64>, bins: usize) -> Vec<f64> {
    let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let step = (hi - lo) / bins as f64;
    (0..=bins)
        .map(|i| if i == bins { hi } else { lo + step * i as f64 })
        .collect()
}

/// Right-open bins, except the last which also takes the upper edge.
fn bin_of(edges: &[f64], value: f64) -> usize {
    let bins = edges.len() - 1;
    let upper = edges.partition_point(|e| *e <= value);
    upper.saturating_sub(1).min(bins - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_sample_once() {
        let x: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
        let y: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).cos()).collect();
        let buffer = SignalBuffer::new(vec![x, y], 100).unwrap();
        let hist = recurrence(&buffer, 0.0, 1.0, 0, 1, DEFAULT_BINS).unwrap();
        assert_eq!(hist.z.len(), 50);
        assert_eq!(hist.x_edges.len(), 51);
        let total: f64 = hist.z.iter().flatten().sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn transposed_layout_puts_y_in_rows() {
        let buffer = SignalBuffer::new(vec![vec![0.0, 1.0], vec![5.0, 5.0]], 2).unwrap();
        let hist = recurrence(&buffer, 0.0, 1.0, 0, 1, 2).unwrap();
        // constant y widens to [4.5, 5.5]; both samples land in y bin 1
        assert_eq!(hist.y_edges, vec![4.5, 5.0, 5.5]);
        assert_eq!(hist.z, vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
    }

    #[test]
    fn missing_channels_or_empty_buffer_yield_none() {
        let buffer = SignalBuffer::new(vec![vec![1.0, 2.0]], 2).unwrap();
        assert!(recurrence(&buffer, 0.0, 1.0, 0, 1, 50).is_none());
        let empty = SignalBuffer::new(vec![Vec::new(), Vec::new()], 2).unwrap();
        assert!(recurrence(&empty, 0.0, 1.0, 0, 1, 50).is_none());
        let nan = SignalBuffer::new(vec![vec![f64::NAN], vec![1.0]], 1).unwrap();
        assert!(recurrence(&nan, 0.0, 1.0, 0, 1, 50).is_none());
    }
}
