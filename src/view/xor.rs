use crate::view::{Coordinates, TraceSet, ViewContext};

/// Compare consecutive chunks of `chunk_secs` by the sign of each sample.
///
/// Where the two chunks disagree in sign the output is `second - first`;
/// elsewhere it is a gap. The x axis is relative to the chunk start.
pub fn xor_difference(ctx: &ViewContext<'_>, chunk_secs: f64) -> TraceSet {
    let buffer = ctx.buffer;
    if buffer.is_empty() {
        return TraceSet::new();
    }
    let chunk_samples = buffer.samples_for(chunk_secs);
    let start = buffer.start_index(ctx.position_secs);
    let rate = buffer.sample_rate_hz() as f64;
    let x: Vec<f64> = (0..chunk_samples).map(|k| k as f64 / rate).collect();

    ctx.valid_channels()
        .map(|(slot, ch)| {
            let first = buffer.slice_channel(ch, start, chunk_samples);
            let second = buffer.slice_channel(ch, start.saturating_add(chunk_samples), chunk_samples);
            let y = diff_where_signs_differ(&first, &second);
            ctx.trace(slot, ch, Coordinates::Cartesian { x: x.clone(), y })
        })
        .collect()
}

fn diff_where_signs_differ(first: &[f64], second: &[f64]) -> Vec<Option<f64>> {
    first
        .iter()
        .zip(second)
        .map(|(&a, &b)| ((a > 0.0) != (b > 0.0)).then(|| b - a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalBuffer;
    use crate::view::Palette;

    fn ys(traces: &TraceSet) -> &Vec<Option<f64>> {
        match &traces[0].coords {
            Coordinates::Cartesian { y, .. } => y,
            Coordinates::Polar { .. } => panic!("expected cartesian trace"),
        }
    }

    #[test]
    fn marks_only_sign_changes() {
        let buffer = SignalBuffer::new(vec![vec![1.0, -1.0, 2.0, -3.0, 2.0, 4.0]], 3).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[0], &palette);
        let traces = xor_difference(&ctx, 1.0);
        assert_eq!(ys(&traces), &vec![Some(-4.0), Some(3.0), None]);
        let Coordinates::Cartesian { x, .. } = &traces[0].coords else {
            unreachable!()
        };
        assert_eq!(x.len(), 3);
        assert!((x[2] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn identical_chunks_are_all_gaps() {
        let period = vec![1.0, -2.0, 0.0, 3.0];
        let buffer = SignalBuffer::new(vec![period.repeat(2)], 4).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[0], &palette);
        let traces = xor_difference(&ctx, 1.0);
        assert!(ys(&traces).iter().all(Option::is_none));
        assert_eq!(ys(&traces).len(), 4);
    }

    #[test]
    fn second_chunk_wraps_to_start() {
        let buffer = SignalBuffer::new(vec![vec![1.0, 2.0, -3.0, -4.0]], 1).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 2.0, &[0], &palette);
        let traces = xor_difference(&ctx, 2.0);
        // first = [-3, -4], second wraps to [1, 2]
        assert_eq!(ys(&traces), &vec![Some(4.0), Some(6.0)]);
    }

    #[test]
    fn zero_length_chunk_gives_empty_trace() {
        let buffer = SignalBuffer::new(vec![vec![1.0; 8]], 4).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[0], &palette);
        let traces = xor_difference(&ctx, 0.1);
        assert_eq!(traces.len(), 1);
        assert!(traces[0].is_empty());
    }
}
