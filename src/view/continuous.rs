use crate::view::{Coordinates, TraceSet, ViewContext};

/// Vertical spacing between stacked channels in a shared plot.
pub const CHANNEL_OFFSET: f64 = 5.0;

/// Time-domain traces for `zoom_secs` of signal starting at the current position.
///
/// The x axis is absolute (`position + k / fs`) and each trace is lifted by
/// `slot * CHANNEL_OFFSET` so channels do not overlap.
pub fn continuous(ctx: &ViewContext<'_>, zoom_secs: f64) -> TraceSet {
    let buffer = ctx.buffer;
    if buffer.is_empty() {
        return TraceSet::new();
    }
    let window_samples = buffer.samples_for(zoom_secs).max(1);
    let window = buffer.slice(buffer.start_index(ctx.position_secs), window_samples);
    let rate = buffer.sample_rate_hz() as f64;
    let x: Vec<f64> = (0..window.len())
        .map(|k| ctx.position_secs + k as f64 / rate)
        .collect();

    ctx.valid_channels()
        .filter_map(|(slot, ch)| {
            let samples = window.channel(ch)?;
            let offset = slot as f64 * CHANNEL_OFFSET;
            let y = samples.iter().map(|v| Some(v + offset)).collect();
            Some(ctx.trace(
                slot,
                ch,
                Coordinates::Cartesian { x: x.clone(), y },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalBuffer;
    use crate::view::Palette;

    fn two_channel() -> SignalBuffer {
        SignalBuffer::new(
            vec![
                (0..10).map(|i| i as f64).collect(),
                (0..10).map(|i| -(i as f64)).collect(),
            ],
            10,
        )
        .unwrap()
    }

    #[test]
    fn stacks_channels_and_keeps_absolute_time() {
        let buffer = two_channel();
        let palette = Palette::default();
        let channels = [1, 0];
        let ctx = ViewContext::new(&buffer, 0.8, &channels, &palette);
        let traces = continuous(&ctx, 0.4);
        assert_eq!(traces.len(), 2);
        let Coordinates::Cartesian { x, y } = &traces[0].coords else {
            panic!("expected cartesian trace");
        };
        assert_eq!(x.len(), 4);
        assert!((x[0] - 0.8).abs() < 1e-12 && (x[3] - 1.1).abs() < 1e-12);
        // channel 1 in slot 0: no offset, wraps 8, 9, 0, 1
        assert_eq!(y, &vec![Some(-8.0), Some(-9.0), Some(0.0), Some(-1.0)]);
        let Coordinates::Cartesian { y, .. } = &traces[1].coords else {
            panic!("expected cartesian trace");
        };
        assert_eq!(y, &vec![Some(13.0), Some(14.0), Some(5.0), Some(6.0)]);
        assert_eq!(traces[1].color_index, 1);
        assert_eq!(traces[0].name, "Channel 2");
    }

    #[test]
    fn zero_zoom_still_yields_one_sample() {
        let buffer = two_channel();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[0], &palette);
        assert_eq!(continuous(&ctx, 0.0)[0].len(), 1);
    }

    #[test]
    fn skips_missing_channels_and_empty_buffers() {
        let buffer = two_channel();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[5, 0], &palette);
        let traces = continuous(&ctx, 0.5);
        assert_eq!(traces.len(), 1);
        // slot of the surviving channel still drives colour and offset
        assert_eq!(traces[0].color_index, 1);

        let empty = SignalBuffer::new(vec![Vec::new()], 10).unwrap();
        let ctx = ViewContext::new(&empty, 0.0, &[0], &palette);
        assert!(continuous(&ctx, 1.0).is_empty());
    }
}
