use serde::{Deserialize, Serialize};

use crate::signal::SignalBuffer;

/// Coordinate arrays of one trace.
///
/// Cartesian `y` uses `None` for gaps; it serialises as `null` so a line plot
/// breaks there instead of dropping to zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Coordinates {
    Cartesian { x: Vec<f64>, y: Vec<Option<f64>> },
    Polar { r: Vec<f64>, theta: Vec<f64> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trace {
    #[serde(flatten)]
    pub coords: Coordinates,
    pub name: String,
    pub color_index: usize,
    pub color: String,
}

impl Trace {
    pub fn len(&self) -> usize {
        match &self.coords {
            Coordinates::Cartesian { x, .. } => x.len(),
            Coordinates::Polar { r, .. } => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type TraceSet = Vec<Trace>;

/// 2-D histogram with `z[y_bin][x_bin]` counts and both sets of bin edges.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub z: Vec<Vec<f64>>,
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
}

/// Trace colours, assigned by position in the requested channel list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(Vec<String>);

pub const DEFAULT_PALETTE: [&str; 12] = [
    "#667eea", "#764ba2", "#f093fb", "#f5576c", "#11998e", "#38ef7d", "#4facfe", "#00f2fe",
    "#fa709a", "#fee140", "#30cfd0", "#330867",
];

impl Palette {
    pub fn new(colors: Vec<String>) -> Self {
        Self(colors)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Colour for the `slot`-th trace, cycling through the palette.
    pub fn pick(&self, slot: usize) -> (usize, String) {
        if self.0.is_empty() {
            return (0, String::new());
        }
        let index = slot % self.0.len();
        (index, self.0[index].clone())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

/// Inputs shared by every windowed transform.
#[derive(Clone, Copy, Debug)]
pub struct ViewContext<'a> {
    pub buffer: &'a SignalBuffer,
    pub position_secs: f64,
    /// Requested channel indices; negative or out-of-range entries are skipped.
    pub channels: &'a [i64],
    pub palette: &'a Palette,
    /// Overrides the buffer's own lead names when set.
    pub lead_names: Option<&'a [String]>,
}

impl<'a> ViewContext<'a> {
    pub fn new(buffer: &'a SignalBuffer, position_secs: f64, channels: &'a [i64], palette: &'a Palette) -> Self {
        Self {
            buffer,
            position_secs,
            channels,
            palette,
            lead_names: None,
        }
    }

    pub fn with_lead_names(mut self, names: &'a [String]) -> Self {
        self.lead_names = Some(names);
        self
    }

    /// Requested channels that exist, paired with their slot in the request.
    pub fn valid_channels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let count = self.buffer.num_channels();
        self.channels.iter().enumerate().filter_map(move |(slot, &ch)| {
            usize::try_from(ch)
                .ok()
                .filter(|ch| *ch < count)
                .map(|ch| (slot, ch))
        })
    }

    pub fn trace_name(&self, channel: usize) -> String {
        match self.lead_names.or_else(|| self.buffer.lead_names()) {
            Some(names) => match names.get(channel) {
                Some(name) => format!("Lead {name}"),
                None => format!("Lead {}", channel + 1),
            },
            None => format!("Channel {}", channel + 1),
        }
    }

    pub fn trace(&self, slot: usize, channel: usize, coords: Coordinates) -> Trace {
        let (color_index, color) = self.palette.pick(slot);
        Trace {
            coords,
            name: self.trace_name(channel),
            color_index,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        let palette = Palette::new(vec!["#000".into(), "#fff".into()]);
        assert_eq!(palette.pick(3), (1, "#fff".to_string()));
        assert_eq!(Palette::default().len(), 12);
    }

    #[test]
    fn names_prefer_override_then_buffer_leads() {
        let buffer = SignalBuffer::new(vec![vec![0.0; 4]; 2], 100).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[0, 1], &palette);
        assert_eq!(ctx.trace_name(1), "Channel 2");

        let named = buffer
            .clone()
            .with_lead_names(vec!["I".into(), "II".into()])
            .unwrap();
        let ctx = ViewContext::new(&named, 0.0, &[0, 1], &palette);
        assert_eq!(ctx.trace_name(1), "Lead II");

        let overrides = vec!["V1".to_string()];
        let ctx = ctx.with_lead_names(&overrides);
        assert_eq!(ctx.trace_name(0), "Lead V1");
        assert_eq!(ctx.trace_name(1), "Lead 2");
    }

    #[test]
    fn invalid_channels_are_skipped_but_keep_slots() {
        let buffer = SignalBuffer::new(vec![vec![0.0; 4]; 2], 100).unwrap();
        let palette = Palette::default();
        let ctx = ViewContext::new(&buffer, 0.0, &[-1, 1, 2, 0], &palette);
        let valid: Vec<_> = ctx.valid_channels().collect();
        assert_eq!(valid, vec![(1, 1), (3, 0)]);
    }

    #[test]
    fn gaps_serialise_as_null() {
        let trace = Trace {
            coords: Coordinates::Cartesian {
                x: vec![0.0, 1.0],
                y: vec![Some(2.0), None],
            },
            name: "Channel 1".into(),
            color_index: 0,
            color: "#667eea".into(),
        };
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["y"], serde_json::json!([2.0, null]));
        assert_eq!(json["color_index"], 0);
    }
}
