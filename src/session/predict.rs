//! Classifier and regressor seams plus the synthetic fallbacks used when no
//! model is installed or a model fails.

use log::{debug, warn};
use ndarray::{s, Array2, ArrayView2};
use rand::Rng;
use serde::Serialize;

use crate::session::config::ModelShapes;
use crate::session::request::SignalKind;
use crate::signal::ViewerError;

/// Label code and display text, in table order.
pub const EEG_LABELS: [(&str, &str); 4] = [
    ("Seizure", "Epileptic Seizure"),
    ("AD", "Alzheimer's Disease"),
    ("MCI", "Mild Cognitive Impairment"),
    ("FTD", "Frontotemporal Dementia"),
];

pub const ECG_LABELS: [(&str, &str); 4] = [
    ("Arrhythmia", "Cardiac Arrhythmia"),
    ("MI", "Myocardial Infarction"),
    ("Ischemia", "Cardiac Ischemia"),
    ("BBB", "Bundle Branch Block"),
];

pub const DRONE_LABELS: [(&str, &str); 2] = [("DRONE", "Drone detected"), ("NOT_DRONE", "No drone detected")];

/// Display text for a label code, or the code itself when it is unknown.
pub fn status_text(table: &[(&str, &str)], label: &str) -> String {
    table
        .iter()
        .find(|(code, _)| *code == label)
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| label.to_string())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
    /// Set when the result did not come from a model.
    pub synthetic: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DopplerEstimate {
    pub v_start: f64,
    pub v_end: f64,
    pub f_source: f64,
    pub synthetic: bool,
}

pub trait Classifier: Send + Sync {
    /// `(channels, samples)` the model was trained on.
    fn input_shape(&self) -> (usize, usize);
    fn predict(&self, input: ArrayView2<'_, f32>) -> Result<Prediction, ViewerError>;
}

pub trait Regressor: Send + Sync {
    fn input_shape(&self) -> (usize, usize);
    fn predict(&self, input: ArrayView2<'_, f32>) -> Result<DopplerEstimate, ViewerError>;
}

/// Zero-pad or truncate both dimensions of `rows` to `shape`.
pub fn fit_to_shape(rows: &[Vec<f64>], shape: (usize, usize)) -> Array2<f32> {
    let (channels, samples) = shape;
    let mut out = Array2::<f32>::zeros(shape);
    for (i, row) in rows.iter().take(channels).enumerate() {
        let n = row.len().min(samples);
        let mut dst = out.slice_mut(s![i, ..n]);
        for (d, v) in dst.iter_mut().zip(row) {
            *d = *v as f32;
        }
    }
    out
}

/// How a slot answers without a usable model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fallback {
    /// Uniform label from the table, confidence in `[low, high)`.
    RandomLabel {
        table: &'static [(&'static str, &'static str)],
        low: f64,
        high: f64,
    },
    /// Label and confidence derived from the per-channel sample count, so the
    /// answer changes when the recording is undersampled.
    SampleCount {
        table: &'static [(&'static str, &'static str)],
    },
}

impl Fallback {
    fn predict<R: Rng + ?Sized>(&self, sample_count: usize, rng: &mut R) -> Prediction {
        let (label, confidence) = match *self {
            Fallback::RandomLabel { table, low, high } => {
                let index = rng.gen_range(0..table.len());
                (table[index].0, rng.gen_range(low..high))
            }
            Fallback::SampleCount { table } => {
                let n = sample_count as u64;
                let index = ((n.wrapping_mul(17).wrapping_add(83)) % table.len() as u64) as usize;
                let confidence = (n.wrapping_mul(3) % 100) as f64 / 100.0 * 0.25 + 0.7;
                (table[index].0, confidence)
            }
        };
        Prediction {
            label: label.to_string(),
            confidence,
            synthetic: true,
        }
    }
}

pub struct ClassifierSlot {
    name: &'static str,
    shape: (usize, usize),
    model: Option<Box<dyn Classifier>>,
    fallback: Fallback,
}

impl ClassifierSlot {
    pub fn new(name: &'static str, shape: (usize, usize), fallback: Fallback) -> Self {
        Self {
            name,
            shape,
            model: None,
            fallback,
        }
    }

    /// Install a model; its input shape must match the configured one.
    pub fn install(&mut self, model: Box<dyn Classifier>) -> Result<(), ViewerError> {
        if model.input_shape() != self.shape {
            return Err(ViewerError::Config(format!(
                "{} model expects {:?}, configured shape is {:?}",
                self.name,
                model.input_shape(),
                self.shape
            )));
        }
        self.model = Some(model);
        Ok(())
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn classify<R: Rng + ?Sized>(&self, rows: &[Vec<f64>], rng: &mut R) -> Prediction {
        let sample_count = rows.first().map(|r| r.len()).unwrap_or(0);
        let Some(model) = &self.model else {
            debug!("no {} model installed, using fallback", self.name);
            return self.fallback.predict(sample_count, rng);
        };
        let input = fit_to_shape(rows, self.shape);
        match model.predict(input.view()) {
            Ok(prediction) => prediction,
            Err(err) => {
                warn!("{} model failed ({err}), using fallback", self.name);
                self.fallback.predict(sample_count, rng)
            }
        }
    }
}

pub struct RegressorSlot {
    shape: (usize, usize),
    model: Option<Box<dyn Regressor>>,
}

impl RegressorSlot {
    pub fn new(shape: (usize, usize)) -> Self {
        Self { shape, model: None }
    }

    pub fn install(&mut self, model: Box<dyn Regressor>) -> Result<(), ViewerError> {
        if model.input_shape() != self.shape {
            return Err(ViewerError::Config(format!(
                "doppler model expects {:?}, configured shape is {:?}",
                model.input_shape(),
                self.shape
            )));
        }
        self.model = Some(model);
        Ok(())
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn estimate<R: Rng + ?Sized>(&self, rows: &[Vec<f64>], rng: &mut R) -> DopplerEstimate {
        if let Some(model) = &self.model {
            let input = fit_to_shape(rows, self.shape);
            match model.predict(input.view()) {
                Ok(estimate) => return estimate,
                Err(err) => warn!("doppler model failed ({err}), using fallback"),
            }
        }
        DopplerEstimate {
            v_start: rng.gen_range(0.0..40.0),
            v_end: rng.gen_range(0.0..40.0),
            f_source: rng.gen_range(200.0..1000.0),
            synthetic: true,
        }
    }
}

/// One slot per signal kind, sized from the configured model shapes.
pub struct Predictors {
    pub eeg: ClassifierSlot,
    pub ecg: ClassifierSlot,
    pub drone: ClassifierSlot,
    pub doppler: RegressorSlot,
}

impl Predictors {
    pub fn new(shapes: &ModelShapes) -> Self {
        Self {
            eeg: ClassifierSlot::new(
                "eeg",
                shapes.eeg,
                Fallback::RandomLabel {
                    table: &EEG_LABELS,
                    low: 0.5,
                    high: 0.8,
                },
            ),
            ecg: ClassifierSlot::new("ecg", shapes.ecg, Fallback::SampleCount { table: &ECG_LABELS }),
            drone: ClassifierSlot::new(
                "drone",
                shapes.drone,
                Fallback::RandomLabel {
                    table: &DRONE_LABELS,
                    low: 0.5,
                    high: 0.8,
                },
            ),
            doppler: RegressorSlot::new(shapes.doppler),
        }
    }

    /// Classifier and label table for `kind`; Doppler clips are not classified.
    pub fn classifier(&self, kind: SignalKind) -> Option<(&ClassifierSlot, &'static [(&'static str, &'static str)])> {
        match kind {
            SignalKind::Eeg => Some((&self.eeg, &EEG_LABELS)),
            SignalKind::Ecg => Some((&self.ecg, &ECG_LABELS)),
            SignalKind::Drone => Some((&self.drone, &DRONE_LABELS)),
            SignalKind::Doppler => None,
        }
    }
}
