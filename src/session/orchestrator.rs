use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::session::chunk::{next_chunk, waveform_preview, ChunkStep, WaveformPreview};
use crate::session::config::ViewerConfig;
use crate::session::predict::{status_text, DopplerEstimate, Predictors};
use crate::session::request::{
    AxisLabels, DopplerReport, DownsampleReport, GraphRequest, GraphResponse, IngestReport,
    PlotPayload, Resolved, SignalKind, ViewKind,
};
use crate::session::store::{BufferKey, BufferStore};
use crate::signal::doppler::{doppler_clip, observed_frequency, recede_speeds, simulate_passing};
use crate::signal::{
    decimate, resample, synthesize_ecg, synthesize_eeg, DelimitedTextDecoder, EcgAbnormality,
    EegAbnormality, SignalBuffer, SignalDecoder, Spectrogram, SpectrogramBuilder, SynthSpec,
    ViewerError,
};
use crate::view::{continuous, polar, recurrence, xor_difference, PolarMode, ViewContext};

/// Entry point for every viewer operation.
///
/// Holds the shared buffer store, the configured predictors and the random
/// source used by demos and fallback predictions.
pub struct Session {
    store: Arc<BufferStore>,
    config: ViewerConfig,
    predictors: Predictors,
    spectrum: SpectrogramBuilder,
    rng: Mutex<StdRng>,
}

impl Session {
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        Self::with_store(config, Arc::new(BufferStore::new()))
    }

    pub fn with_store(config: ViewerConfig, store: Arc<BufferStore>) -> Result<Self, ViewerError> {
        config.validate()?;
        let predictors = Predictors::new(&config.models);
        let spectrum = SpectrogramBuilder::new(
            config.spectrogram.fft_size,
            config.spectrogram.hop,
            config.spectrogram.floor_db,
        );
        Ok(Self {
            store,
            config,
            predictors,
            spectrum,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Reseed the random source so demos and fallbacks are reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<BufferStore> {
        &self.store
    }

    pub fn predictors_mut(&mut self) -> &mut Predictors {
        &mut self.predictors
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `buffer` and classify it.
    pub fn ingest(&self, kind: SignalKind, buffer: SignalBuffer) -> Result<IngestReport, ViewerError> {
        let (prediction, status, confidence, synthetic) = match self.predictors.classifier(kind) {
            Some((slot, table)) => {
                let p = slot.classify(buffer.samples(), &mut *self.rng());
                let status = status_text(table, &p.label);
                (Some(p.label), Some(status), Some(p.confidence), p.synthetic)
            }
            None => (None, None, None, false),
        };
        let channels = buffer.num_channels();
        let duration = buffer.duration_seconds();
        let fs = buffer.sample_rate_hz();
        let buffer_id = self.store.insert(buffer);
        info!("ingested {kind:?} recording {buffer_id}: {channels} ch, {duration:.2}s at {fs} Hz");
        Ok(IngestReport {
            buffer_id,
            kind,
            prediction,
            status,
            confidence,
            channels,
            duration,
            fs,
            synthetic,
            success: true,
        })
    }

    /// Decode a delimited-text upload and ingest it.
    pub fn upload(&self, kind: SignalKind, bytes: &[u8], sample_rate_hz: u32) -> Result<IngestReport, ViewerError> {
        let buffer = DelimitedTextDecoder::new(sample_rate_hz).decode(bytes)?;
        self.ingest(kind, buffer)
    }

    /// Synthesise an EEG or ECG recording with a random abnormality and ingest it.
    pub fn demo(&self, kind: SignalKind) -> Result<IngestReport, ViewerError> {
        if !kind.is_biosignal() {
            return Err(ViewerError::invalid("kind", "demo recordings exist for eeg and ecg only"));
        }
        let buffer = {
            let mut rng = self.rng();
            let index: u8 = rng.gen_range(0..5);
            match kind {
                SignalKind::Ecg => synthesize_ecg(&mut *rng, SynthSpec::ECG, EcgAbnormality::from_index(index))?,
                _ => synthesize_eeg(&mut *rng, SynthSpec::EEG, EegAbnormality::from_index(index))?,
            }
        };
        self.ingest(kind, buffer)
    }

    fn resolve(&self, request: &GraphRequest) -> Result<Arc<SignalBuffer>, ViewerError> {
        match request.source.resolve()? {
            Resolved::Key(key) => self.store.get(&key),
            Resolved::Buffer(buffer) => Ok(Arc::new(buffer)),
        }
    }

    fn lead_names(&self, kind: SignalKind) -> Option<&[String]> {
        match kind {
            SignalKind::Eeg => Some(&self.config.eeg_lead_names),
            SignalKind::Ecg => Some(&self.config.ecg_lead_names),
            SignalKind::Drone | SignalKind::Doppler => None,
        }
    }

    /// Render one view of a recording at the requested position.
    pub fn graph(&self, request: &GraphRequest) -> Result<GraphResponse, ViewerError> {
        request.validate()?;
        let source = self.resolve(request)?;
        let decimated = decimate(&source, request.undersample_freq);
        let buffer = &decimated.buffer;
        request.check_window_sizes(buffer.sample_rate_hz(), self.config.max_window_samples)?;
        let current_time = format!(
            "{:.2}s / {:.2}s",
            request.position,
            buffer.duration_seconds()
        );

        let all_channels: Vec<i64>;
        let channels = match &request.channels {
            Some(channels) => channels.as_slice(),
            None => {
                all_channels = (0..buffer.num_channels() as i64).collect();
                &all_channels
            }
        };
        let mut ctx = ViewContext::new(buffer, request.position, channels, &self.config.palette);
        if let Some(names) = self.lead_names(request.kind) {
            ctx = ctx.with_lead_names(names);
        }

        let (plot, labels) = match request.viewer_type {
            ViewKind::Continuous => (
                PlotPayload::Traces {
                    traces: continuous(&ctx, request.zoom),
                },
                self.continuous_labels(request.kind),
            ),
            ViewKind::Xor => (
                PlotPayload::Traces {
                    traces: xor_difference(&ctx, request.chunk_duration),
                },
                self.xor_labels(request.kind, request.chunk_duration),
            ),
            ViewKind::Polar => {
                let mode = request.effective_polar_mode();
                (
                    PlotPayload::Traces {
                        traces: polar(&ctx, request.zoom, mode),
                    },
                    polar_labels(mode),
                )
            }
            ViewKind::Recurrence => {
                let pair = usize::try_from(request.rec_ch_x)
                    .ok()
                    .zip(usize::try_from(request.rec_ch_y).ok());
                let histogram = pair.and_then(|(x, y)| {
                    recurrence(
                        buffer,
                        request.position,
                        request.zoom,
                        x,
                        y,
                        self.config.recurrence_bins,
                    )
                    .map(|histogram| (histogram, x, y))
                });
                match histogram {
                    Some((histogram, x, y)) => (
                        PlotPayload::Heatmap {
                            histogram,
                            colormap: request.colormap.clone(),
                        },
                        self.recurrence_labels(request.kind, x, y),
                    ),
                    None => {
                        warn!(
                            "recurrence of channels {} and {} produced no data",
                            request.rec_ch_x, request.rec_ch_y
                        );
                        (PlotPayload::Empty, titled("Error generating recurrence plot"))
                    }
                }
            }
        };
        debug!(
            "{:?} view at {:.2}s, {} Hz, empty: {}",
            request.viewer_type,
            request.position,
            decimated.effective_rate_hz,
            plot.is_empty()
        );
        Ok(GraphResponse {
            plot,
            labels,
            current_time,
            effective_rate: decimated.effective_rate_hz,
            success: true,
        })
    }

    fn continuous_labels(&self, kind: SignalKind) -> AxisLabels {
        match kind {
            SignalKind::Ecg => labels("Continuous Time Signal Viewer (ECG)", "Time (s)", "Amplitude (mV)"),
            _ => labels("Continuous Time Signal Viewer", "Time (s)", "Amplitude"),
        }
    }

    fn xor_labels(&self, kind: SignalKind, chunk_secs: f64) -> AxisLabels {
        let title = format!("XOR Difference Graph (Chunk: {chunk_secs}s)");
        match kind {
            SignalKind::Ecg => labels(&title, "Time within beat (s)", "Difference Amplitude (mV)"),
            _ => labels(&title, "Time within window (s)", "Difference Amplitude"),
        }
    }

    fn recurrence_labels(&self, kind: SignalKind, x: usize, y: usize) -> AxisLabels {
        let name = |ch: usize| {
            self.lead_names(kind)
                .and_then(|names| names.get(ch).cloned())
                .unwrap_or_else(|| format!("Channel {}", ch + 1))
        };
        let title = format!("Recurrence: {} vs {}", name(x), name(y));
        match kind {
            SignalKind::Ecg => labels(&title, &format!("Lead {}", name(x)), &format!("Lead {}", name(y))),
            _ => labels(&title, &format!("Channel {}", x + 1), &format!("Channel {}", y + 1)),
        }
    }

    fn mono(&self, key: &str) -> Result<(Arc<SignalBuffer>, Vec<f64>), ViewerError> {
        let buffer = self.store.get(key)?;
        let samples = buffer.channel(0).map(|c| c.to_vec()).unwrap_or_default();
        Ok((buffer, samples))
    }

    /// Log-magnitude spectrogram of channel 0.
    pub fn spectrogram(&self, key: &str) -> Result<Spectrogram, ViewerError> {
        let (buffer, samples) = self.mono(key)?;
        let spectrogram = self.spectrum.compute(&samples, buffer.sample_rate_hz());
        if spectrogram.is_empty() {
            warn!("spectrogram of {key} is empty");
        }
        Ok(spectrogram)
    }

    pub fn waveform(&self, key: &str, play_pos: f64) -> Result<WaveformPreview, ViewerError> {
        let buffer = self.store.get(key)?;
        Ok(waveform_preview(&buffer, play_pos, &self.config.audio))
    }

    pub fn chunk(&self, key: &str, position: usize) -> Result<ChunkStep, ViewerError> {
        let buffer = self.store.get(key)?;
        Ok(next_chunk(&buffer, position, &self.config.audio))
    }

    fn store_clip(&self, samples: Vec<f64>, rate: u32) -> Result<(BufferKey, Spectrogram), ViewerError> {
        let spectrogram = self.spectrum.compute(&samples, rate);
        let buffer = SignalBuffer::new(vec![samples], rate)?;
        Ok((self.store.insert(buffer), spectrogram))
    }

    /// Apply a Doppler ramp over the whole clip and store the result.
    pub fn doppler_generate(
        &self,
        key: &str,
        v_start: f64,
        v_end: f64,
        f_source: Option<f64>,
    ) -> Result<DopplerReport, ViewerError> {
        check_speed("v_start", v_start)?;
        check_speed("v_end", v_end)?;
        let (buffer, samples) = self.mono(key)?;
        let shifted = doppler_clip(&samples, v_start, v_end);
        let (buffer_id, spectrogram) = self.store_clip(shifted, buffer.sample_rate_hz())?;
        let observed = f_source
            .map(|f| {
                format!(
                    "Observed Frequency: start={:.1} Hz → end={:.1} Hz",
                    observed_frequency(f, v_start),
                    observed_frequency(f, v_end)
                )
            })
            .unwrap_or_default();
        Ok(DopplerReport {
            buffer_id,
            status: format!("Doppler applied across full clip: v_i={v_start} m/s → v_f={v_end} m/s"),
            observed,
            spectrogram,
            success: true,
        })
    }

    /// Approach over the first half of the clip, recede over the second.
    pub fn doppler_simulate(
        &self,
        key: &str,
        v_start: f64,
        v_end: f64,
        f_source: Option<f64>,
    ) -> Result<DopplerReport, ViewerError> {
        check_speed("v_start", v_start)?;
        check_speed("v_end", v_end)?;
        let (buffer, samples) = self.mono(key)?;
        let passing = simulate_passing(&samples, v_start, v_end)?;
        let (buffer_id, spectrogram) = self.store_clip(passing, buffer.sample_rate_hz())?;
        let observed = f_source
            .map(|f| {
                let (_, rec_end) = recede_speeds(v_end);
                format!(
                    "Start obs freq: {:.1} Hz · End of accel: {:.1} Hz · Receding approx: {:.1} Hz",
                    observed_frequency(f, v_start),
                    observed_frequency(f, v_end),
                    observed_frequency(f, -rec_end)
                )
            })
            .unwrap_or_default();
        Ok(DopplerReport {
            buffer_id,
            status: format!("Car passing simulation: v_i={v_start} m/s → v_f={v_end} m/s"),
            observed,
            spectrogram,
            success: true,
        })
    }

    /// Estimate source speeds and frequency from the clip's spectrogram.
    pub fn doppler_predict(&self, key: &str) -> Result<DopplerEstimate, ViewerError> {
        let spectrogram = self.spectrogram(key)?;
        Ok(self.predictors.doppler.estimate(&spectrogram.z, &mut *self.rng()))
    }

    /// Resample a stored clip and store the result under a new key.
    pub fn downsample(&self, key: &str, new_rate_hz: i64) -> Result<DownsampleReport, ViewerError> {
        let buffer = self.store.get(key)?;
        let resampled = resample(&buffer, new_rate_hz);
        let new_rate = resampled.sample_rate_hz();
        let samples = resampled.total_samples();
        let buffer_id = self.store.insert(resampled);
        Ok(DownsampleReport {
            buffer_id,
            original_rate: buffer.sample_rate_hz(),
            new_rate,
            samples,
            success: true,
        })
    }
}

fn check_speed(name: &'static str, value: f64) -> Result<(), ViewerError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ViewerError::invalid(name, "must be a finite speed in m/s"))
    }
}

fn labels(title: &str, x_axis: &str, y_axis: &str) -> AxisLabels {
    AxisLabels {
        title: title.to_string(),
        x_axis: x_axis.to_string(),
        y_axis: y_axis.to_string(),
    }
}

fn titled(title: &str) -> AxisLabels {
    labels(title, "", "")
}

fn polar_labels(mode: PolarMode) -> AxisLabels {
    let name = match mode {
        PolarMode::Fixed => "Fixed",
        PolarMode::Cumulative => "Cumulative",
        PolarMode::Cycles => "Cycles",
    };
    titled(&format!("Polar Graph ({name})"))
}
