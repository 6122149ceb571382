use std::path::Path;
use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::audio::loader::AudioLoader;
use crate::audio::types::AudioData;
use crate::error::{Result, SourceError};
use crate::source::FrameSource;

/// Plays back decoded audio as a stream of magnitude spectra.
///
/// Each call to [`current_frame`](FrameSource::current_frame) analyzes the
/// `fft_size` samples at the playhead and then advances the playhead by
/// `hop_seconds`, mimicking an analyzer polled at a fixed cadence.
pub struct SpectrumSource {
    audio: AudioData,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    hop_samples: usize,
    playhead: usize,
}

impl SpectrumSource {
    /// Decode `path` and prepare a source polled every `hop_seconds`
    pub async fn open<P: AsRef<Path>>(path: P, fft_size: usize, hop_seconds: f64) -> Result<Self> {
        let audio = AudioLoader::load(path).await?;
        Self::from_audio(audio, fft_size, hop_seconds)
    }

    /// Build a source over already decoded audio
    pub fn from_audio(audio: AudioData, fft_size: usize, hop_seconds: f64) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(SourceError::InvalidParameters {
                details: format!("FFT size must be a power of two, got {}", fft_size),
            }
            .into());
        }

        if audio.sample_rate == 0 {
            return Err(SourceError::InvalidParameters {
                details: "Sample rate must be greater than zero".to_string(),
            }
            .into());
        }

        let hop_samples = (hop_seconds * audio.sample_rate as f64).round();
        if !(hop_samples.is_finite() && hop_samples >= 1.0) {
            return Err(SourceError::InvalidParameters {
                details: format!("Hop of {}s is shorter than one sample", hop_seconds),
            }
            .into());
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();
        let magnitudes = vec![0.0; spectrum.len()];

        // Hann window
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (fft_size - 1) as f32).cos()))
            .collect();

        tracing::info!(
            "Spectrum source: {:.1}s of audio at {} Hz, {}-point FFT, hop {} samples",
            audio.duration,
            audio.sample_rate,
            fft_size,
            hop_samples
        );

        Ok(Self {
            audio,
            fft,
            window,
            input,
            spectrum,
            magnitudes,
            hop_samples: hop_samples as usize,
            playhead: 0,
        })
    }

    /// Playback position in seconds
    pub fn position(&self) -> f64 {
        self.audio.time_for_sample(self.playhead)
    }

    pub fn duration(&self) -> f64 {
        self.audio.duration
    }

    /// Number of bins in each produced frame
    pub fn bins(&self) -> usize {
        self.magnitudes.len()
    }

    fn analyze_at_playhead(&mut self) -> bool {
        let fft_size = self.input.len();
        let samples = &self.audio.samples[self.playhead..];

        // Zero-pad the tail of the file
        for (i, slot) in self.input.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = sample * self.window[i];
        }

        if let Err(err) = self.fft.process(&mut self.input, &mut self.spectrum) {
            tracing::warn!("FFT processing failed: {}", err);
            return false;
        }

        let scale = 2.0 / fft_size as f32;
        for (magnitude, bin) in self.magnitudes.iter_mut().zip(self.spectrum.iter()) {
            *magnitude = bin.norm() * scale;
        }
        true
    }
}

impl FrameSource for SpectrumSource {
    fn current_frame(&mut self) -> Option<&[f32]> {
        if self.is_exhausted() {
            return None;
        }

        let analyzed = self.analyze_at_playhead();
        self.playhead += self.hop_samples;

        if analyzed {
            Some(self.magnitudes.as_slice())
        } else {
            None
        }
    }

    fn is_exhausted(&self) -> bool {
        self.playhead >= self.audio.samples.len()
    }
}
