//! The analysis engine: one synchronous step per frequency frame.

use crate::audio::band_energy::band_energy;
use crate::audio::loudness::volume_level;
use crate::audio::peak_detector::{PeakDecision, PeakDetector};
use crate::audio::tempo::{TempoEstimator, TempoUpdate};
use crate::audio::types::{Diagnostics, EngineConfig, Reading};
use crate::error::{AnalysisError, Result};

/// Everything one analyzed frame produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Clock time of the frame
    pub timestamp: f64,

    /// Instantaneous loudness
    pub volume_level: f32,

    /// Peak detector decision for the band energy
    pub peak: PeakDecision,

    /// Tempo inference result, present only when a peak was accepted
    pub tempo: Option<TempoUpdate>,
}

/// Result of a single engine step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// No usable frame; state untouched
    Skipped,

    /// Frame analyzed
    Analyzed(StepReport),
}

impl StepOutcome {
    /// Whether this step accepted an onset peak
    pub fn peak_accepted(&self) -> bool {
        matches!(self, Self::Analyzed(report) if report.peak.accepted)
    }
}

/// Real-time tempo and loudness engine.
///
/// The host calls [`step`](Self::step) on its own schedule with the current
/// frequency frame and a monotonic timestamp. The engine never reads a clock
/// itself, so identical input sequences always produce identical output.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    config: EngineConfig,
    volume_level: Option<f32>,
    last_energy: f32,
    detector: PeakDetector,
    tempo: TempoEstimator,
    last_timestamp: Option<f64>,
    steps_processed: u64,
    steps_skipped: u64,
}

impl AnalysisEngine {
    /// Create a new engine with default configuration
    pub fn new() -> Self {
        Self::from_valid_config(EngineConfig::default())
    }

    /// Create a new engine with custom configuration
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidParameters { details: e })?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: EngineConfig) -> Self {
        Self {
            detector: PeakDetector::new(&config),
            tempo: TempoEstimator::new(),
            volume_level: None,
            last_energy: 0.0,
            last_timestamp: None,
            steps_processed: 0,
            steps_skipped: 0,
            config,
        }
    }

    /// Analyze one frame captured at `timestamp` seconds.
    ///
    /// An empty frame is skipped without touching analysis state. Non-finite
    /// or regressing timestamps are contract violations and return an error.
    pub fn step(&mut self, frame: &[f32], timestamp: f64) -> Result<StepOutcome> {
        if frame.is_empty() {
            self.steps_skipped += 1;
            tracing::debug!("No frequency data at {:.3}s, skipping analysis step", timestamp);
            return Ok(StepOutcome::Skipped);
        }

        if !timestamp.is_finite() {
            return Err(AnalysisError::NonFiniteTimestamp { timestamp }.into());
        }

        if let Some(previous) = self.last_timestamp {
            if timestamp < previous {
                return Err(AnalysisError::TimestampRegressed { previous, current: timestamp }.into());
            }
        }

        let volume = volume_level(frame, &self.config);
        let energy = band_energy(frame, &self.config);
        let peak = self.detector.process(energy, timestamp, &self.config);

        let tempo = if peak.accepted {
            Some(self.tempo.update(self.detector.peak_timestamps(), &self.config))
        } else {
            None
        };

        self.volume_level = Some(volume);
        self.last_energy = peak.energy;
        self.last_timestamp = Some(timestamp);
        self.steps_processed += 1;

        tracing::trace!(
            "Step {:.3}s: volume {:.1} dBA, energy {:.4}, threshold {:.4}, bpm {:.1}",
            timestamp,
            volume,
            peak.energy,
            peak.active_threshold,
            self.tempo.smoothed_tempo()
        );

        Ok(StepOutcome::Analyzed(StepReport {
            timestamp,
            volume_level: volume,
            peak,
            tempo,
        }))
    }

    /// Latest loudness; the floor value before the first analyzed frame
    pub fn volume_level(&self) -> f32 {
        self.volume_level.unwrap_or(self.config.volume_floor)
    }

    /// Whether any frame has been analyzed since construction or reset
    pub fn has_signal(&self) -> bool {
        self.volume_level.is_some()
    }

    /// Latest raw tempo, 0 until a plausible tempo exists
    pub fn tempo_estimate(&self) -> f32 {
        self.tempo.tempo_estimate()
    }

    /// Smoothed tempo for display, 0 until the first accepted estimate
    pub fn smoothed_tempo(&self) -> f32 {
        self.tempo.smoothed_tempo()
    }

    /// Accepted peak timestamps inside the trailing window, oldest first
    pub fn peak_timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.detector.peak_timestamps().iter().copied()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let time_since_last_peak = match (self.last_timestamp, self.detector.last_peak_time()) {
            (Some(now), Some(peak)) => Some(now - peak),
            _ => None,
        };

        Diagnostics {
            adaptive_threshold: self.detector.adaptive_threshold(),
            active_threshold: self.detector.last_active_threshold(),
            last_energy: self.last_energy,
            peaks_in_window: self.detector.peak_timestamps().len(),
            time_since_last_peak,
            history_len: self.detector.history_len(),
            steps_processed: self.steps_processed,
            steps_skipped: self.steps_skipped,
        }
    }

    /// Snapshot of the derived signals
    pub fn reading(&self) -> Reading {
        Reading {
            timestamp: self.last_timestamp.unwrap_or(0.0),
            volume_level: self.volume_level(),
            tempo_estimate: self.tempo_estimate(),
            smoothed_tempo: self.smoothed_tempo(),
            diagnostics: self.diagnostics(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Return to the freshly constructed state, reseeding the threshold
    pub fn reset(&mut self) {
        self.detector.reset(self.config.threshold_seed);
        self.tempo.reset();
        self.volume_level = None;
        self.last_energy = 0.0;
        self.last_timestamp = None;
        self.steps_processed = 0;
        self.steps_skipped = 0;
        tracing::debug!("Analysis engine reset");
    }

    /// Replace the tunables and reset; the old configuration is kept on error
    pub fn configure(&mut self, config: EngineConfig) -> Result<()> {
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidParameters { details: e })?;

        self.config = config;
        self.reset();
        Ok(())
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
