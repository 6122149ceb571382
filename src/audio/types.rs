use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Decoded mono audio used by file-backed frame sources
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels in the original file
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,
}

impl AudioData {
    /// Downmix interleaved samples into mono
    pub fn from_interleaved(
        interleaved: &[f32],
        sample_rate: u32,
        channels: u16,
        file_path: PathBuf,
    ) -> Self {
        let samples: Vec<f32> = if channels <= 1 {
            interleaved.to_vec()
        } else {
            interleaved
                .chunks(channels as usize)
                .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
                .collect()
        };

        let duration = if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / sample_rate as f64
        };

        Self {
            samples,
            sample_rate,
            channels,
            duration,
            file_path,
        }
    }

    /// Get time in seconds for a sample index
    pub fn time_for_sample(&self, sample_index: usize) -> f64 {
        sample_index as f64 / self.sample_rate as f64
    }
}

/// Tunable constants of the analysis engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the number of low-frequency bins averaged
    pub band_cap: usize,

    /// Band end is at most `frame_len / band_divisor`
    pub band_divisor: usize,

    /// First bin included in the band (bin 0 is DC)
    pub first_band_bin: usize,

    /// Frame energies kept for the dynamic threshold (~10 s at 10 Hz)
    pub history_capacity: usize,

    /// Dynamic threshold = average energy * this factor
    pub dynamic_threshold_factor: f32,

    /// Initial and post-reset value of the slow-drift threshold
    pub threshold_seed: f32,

    /// Retained share of the slow-drift threshold per step
    pub threshold_decay: f32,

    /// Minimum seconds between two accepted peaks
    pub refractory_gap: f64,

    /// Trailing window of peak timestamps in seconds
    pub peak_window: f64,

    /// Peaks required before a tempo is inferred
    pub min_peaks: usize,

    /// Lowest plausible tempo
    pub min_bpm: f32,

    /// Highest plausible tempo
    pub max_bpm: f32,

    /// Share of the previous smoothed tempo kept on each update
    pub smoothing_factor: f32,

    /// Offset added to the RMS decibel value
    pub volume_offset_db: f32,

    /// Loudness floor, also reported for silence
    pub volume_floor: f32,

    /// Loudness ceiling
    pub volume_ceiling: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            band_cap: 16,
            band_divisor: 4,
            first_band_bin: 2,
            history_capacity: 100,
            dynamic_threshold_factor: 1.5,
            threshold_seed: 0.1,
            threshold_decay: 0.99,
            refractory_gap: 0.3,
            peak_window: 10.0,
            min_peaks: 3,
            min_bpm: 50.0,
            max_bpm: 220.0,
            smoothing_factor: 0.7,
            volume_offset_db: 90.0,
            volume_floor: 30.0,
            volume_ceiling: 130.0,
        }
    }
}

impl EngineConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.band_divisor == 0 {
            return Err("Band divisor must be greater than zero".to_string());
        }

        if self.first_band_bin == 0 {
            return Err("First band bin must skip the DC bin".to_string());
        }

        if self.band_cap <= self.first_band_bin {
            return Err("Band cap must be larger than the first band bin".to_string());
        }

        if self.history_capacity == 0 {
            return Err("Energy history capacity must be greater than zero".to_string());
        }

        if !(self.dynamic_threshold_factor.is_finite() && self.dynamic_threshold_factor > 0.0) {
            return Err("Dynamic threshold factor must be positive".to_string());
        }

        if !(self.threshold_seed.is_finite() && self.threshold_seed >= 0.0) {
            return Err("Threshold seed must be non-negative".to_string());
        }

        if !(0.0..1.0).contains(&self.threshold_decay) {
            return Err("Threshold decay must be in [0.0, 1.0)".to_string());
        }

        if !(self.refractory_gap.is_finite() && self.refractory_gap > 0.0) {
            return Err("Refractory gap must be positive".to_string());
        }

        if !(self.peak_window.is_finite() && self.peak_window > self.refractory_gap) {
            return Err("Peak window must be longer than the refractory gap".to_string());
        }

        if self.min_peaks < 2 {
            return Err("At least two peaks are needed to form an interval".to_string());
        }

        if !(self.min_bpm > 0.0 && self.min_bpm < self.max_bpm && self.max_bpm.is_finite()) {
            return Err("Minimum BPM must be positive and less than maximum BPM".to_string());
        }

        if !(0.0..1.0).contains(&self.smoothing_factor) {
            return Err("Smoothing factor must be in [0.0, 1.0)".to_string());
        }

        if !(self.volume_floor.is_finite() && self.volume_floor < self.volume_ceiling && self.volume_ceiling.is_finite()) {
            return Err("Volume floor must be less than volume ceiling".to_string());
        }

        if !self.volume_offset_db.is_finite() {
            return Err("Volume offset must be finite".to_string());
        }

        Ok(())
    }

    /// Highest tempo the refractory gap can produce
    pub fn max_detectable_bpm(&self) -> f32 {
        (60.0 / self.refractory_gap) as f32
    }
}

/// Read-only view of the detector internals for debug overlays
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Diagnostics {
    /// Current slow-drift threshold
    pub adaptive_threshold: f32,

    /// Threshold the last frame energy was compared against
    pub active_threshold: f32,

    /// Energy of the last analyzed frame
    pub last_energy: f32,

    /// Accepted peaks currently inside the trailing window
    pub peaks_in_window: usize,

    /// Seconds between the last analyzed frame and the last accepted peak
    pub time_since_last_peak: Option<f64>,

    /// Entries in the energy history
    pub history_len: usize,

    /// Frames analyzed since construction or reset
    pub steps_processed: u64,

    /// Steps skipped because no frame was available
    pub steps_skipped: u64,
}

/// Snapshot of the derived signals published after each step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    /// Clock time of the step that produced this reading
    pub timestamp: f64,

    /// dBA-like loudness in [floor, ceiling]
    pub volume_level: f32,

    /// Latest raw tempo, 0 until established
    pub tempo_estimate: f32,

    /// Smoothed tempo for display, 0 until established
    pub smoothed_tempo: f32,

    /// Detector internals
    pub diagnostics: Diagnostics,
}
