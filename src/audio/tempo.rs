//! Tempo inference from the intervals between accepted peaks.

use std::collections::VecDeque;

use crate::audio::types::EngineConfig;

/// Result of a tempo inference attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TempoUpdate {
    /// Not enough peaks in the window to form a median interval
    Insufficient { peaks: usize },

    /// Estimate fell outside the plausibility band and was discarded
    Rejected { raw_bpm: f32 },

    /// Estimate accepted and folded into the smoothed tempo
    Accepted { raw_bpm: f32, smoothed_bpm: f32 },
}

/// Median of consecutive intervals between peak timestamps.
///
/// On an even interval count the element at `len / 2` is taken.
pub fn median_interval(peaks: &VecDeque<f64>) -> Option<f64> {
    if peaks.len() < 2 {
        return None;
    }

    let mut intervals: Vec<f64> = peaks
        .iter()
        .zip(peaks.iter().skip(1))
        .map(|(prev, next)| next - prev)
        .collect();
    intervals.sort_by(|a, b| a.total_cmp(b));

    let median = intervals[intervals.len() / 2];
    (median.is_finite() && median > 0.0).then_some(median)
}

/// Tempo inference from peak intervals with exponential smoothing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempoEstimator {
    tempo_estimate: f32,
    smoothed_tempo: f32,
}

impl TempoEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infer tempo from the current peak window
    pub fn update(&mut self, peaks: &VecDeque<f64>, config: &EngineConfig) -> TempoUpdate {
        if peaks.len() < config.min_peaks {
            return TempoUpdate::Insufficient { peaks: peaks.len() };
        }

        match median_interval(peaks) {
            Some(median) => {
                let raw_bpm = (60.0 / median) as f32;
                tracing::debug!(
                    "Raw tempo {:.1} BPM from {} peaks (median interval {:.3}s)",
                    raw_bpm,
                    peaks.len(),
                    median
                );
                self.apply(raw_bpm, config)
            }
            None => TempoUpdate::Insufficient { peaks: peaks.len() },
        }
    }

    /// Fold a raw estimate into the state if it is plausible
    pub fn apply(&mut self, raw_bpm: f32, config: &EngineConfig) -> TempoUpdate {
        if !(config.min_bpm..=config.max_bpm).contains(&raw_bpm) {
            tracing::trace!("Discarding implausible tempo {:.1} BPM", raw_bpm);
            return TempoUpdate::Rejected { raw_bpm };
        }

        self.tempo_estimate = raw_bpm;
        self.smoothed_tempo = if self.smoothed_tempo == 0.0 {
            raw_bpm
        } else {
            let alpha = config.smoothing_factor;
            self.smoothed_tempo * alpha + raw_bpm * (1.0 - alpha)
        };

        tracing::debug!("Tempo updated: {:.1} BPM (raw {:.1})", self.smoothed_tempo, raw_bpm);

        TempoUpdate::Accepted {
            raw_bpm,
            smoothed_bpm: self.smoothed_tempo,
        }
    }

    pub fn reset(&mut self) {
        self.tempo_estimate = 0.0;
        self.smoothed_tempo = 0.0;
    }

    pub fn tempo_estimate(&self) -> f32 {
        self.tempo_estimate
    }

    pub fn smoothed_tempo(&self) -> f32 {
        self.smoothed_tempo
    }
}
