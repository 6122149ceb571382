//! Adaptive-threshold onset detection over the low-band energy signal.

use std::collections::VecDeque;

use crate::audio::types::EngineConfig;

/// Outcome of feeding one frame energy to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDecision {
    /// Energy that was evaluated
    pub energy: f32,

    /// Average history energy scaled by the dynamic factor
    pub dynamic_threshold: f32,

    /// The lower of the dynamic and slow-drift thresholds
    pub active_threshold: f32,

    /// Whether the energy was accepted as an onset
    pub accepted: bool,
}

/// Adaptive-threshold onset detector over low-band frame energy.
///
/// Two thresholds are maintained: a dynamic one derived from the mean of a
/// bounded energy history, and a slow-drift one that moves 1% toward the
/// current energy every step. A peak fires when the energy exceeds the lower
/// of the two and the refractory gap since the last accepted peak has passed.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    energy_history: VecDeque<f32>,
    adaptive_threshold: f32,
    last_active_threshold: f32,
    peak_timestamps: VecDeque<f64>,
    last_peak_time: Option<f64>,
}

impl PeakDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            energy_history: VecDeque::with_capacity(config.history_capacity),
            adaptive_threshold: config.threshold_seed,
            last_active_threshold: config.threshold_seed,
            peak_timestamps: VecDeque::new(),
            last_peak_time: None,
        }
    }

    /// Evaluate one frame energy at `timestamp` (seconds, monotonic)
    pub fn process(&mut self, energy: f32, timestamp: f64, config: &EngineConfig) -> PeakDecision {
        // Non-finite energies would poison the history mean forever
        let energy = if energy.is_finite() { energy.max(0.0) } else { 0.0 };

        self.energy_history.push_back(energy);
        while self.energy_history.len() > config.history_capacity {
            self.energy_history.pop_front();
        }

        let sum: f64 = self.energy_history.iter().map(|&e| f64::from(e)).sum();
        let avg_energy = (sum / self.energy_history.len() as f64) as f32;
        let dynamic_threshold = avg_energy * config.dynamic_threshold_factor;
        let active_threshold = dynamic_threshold.min(self.adaptive_threshold);

        let gap_elapsed = match self.last_peak_time {
            Some(last) => timestamp - last > config.refractory_gap,
            None => true,
        };
        let accepted = energy > active_threshold && gap_elapsed;

        // The window trails the current step, not the last accepted peak
        self.prune(timestamp, config.peak_window);

        if accepted {
            self.peak_timestamps.push_back(timestamp);
            self.last_peak_time = Some(timestamp);

            tracing::debug!(
                "Peak accepted at {:.3}s: energy {:.4} > threshold {:.4} ({} peaks in window)",
                timestamp,
                energy,
                active_threshold,
                self.peak_timestamps.len()
            );
        }

        let decay = config.threshold_decay;
        self.adaptive_threshold = self.adaptive_threshold * decay + energy * (1.0 - decay);
        self.last_active_threshold = active_threshold;

        PeakDecision {
            energy,
            dynamic_threshold,
            active_threshold,
            accepted,
        }
    }

    /// Drop timestamps that fell out of the trailing window
    fn prune(&mut self, now: f64, window: f64) {
        while let Some(&oldest) = self.peak_timestamps.front() {
            if now - oldest < window {
                break;
            }
            self.peak_timestamps.pop_front();
        }
    }

    /// Clear history and peaks, reseeding the slow-drift threshold
    pub fn reset(&mut self, threshold_seed: f32) {
        self.energy_history.clear();
        self.peak_timestamps.clear();
        self.last_peak_time = None;
        self.adaptive_threshold = threshold_seed;
        self.last_active_threshold = threshold_seed;
    }

    pub fn peak_timestamps(&self) -> &VecDeque<f64> {
        &self.peak_timestamps
    }

    pub fn last_peak_time(&self) -> Option<f64> {
        self.last_peak_time
    }

    pub fn adaptive_threshold(&self) -> f32 {
        self.adaptive_threshold
    }

    pub fn last_active_threshold(&self) -> f32 {
        self.last_active_threshold
    }

    pub fn history_len(&self) -> usize {
        self.energy_history.len()
    }
}
