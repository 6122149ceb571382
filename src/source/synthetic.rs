use std::ops::Range;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SourceError};
use crate::source::FrameSource;

/// Deterministic generator of pulse-train magnitude frames.
///
/// Frames are produced on a fixed `frame_interval`. The first frame at or
/// after each pulse time carries `pulse_magnitude` in the pulse bins; every
/// other frame carries only the noise floor (plus optional seeded jitter).
#[derive(Debug, Clone)]
pub struct SyntheticPulseSource {
    frame: Vec<f32>,
    frame_interval: f64,
    pulse_period: Option<f64>,
    pulse_bins: Range<usize>,
    pulse_magnitude: f32,
    noise_floor: f32,
    jitter: f32,
    rng: SmallRng,
    total_frames: Option<usize>,
    index: usize,
}

impl SyntheticPulseSource {
    /// Silent source of `bins`-wide frames every `frame_interval` seconds
    pub fn new(bins: usize, frame_interval: f64) -> Result<Self> {
        if bins == 0 {
            return Err(SourceError::InvalidParameters {
                details: "Frames need at least one bin".to_string(),
            }
            .into());
        }

        if !(frame_interval.is_finite() && frame_interval > 0.0) {
            return Err(SourceError::InvalidParameters {
                details: format!("Frame interval must be positive, got {}", frame_interval),
            }
            .into());
        }

        Ok(Self {
            frame: vec![0.0; bins],
            frame_interval,
            pulse_period: None,
            pulse_bins: 2..(bins.min(11)),
            pulse_magnitude: 10.0,
            noise_floor: 0.0,
            jitter: 0.0,
            rng: SmallRng::seed_from_u64(0),
            total_frames: None,
            index: 0,
        })
    }

    /// Add a pulse at `bpm` with the given magnitude in the low bins
    pub fn with_pulse(mut self, bpm: f64, magnitude: f32) -> Result<Self> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(SourceError::InvalidParameters {
                details: format!("Pulse tempo must be positive, got {}", bpm),
            }
            .into());
        }

        self.pulse_period = Some(60.0 / bpm);
        self.pulse_magnitude = magnitude;
        Ok(self)
    }

    /// Bins that carry the pulse; clipped to the frame width
    pub fn with_pulse_bins(mut self, bins: Range<usize>) -> Self {
        let len = self.frame.len();
        self.pulse_bins = bins.start.min(len)..bins.end.min(len);
        self
    }

    /// Constant magnitude added to every bin of every frame
    pub fn with_noise_floor(mut self, level: f32) -> Self {
        self.noise_floor = level.max(0.0);
        self
    }

    /// Uniform random magnitude in `[0, amount)` added per bin, seeded
    pub fn with_jitter(mut self, amount: f32, seed: u64) -> Self {
        self.jitter = amount.max(0.0);
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Stop after `seconds` of frames
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.total_frames = Some((seconds / self.frame_interval).round().max(0.0) as usize);
        self
    }

    /// Time of the frame the next call will produce
    pub fn next_frame_time(&self) -> f64 {
        self.index as f64 * self.frame_interval
    }

    pub fn frame_interval(&self) -> f64 {
        self.frame_interval
    }

    fn pulse_due(&self) -> bool {
        let Some(period) = self.pulse_period else {
            return false;
        };
        if self.index == 0 {
            return true;
        }

        // Tolerance absorbs float error when the period is a multiple of the interval
        let beat = |i: usize| ((i as f64 * self.frame_interval) / period + 1e-9).floor();
        beat(self.index) != beat(self.index - 1)
    }

    fn render(&mut self) {
        let pulse = self.pulse_due();

        for (bin, value) in self.frame.iter_mut().enumerate() {
            let mut magnitude = self.noise_floor;
            if self.jitter > 0.0 {
                magnitude += self.rng.gen_range(0.0..self.jitter);
            }
            if pulse && self.pulse_bins.contains(&bin) {
                magnitude += self.pulse_magnitude;
            }
            *value = magnitude;
        }
    }
}

impl FrameSource for SyntheticPulseSource {
    fn current_frame(&mut self) -> Option<&[f32]> {
        if self.is_exhausted() {
            return None;
        }

        self.render();
        self.index += 1;
        Some(self.frame.as_slice())
    }

    fn is_exhausted(&self) -> bool {
        self.total_frames.is_some_and(|total| self.index >= total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse_indices(source: &mut SyntheticPulseSource, frames: usize) -> Vec<usize> {
        (0..frames)
            .filter(|_| source.current_frame().map(|f| f[2] > 1.0).unwrap_or(false))
            .collect()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(SyntheticPulseSource::new(0, 0.1).is_err());
        assert!(SyntheticPulseSource::new(64, 0.0).is_err());
        assert!(SyntheticPulseSource::new(64, 0.1).unwrap().with_pulse(-1.0, 1.0).is_err());
    }

    #[test]
    fn test_pulse_every_half_second() {
        let mut source = SyntheticPulseSource::new(64, 0.1).unwrap().with_pulse(120.0, 10.0).unwrap();
        assert_eq!(pulse_indices(&mut source, 20), vec![0, 5, 10, 15]);
    }

    #[test]
    fn test_pulse_off_the_sampling_grid() {
        // 0.45 s period on a 0.1 s grid: first frame at or after each pulse
        let mut source = SyntheticPulseSource::new(64, 0.1)
            .unwrap()
            .with_pulse(60.0 / 0.45, 10.0)
            .unwrap();
        assert_eq!(pulse_indices(&mut source, 20), vec![0, 5, 9, 14, 18]);
    }

    #[test]
    fn test_noise_floor_and_duration() {
        let mut source = SyntheticPulseSource::new(8, 0.1)
            .unwrap()
            .with_noise_floor(0.05)
            .with_duration(1.0);

        let mut frames = 0;
        while let Some(frame) = source.current_frame() {
            assert!(frame.iter().all(|&m| m == 0.05));
            frames += 1;
        }
        assert_eq!(frames, 10);
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_jitter_is_seeded() {
        let make = || SyntheticPulseSource::new(16, 0.1).unwrap().with_jitter(0.2, 42);
        let mut a = make();
        let mut b = make();

        for _ in 0..5 {
            let fa = a.current_frame().unwrap().to_vec();
            let fb = b.current_frame().unwrap().to_vec();
            assert_eq!(fa, fb);
            assert!(fa.iter().all(|&m| (0.0..0.2).contains(&m)));
        }
    }

    #[test]
    fn test_pulse_bins_are_clipped() {
        let mut source = SyntheticPulseSource::new(4, 0.1)
            .unwrap()
            .with_pulse(120.0, 3.0)
            .unwrap()
            .with_pulse_bins(1..100);
        assert_eq!(source.current_frame().unwrap(), &[0.0, 3.0, 3.0, 3.0]);
    }
}
