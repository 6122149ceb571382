//! Low-band energy, the raw onset-detection signal.

use std::ops::Range;

use crate::audio::types::EngineConfig;

/// Bins averaged for a frame of `frame_len` bins.
///
/// The range is empty when the frame is too short to reach past
/// `first_band_bin`.
pub fn band_range(frame_len: usize, config: &EngineConfig) -> Range<usize> {
    let end = config.band_cap.min(frame_len / config.band_divisor.max(1));
    let start = config.first_band_bin.min(end);
    start..end
}

/// Mean absolute magnitude over the low-frequency band.
pub fn band_energy(frame: &[f32], config: &EngineConfig) -> f32 {
    let range = band_range(frame.len(), config);
    if range.is_empty() {
        return 0.0;
    }

    let width = range.len();
    let sum: f64 = frame[range].iter().map(|&x| f64::from(x.abs())).sum();
    (sum / width as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_range_reference_sizes() {
        let config = EngineConfig::default();
        assert_eq!(band_range(64, &config), 2..16);
        assert_eq!(band_range(1024, &config), 2..16);
        assert_eq!(band_range(32, &config), 2..8);
    }

    #[test]
    fn test_short_frames_have_no_band() {
        let config = EngineConfig::default();
        assert!(band_range(8, &config).is_empty());
        assert!(band_range(1, &config).is_empty());
        assert_eq!(band_energy(&[5.0; 8], &config), 0.0);
    }

    #[test]
    fn test_huge_band_stays_finite() {
        let config = EngineConfig::default();
        let energy = band_energy(&[f32::MAX; 64], &config);
        assert_eq!(energy, f32::MAX);
    }

    #[test]
    fn test_dc_and_first_bin_are_ignored() {
        let config = EngineConfig::default();
        let mut frame = vec![0.0f32; 64];
        frame[0] = 1000.0;
        frame[1] = 1000.0;
        assert_eq!(band_energy(&frame, &config), 0.0);
    }

    #[test]
    fn test_mean_of_absolute_values() {
        let config = EngineConfig::default();
        let mut frame = vec![0.0f32; 64];
        for bin in 2..16 {
            frame[bin] = if bin % 2 == 0 { 2.0 } else { -2.0 };
        }
        // Bins above the band do not contribute
        frame[40] = 100.0;

        assert!((band_energy(&frame, &config) - 2.0).abs() < 1e-6);
    }
}
