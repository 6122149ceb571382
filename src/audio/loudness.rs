//! Instantaneous loudness from a magnitude frame.

use crate::audio::types::EngineConfig;

/// Root-mean-square magnitude over every bin of the frame.
///
/// Returns 0 for an empty frame.
pub fn rms(frame: &[f32]) -> f32 {
    rms_f64(frame) as f32
}

// Squares of large bins overflow f32, so accumulate in f64
fn rms_f64(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = frame.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    (sum_sq / frame.len() as f64).sqrt()
}

/// Map a frame to a dBA-like level in `[volume_floor, volume_ceiling]`.
///
/// Silence (and a NaN bin) yields the floor without evaluating `log10(0)`.
/// Arbitrarily loud frames saturate at the ceiling.
pub fn volume_level(frame: &[f32], config: &EngineConfig) -> f32 {
    let rms = rms_f64(frame);

    if rms.is_nan() || rms <= 0.0 {
        return config.volume_floor;
    }

    let db = (20.0 * rms.log10()) as f32;
    (db + config.volume_offset_db).clamp(config.volume_floor, config.volume_ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_returns_floor() {
        let config = EngineConfig::default();
        assert_eq!(volume_level(&[0.0; 64], &config), 30.0);
        assert_eq!(volume_level(&[0.0], &config), 30.0);
        assert_eq!(volume_level(&[], &config), 30.0);
    }

    #[test]
    fn test_unit_rms_maps_to_offset() {
        let config = EngineConfig::default();
        let level = volume_level(&[1.0; 32], &config);
        assert!((level - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_level_is_clamped() {
        let config = EngineConfig::default();

        // 20 * log10(1e-4) + 90 = 10, below the floor
        assert_eq!(volume_level(&[1e-4; 16], &config), 30.0);

        // 20 * log10(1e3) + 90 = 150, above the ceiling
        assert_eq!(volume_level(&[1e3; 16], &config), 130.0);
    }

    #[test]
    fn test_level_stays_in_range_for_arbitrary_frames() {
        let config = EngineConfig::default();
        let frames: Vec<Vec<f32>> = vec![
            vec![0.5],
            vec![0.0, 0.0, 1e-12],
            (0..256).map(|i| i as f32 * 0.37).collect(),
            vec![f32::MAX; 4],
            vec![f32::NAN, 1.0],
        ];

        for frame in &frames {
            let level = volume_level(frame, &config);
            assert!((30.0..=130.0).contains(&level), "level {} out of range", level);
        }
    }

    #[test]
    fn test_huge_frames_saturate_at_ceiling() {
        let config = EngineConfig::default();
        assert_eq!(volume_level(&[f32::MAX; 4], &config), 130.0);
        assert_eq!(volume_level(&[1e20; 64], &config), 130.0);
        assert_eq!(volume_level(&[f32::INFINITY, 0.0], &config), 130.0);
        assert_eq!(volume_level(&[f32::NAN, 1.0], &config), 30.0);
        assert_eq!(rms(&[f32::MAX; 4]), f32::MAX);
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[3.0, 4.0, 0.0, 0.0]), 2.5);
        assert_eq!(rms(&[]), 0.0);
    }
}
