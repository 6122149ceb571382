use std::fmt;

use crate::audio::types::Reading;
use crate::config::ReadoutConfig;

/// Text overlay of a reading: smoothed BPM and loudness, each optional
#[derive(Debug, Clone, Copy)]
pub struct Readout<'a> {
    reading: &'a Reading,
    config: &'a ReadoutConfig,
}

impl<'a> Readout<'a> {
    pub fn new(reading: &'a Reading, config: &'a ReadoutConfig) -> Self {
        Self { reading, config }
    }

    /// Whether anything would be shown
    pub fn is_visible(&self) -> bool {
        self.config.show_bpm || self.config.show_volume
    }
}

impl fmt::Display for Readout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);

        if self.config.show_bpm {
            parts.push(format!("{:.1} BPM", self.reading.smoothed_tempo));
        }
        if self.config.show_volume {
            parts.push(format!("{:.0} dBA", self.reading.volume_level));
        }

        write!(f, "{}", parts.join("  "))
    }
}
