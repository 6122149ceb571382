//! # Audio Analysis Module
//!
//! Real-time tempo and loudness estimation from frequency-domain frames.
//!
//! ## Pipeline
//!
//! Every analysis step runs the same fixed sequence:
//!
//! - **Loudness**: RMS over all bins mapped to a bounded dBA-like scale
//! - **Band energy**: mean magnitude over the low bins, skipping DC
//! - **Peak detection**: adaptive thresholding with a refractory gap
//! - **Tempo inference**: median peak interval, plausibility band, smoothing
//!
//! ## Usage
//!
//! ```rust
//! use pulse_analyzer::audio::AnalysisEngine;
//!
//! let mut engine = AnalysisEngine::new();
//! let mut frame = vec![0.0f32; 64];
//!
//! for i in 0..60 {
//!     frame[2..11].fill(if i % 5 == 0 { 10.0 } else { 0.0 });
//!     engine.step(&frame, i as f64 * 0.1)?;
//! }
//!
//! assert!((engine.smoothed_tempo() - 120.0).abs() < 1.0);
//! # Ok::<(), pulse_analyzer::PulseError>(())
//! ```

pub mod band_energy;
pub mod engine;
pub mod loader;
pub mod loudness;
pub mod peak_detector;
pub mod tempo;
pub mod types;
pub use engine::{AnalysisEngine, StepOutcome, StepReport};
pub use loader::AudioLoader;
pub use peak_detector::{PeakDecision, PeakDetector};
pub use tempo::{TempoEstimator, TempoUpdate};
pub use types::{
    AudioData, Diagnostics, EngineConfig, Reading
};
