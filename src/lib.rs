//! # Pulse-Analyzer
//!
//! Real-time tempo and loudness estimation for audio-reactive visuals.
//!
//! An upstream analyzer hands over one frequency-domain frame roughly every
//! 100 ms. This library turns that stream into two continuously updated
//! signals: a smoothed tempo estimate in BPM and an instantaneous dBA-like
//! loudness level, plus enough detector state to draw debug overlays.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulse_analyzer::{
//!     config::Config,
//!     host::AnalysisHost,
//!     source::{ManualClock, SpectrumSource},
//!     AnalysisEngine,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let interval = config.host.poll_interval();
//! let source = SpectrumSource::open("song.wav", config.host.fft_size, interval.as_secs_f64()).await?;
//! let clock = ManualClock::new(0.0);
//!
//! let engine = AnalysisEngine::with_config(config.engine.clone())?;
//! let mut host = AnalysisHost::new(engine, source, clock.clone(), interval);
//!
//! while !host.source_exhausted() {
//!     host.tick()?;
//!     clock.advance(interval.as_secs_f64());
//! }
//! println!("Tempo: {:.1} BPM", host.reading().smoothed_tempo);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`audio`] - The analysis engine and its pipeline stages
//! - [`source`] - Frame source and clock capabilities injected into hosts
//! - [`host`] - Timer-driven polling loop publishing readings
//! - [`readout`] - Text formatting of readings
//! - [`config`] - Configuration management

pub mod audio;
pub mod config;
pub mod error;
pub mod host;
pub mod readout;
pub mod source;

// Re-export commonly used types for convenience
pub use crate::{
    audio::{AnalysisEngine, EngineConfig, Reading},
    config::Config,
    error::{PulseError, Result},
    host::AnalysisHost,
};
