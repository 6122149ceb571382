//! # Frame Sources and Clocks
//!
//! The analysis engine never reaches for a live audio object or a wall
//! clock on its own. Hosts inject both through the traits in this module:
//!
//! - [`FrameSource`] - pull interface returning the current magnitude frame
//! - [`Clock`] - monotonic time in seconds
//!
//! Two concrete sources ship with the crate: [`SpectrumSource`] plays back a
//! decoded audio file through a windowed real FFT, and
//! [`SyntheticPulseSource`] generates deterministic pulse trains.

pub mod clock;
pub mod spectrum;
pub mod synthetic;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use spectrum::SpectrumSource;
pub use synthetic::SyntheticPulseSource;

/// Provider of frequency-domain magnitude frames
pub trait FrameSource {
    /// The frame to analyze now, or `None` when no data is available.
    ///
    /// The slice stays borrowed only until the next call.
    fn current_frame(&mut self) -> Option<&[f32]>;

    /// Whether the source will never produce another frame
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn current_frame(&mut self) -> Option<&[f32]> {
        (**self).current_frame()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}
