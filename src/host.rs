//! # Polling Host
//!
//! Drives an [`AnalysisEngine`] from an injected [`FrameSource`] and
//! [`Clock`] on a fixed cadence, and publishes a [`Reading`] after every
//! tick. Consumers subscribe to readings and never touch engine state.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use pulse_analyzer::{
//!     audio::AnalysisEngine,
//!     host::AnalysisHost,
//!     source::{MonotonicClock, SyntheticPulseSource},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let source = SyntheticPulseSource::new(64, 0.1)?.with_pulse(120.0, 10.0)?;
//! let mut host = AnalysisHost::new(
//!     AnalysisEngine::new(),
//!     source,
//!     MonotonicClock::new(),
//!     Duration::from_millis(100),
//! );
//!
//! let readings = host.subscribe();
//! host.run(Some(60)).await?;
//! println!("BPM: {:.1}", readings.borrow().smoothed_tempo);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::audio::engine::{AnalysisEngine, StepOutcome};
use crate::audio::types::Reading;
use crate::error::Result;
use crate::source::{Clock, FrameSource};

/// Owns the engine, its frame source and its clock
pub struct AnalysisHost<S, C> {
    engine: AnalysisEngine,
    source: S,
    clock: C,
    interval: Duration,
    readings: watch::Sender<Reading>,
}

impl<S: FrameSource, C: Clock> AnalysisHost<S, C> {
    pub fn new(engine: AnalysisEngine, source: S, clock: C, interval: Duration) -> Self {
        let (readings, _) = watch::channel(engine.reading());
        Self {
            engine,
            source,
            clock,
            interval,
            readings,
        }
    }

    /// Receiver that always holds the latest reading
    pub fn subscribe(&self) -> watch::Receiver<Reading> {
        self.readings.subscribe()
    }

    /// Latest published reading
    pub fn reading(&self) -> Reading {
        *self.readings.borrow()
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_exhausted(&self) -> bool {
        self.source.is_exhausted()
    }

    /// Run one analysis step against the current frame and clock time
    pub fn tick(&mut self) -> Result<StepOutcome> {
        let timestamp = self.clock.now();
        let frame = self.source.current_frame().unwrap_or(&[]);
        let outcome = self.engine.step(frame, timestamp)?;

        if let StepOutcome::Analyzed(_) = outcome {
            // send_replace never fails even with no subscribers
            self.readings.send_replace(self.engine.reading());
        }
        Ok(outcome)
    }

    /// Tick on the host interval until the source runs dry or
    /// `max_ticks` ticks have run; returns the number of ticks.
    ///
    /// Recoverable step errors drop that tick and the run continues.
    pub async fn run(&mut self, max_ticks: Option<usize>) -> Result<usize> {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Analysis host started ({} ms interval)", self.interval.as_millis());

        let mut ticks = 0;
        while max_ticks.map_or(true, |max| ticks < max) && !self.source.is_exhausted() {
            interval.tick().await;
            match self.tick() {
                Ok(_) => {}
                Err(err) if err.is_recoverable() => {
                    tracing::warn!("Dropping tick: {}", err);
                }
                Err(err) => return Err(err),
            }
            ticks += 1;
        }

        let reading = self.reading();
        tracing::info!(
            "Analysis host stopped after {} ticks: {:.1} BPM, {:.0} dBA",
            ticks,
            reading.smoothed_tempo,
            reading.volume_level
        );
        Ok(ticks)
    }

    /// Reset the engine and publish the cleared reading
    pub fn reset(&mut self) {
        self.engine.reset();
        self.readings.send_replace(self.engine.reading());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ManualClock, SyntheticPulseSource};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::cell::Cell;

    /// Clock that replays a fixed list of readings, then repeats the last
    struct ScriptedClock {
        times: Vec<f64>,
        next: Cell<usize>,
    }

    impl ScriptedClock {
        fn new(times: Vec<f64>) -> Self {
            Self { times, next: Cell::new(0) }
        }
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> f64 {
            let i = self.next.get().min(self.times.len() - 1);
            self.next.set(i + 1);
            self.times[i]
        }
    }

    /// Source that alternates between no data and a fixed frame
    struct FlakySource {
        frame: Vec<f32>,
        calls: usize,
    }

    impl FrameSource for FlakySource {
        fn current_frame(&mut self) -> Option<&[f32]> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                None
            } else {
                Some(self.frame.as_slice())
            }
        }
    }

    #[test]
    fn test_tick_publishes_readings() {
        let clock = ManualClock::new(0.0);
        let source = SyntheticPulseSource::new(64, 0.1).unwrap().with_pulse(120.0, 10.0).unwrap();
        let mut host = AnalysisHost::new(AnalysisEngine::new(), source, clock.clone(), Duration::from_millis(100));
        let receiver = host.subscribe();

        for _ in 0..40 {
            host.tick().unwrap();
            clock.advance(0.1);
        }

        let reading = *receiver.borrow();
        assert!((reading.smoothed_tempo - 120.0).abs() < 2.4);
        assert!((reading.timestamp - 3.9).abs() < 1e-9);
        assert_eq!(reading.diagnostics.steps_processed, 40);
    }

    #[test]
    fn test_missing_frames_are_skipped() {
        let clock = ManualClock::new(0.0);
        let source = FlakySource { frame: vec![0.1; 64], calls: 0 };
        let mut host = AnalysisHost::new(AnalysisEngine::new(), source, clock.clone(), Duration::from_millis(100));

        let mut skipped = 0;
        for _ in 0..10 {
            if host.tick().unwrap() == StepOutcome::Skipped {
                skipped += 1;
            }
            clock.advance(0.1);
        }

        assert_eq!(skipped, 5);
        assert_eq!(host.engine().diagnostics().steps_processed, 5);
        assert_eq!(host.engine().diagnostics().steps_skipped, 5);
    }

    #[test]
    fn test_jittered_clock_still_tracks_tempo() {
        let clock = ManualClock::new(0.0);
        let source = SyntheticPulseSource::new(64, 0.1).unwrap().with_pulse(120.0, 10.0).unwrap();
        let mut host = AnalysisHost::new(AnalysisEngine::new(), source, clock.clone(), Duration::from_millis(100));
        let mut rng = SmallRng::seed_from_u64(3);

        // Nominal 100 ms cadence, each tick stamped up to 20 ms early or late
        for i in 0..100 {
            clock.set(i as f64 * 0.1 + rng.gen_range(-0.02..0.02));
            host.tick().unwrap();
        }

        let bpm = host.reading().smoothed_tempo;
        assert!((108.0..=132.0).contains(&bpm), "smoothed tempo {}", bpm);
    }

    #[test]
    fn test_reset_publishes_cleared_reading() {
        let clock = ManualClock::new(0.0);
        let source = SyntheticPulseSource::new(64, 0.1).unwrap().with_pulse(120.0, 10.0).unwrap();
        let mut host = AnalysisHost::new(AnalysisEngine::new(), source, clock.clone(), Duration::from_millis(100));
        let receiver = host.subscribe();

        for _ in 0..20 {
            host.tick().unwrap();
            clock.advance(0.1);
        }
        assert!(receiver.borrow().smoothed_tempo > 0.0);

        host.reset();
        assert_eq!(receiver.borrow().smoothed_tempo, 0.0);
        assert_eq!(receiver.borrow().volume_level, 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_when_source_is_exhausted() {
        let source = SyntheticPulseSource::new(64, 0.1)
            .unwrap()
            .with_pulse(120.0, 10.0)
            .unwrap()
            .with_duration(3.0);
        let clock = ManualClock::new(0.0);
        let mut host = AnalysisHost::new(AnalysisEngine::new(), source, clock, Duration::from_millis(100));

        let ticks = host.run(None).await.unwrap();
        assert_eq!(ticks, 30);
        assert!(host.source_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_respects_max_ticks() {
        let source = SyntheticPulseSource::new(64, 0.1).unwrap();
        let mut host = AnalysisHost::new(
            AnalysisEngine::new(),
            source,
            crate::source::MonotonicClock::new(),
            Duration::from_millis(100),
        );

        let ticks = host.run(Some(7)).await.unwrap();
        assert_eq!(ticks, 7);
        assert_eq!(host.reading().diagnostics.steps_processed, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_clock_regression() {
        let clock = ScriptedClock::new(vec![0.0, 0.1, 0.05, 0.2, 0.3]);
        let source = SyntheticPulseSource::new(64, 0.1).unwrap();
        let mut host = AnalysisHost::new(AnalysisEngine::new(), source, clock, Duration::from_millis(100));

        let ticks = host.run(Some(5)).await.unwrap();
        assert_eq!(ticks, 5);
        assert_eq!(host.engine().diagnostics().steps_processed, 4);
        assert!((host.reading().timestamp - 0.3).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_non_finite_clock() {
        let clock = ScriptedClock::new(vec![0.0, f64::NAN]);
        let source = SyntheticPulseSource::new(64, 0.1).unwrap();
        let mut host = AnalysisHost::new(AnalysisEngine::new(), source, clock, Duration::from_millis(100));

        let err = host.run(Some(5)).await.unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(host.engine().diagnostics().steps_processed, 1);
    }
}
