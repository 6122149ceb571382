use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use pulse_analyzer::{
    config::Config,
    host::AnalysisHost,
    readout::Readout,
    source::{Clock, FrameSource, ManualClock, MonotonicClock, SpectrumSource, SyntheticPulseSource},
    AnalysisEngine,
};

#[derive(Parser)]
#[command(
    name = "pulse-analyzer",
    version,
    about = "Estimate tempo and loudness from audio, frame by frame",
    long_about = "Pulse-Analyzer runs the real-time tempo and loudness engine used for audio-reactive visuals against an audio file or a synthetic pulse train and prints the readout after every analysis step."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze an audio file (WAV, MP3, FLAC, OGG)
    Analyze {
        /// Audio file path
        file: PathBuf,

        /// Pace playback with the wall clock instead of simulated time
        #[arg(long)]
        realtime: bool,
    },

    /// Analyze a synthetic pulse train
    Simulate {
        /// Pulse tempo in beats per minute
        #[arg(long, default_value_t = 120.0)]
        bpm: f64,

        /// Length of the run in seconds
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,

        /// Constant noise level added to every bin
        #[arg(long, default_value_t = 0.0)]
        noise: f32,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Pulse-Analyzer v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };

    let interval = config.host.poll_interval();

    match cli.command {
        Command::InitConfig { path } => {
            config.save_to_file(&path)?;
            info!("Configuration written to {:?}", path);
        }
        Command::Analyze { file, realtime } => {
            info!("Audio: {:?}", file);
            let source = SpectrumSource::open(&file, config.host.fft_size, interval.as_secs_f64()).await?;
            let engine = AnalysisEngine::with_config(config.engine.clone())?;

            if realtime {
                let mut host = AnalysisHost::new(engine, source, MonotonicClock::new(), interval);
                let mut readings = host.subscribe();
                let readout_config = config.readout.clone();

                // Print readings as the host publishes them
                let printer = tokio::spawn(async move {
                    while readings.changed().await.is_ok() {
                        let reading = *readings.borrow_and_update();
                        let readout = Readout::new(&reading, &readout_config);
                        if readout.is_visible() {
                            println!("{:>8.2}s  {}", reading.timestamp, readout);
                        }
                    }
                });

                host.run(None).await?;
                drop(host);
                printer.await?;
            } else {
                let clock = ManualClock::new(0.0);
                let host = AnalysisHost::new(engine, source, clock.clone(), interval);
                run_simulated(host, &clock, interval, &config)?;
            }
        }
        Command::Simulate { bpm, seconds, noise } => {
            info!("Simulating {:.1} BPM pulse for {:.1}s", bpm, seconds);
            let source = SyntheticPulseSource::new(64, interval.as_secs_f64())?
                .with_pulse(bpm, 10.0)?
                .with_noise_floor(noise)
                .with_duration(seconds);
            let engine = AnalysisEngine::with_config(config.engine.clone())?;

            let clock = ManualClock::new(0.0);
            let host = AnalysisHost::new(engine, source, clock.clone(), interval);
            run_simulated(host, &clock, interval, &config)?;
        }
    }

    Ok(())
}

/// Tick through the whole source as fast as possible on simulated time
fn run_simulated<S: FrameSource, C: Clock>(
    mut host: AnalysisHost<S, C>,
    clock: &ManualClock,
    interval: Duration,
    config: &Config,
) -> Result<()> {
    while !host.source_exhausted() {
        if host.tick()?.peak_accepted() {
            tracing::debug!("Peak at {:.2}s", clock.now());
        }

        let reading = host.reading();
        let readout = Readout::new(&reading, &config.readout);
        if readout.is_visible() {
            println!("{:>8.2}s  {}", clock.now(), readout);
        }
        clock.advance(interval.as_secs_f64());
    }

    let diagnostics = host.engine().diagnostics();
    info!(
        "Done: {:.1} BPM (raw {:.1}), {} peaks in window, {} steps ({} skipped)",
        host.engine().smoothed_tempo(),
        host.engine().tempo_estimate(),
        diagnostics.peaks_in_window,
        diagnostics.steps_processed,
        diagnostics.steps_skipped
    );
    Ok(())
}
