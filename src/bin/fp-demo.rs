//! Demo: play a sine tone through the audio engine for a few seconds.
//!
//! Walks the whole stack once: build a driver, initialize the engine, open
//! the default output device, stream a 440 Hz tone, stop, tear down. Every
//! native return status is checked; the first failure aborts the run.
//!
//! With `--capture <path>` the rendered samples are also recorded to a WAV
//! file, which `fp-analyze` can verify afterwards.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fp_audio::capture::{self, Tee, WavCaptureWorker};
use fp_audio::config::AppConfig;
use fp_audio::engine::{AudioDriver, Engine, Render, StreamParams};
use fp_audio::synth::SineOscillator;

#[derive(Parser, Debug)]
#[command(
    name = "fp-demo",
    about = "Play a test tone through the freepiano_minimal audio engine"
)]
struct Cli {
    /// Tone frequency in Hz (default 440)
    #[arg(long)]
    frequency_hz: Option<f64>,

    /// Linear tone amplitude in [0, 1] (default 0.2)
    #[arg(long)]
    amplitude: Option<f64>,

    /// Output sample rate in Hz (default 48000)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Interleaved channel count (default 2)
    #[arg(long)]
    channels: Option<u16>,

    /// Frames per callback buffer, 0 lets the driver choose (default 256)
    #[arg(long)]
    frames_per_buffer: Option<u32>,

    /// Playback duration in milliseconds
    #[arg(long, default_value_t = 5_000)]
    duration_ms: u64,

    /// Record the rendered samples to a WAV file
    #[arg(long)]
    capture: Option<PathBuf>,

    /// JSON config file; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };

    let params = StreamParams {
        sample_rate: cli.sample_rate.unwrap_or(config.stream.sample_rate),
        channels: cli.channels.unwrap_or(config.stream.channels),
        frames_per_buffer: cli
            .frames_per_buffer
            .unwrap_or(config.stream.frames_per_buffer),
    };
    let frequency_hz = cli.frequency_hz.unwrap_or(config.tone.frequency_hz);
    let amplitude = cli.amplitude.unwrap_or(config.tone.amplitude);

    println!("fp-demo starting");

    let mut engine = Engine::init(build_driver()?).context("initializing the audio engine")?;
    engine
        .open_default_device(params)
        .context("opening the default output device")?;

    let oscillator = SineOscillator::new(frequency_hz, params.sample_rate, amplitude);
    let (renderer, capture_worker): (Box<dyn Render>, Option<WavCaptureWorker>) =
        match &cli.capture {
            Some(path) => {
                let (tap, worker) = capture::spawn_wav_writer(
                    path,
                    params.sample_rate,
                    params.channels,
                    config.capture.ring_capacity,
                )
                .with_context(|| format!("creating capture file {}", path.display()))?;
                (Box::new(Tee::new(oscillator, tap)), Some(worker))
            }
            None => (Box::new(oscillator), None),
        };

    engine
        .start_stream(renderer)
        .context("starting the output stream")?;
    info!(
        "[fp-demo] Tone: {:.1} Hz at amplitude {:.2} ({} driver)",
        frequency_hz,
        amplitude,
        engine.driver_name()
    );
    println!(
        "Streaming for {:.1} seconds...",
        cli.duration_ms as f64 / 1_000.0
    );
    thread::sleep(Duration::from_millis(cli.duration_ms));

    // Dropping the renderer releases the capture tap, which lets the writer
    // drain the ring and finalize the file.
    drop(engine.stop_stream().context("stopping the output stream")?);

    if let Some(worker) = capture_worker {
        let stats = worker.finish().context("finalizing the capture file")?;
        info!(
            "[fp-demo] Capture finished: {} samples written, {} dropped",
            stats.samples_written, stats.samples_dropped
        );
    }

    engine.shutdown().context("shutting the engine down")?;
    println!("Stopped");
    Ok(())
}

#[cfg(feature = "freepiano")]
fn build_driver() -> Result<Box<dyn AudioDriver>> {
    let driver = fp_audio::engine::FreepianoDriver::claim()
        .context("claiming the native freepiano_minimal engine")?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "freepiano"))]
fn build_driver() -> Result<Box<dyn AudioDriver>> {
    tracing::warn!(
        "[fp-demo] Built without the freepiano feature; using the stub driver (no sound)"
    );
    Ok(Box::new(fp_audio::engine::StubDriver::paced()))
}
