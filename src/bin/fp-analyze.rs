//! Offline verification of a captured tone.
//!
//! Reads a WAV file (typically written by `fp-demo --capture`), mixes it to
//! mono, and reports the dominant frequency, the first harmonics, and the
//! peak-vs-rest margin. With `--expect-hz` the exit code says whether the
//! capture really contains the expected tone, so sound checks can run
//! unattended.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use fp_audio::analysis::{analyze_tone, to_mono, ToneReport};
use fp_audio::error::log_analysis_error;

#[derive(Parser, Debug)]
#[command(
    name = "fp-analyze",
    about = "Verify that a captured WAV file contains the expected tone"
)]
struct Cli {
    /// WAV file to analyze
    wav: PathBuf,

    /// Print the report as JSON instead of the human-readable table
    #[arg(long)]
    json: bool,

    /// Expected dominant frequency in Hz; exit code 2 when it is missed
    #[arg(long)]
    expect_hz: Option<f64>,

    /// Allowed deviation for --expect-hz in Hz
    #[arg(long, default_value_t = 2.0)]
    tolerance_hz: f64,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let (samples, sample_rate, channels) = read_wav(&cli.wav)?;
    let mono = to_mono(&samples, channels)
        .map_err(|err| {
            log_analysis_error(&err, "to_mono");
            err
        })
        .with_context(|| format!("mixing {} down to mono", cli.wav.display()))?;
    let report = analyze_tone(&mono, sample_rate)
        .map_err(|err| {
            log_analysis_error(&err, "analyze_tone");
            err
        })
        .with_context(|| format!("analyzing {}", cli.wav.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&cli.wav, sample_rate, channels, mono.len(), &report);
    }

    if let Some(expect_hz) = cli.expect_hz {
        let deviation = (report.dominant_hz - expect_hz).abs();
        if deviation > cli.tolerance_hz {
            eprintln!(
                "FAIL: dominant {:.2} Hz misses expected {:.2} Hz by {:.2} Hz (tolerance {:.2})",
                report.dominant_hz, expect_hz, deviation, cli.tolerance_hz
            );
            return Ok(ExitCode::from(2));
        }
        println!(
            "OK: dominant {:.2} Hz within {:.2} Hz of expected {:.2} Hz",
            report.dominant_hz, cli.tolerance_hz, expect_hz
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Read a WAV file into interleaved f32 samples.
///
/// Float files are taken as-is; 16/24/32-bit integer files are normalized by
/// the maximum of their width. Other widths are rejected.
fn read_wav(path: &Path) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        bail!("{} has zero channels", path.display());
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .with_context(|| format!("reading {}", path.display()))?,
        hound::SampleFormat::Int => {
            let scale = match spec.bits_per_sample {
                16 => i16::MAX as f32,
                24 => ((1 << 23) - 1) as f32,
                32 => i32::MAX as f32,
                bits => bail!(
                    "{} uses unsupported integer width {} bits",
                    path.display(),
                    bits
                ),
            };
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / scale))
                .collect::<Result<Vec<f32>, _>>()
                .with_context(|| format!("reading {}", path.display()))?
        }
    };

    Ok((samples, spec.sample_rate, spec.channels))
}

fn print_report(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    frames: usize,
    report: &ToneReport,
) {
    println!("File: {}", path.display());
    println!(
        "Format: {} Hz, {} channel(s), {:.2} s",
        sample_rate,
        channels,
        frames as f64 / sample_rate as f64
    );
    println!(
        "Analyzed: {} samples, resolution {:.3} Hz/bin",
        report.analyzed_samples, report.resolution_hz
    );
    println!("Dominant frequency: {:.2} Hz", report.dominant_hz);
    println!("Harmonics:");
    for peak in &report.harmonics {
        println!(
            "  {}: {:9.1} Hz  magnitude {:.3e}",
            peak.harmonic, peak.frequency_hz, peak.magnitude
        );
    }
    println!("Peak-vs-rest: {:.2} dB", report.peak_to_rest_db);
}
