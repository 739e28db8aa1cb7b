//! Offline tone verification
//!
//! Answers the question "does this recording actually contain the tone the
//! demo claims to have played?" without any audio hardware: mix the capture
//! down to mono, take a windowed FFT, and report the dominant frequency,
//! the first few harmonics, and how far the peak towers over the rest of the
//! spectrum.
//!
//! The functions here are pure; file I/O lives in the analyzer binary.

use serde::Serialize;

use crate::error::AnalysisError;

pub mod spectrum;

use spectrum::Spectrum;

/// Smallest input the analysis accepts, in samples
pub const MIN_ANALYSIS_SAMPLES: usize = 32;

/// Leading portion skipped when enough signal remains, in seconds.
///
/// Stream starts can carry ramp-in artifacts from the device; the analysis
/// prefers the steady-state portion.
const SKIP_LEAD_SECS: f64 = 0.1;

/// Longest analyzed segment in seconds; more adds resolution the verdict
/// does not need.
const MAX_SEGMENT_SECS: u64 = 3;

/// Number of harmonics reported, counting the fundamental
const HARMONIC_COUNT: u32 = 5;

/// Magnitude of one harmonic of the dominant frequency
#[derive(Debug, Clone, Serialize)]
pub struct HarmonicPeak {
    /// Harmonic number (1 = fundamental)
    pub harmonic: u32,
    /// Center frequency of the nearest bin in Hz
    pub frequency_hz: f64,
    /// Magnitude at that bin
    pub magnitude: f32,
}

/// Result of [`analyze_tone`]
#[derive(Debug, Clone, Serialize)]
pub struct ToneReport {
    /// Frequency of the strongest bin in Hz
    pub dominant_hz: f64,
    /// Nearest-bin magnitudes for harmonics 1..=5 of the dominant frequency,
    /// stopping at Nyquist
    pub harmonics: Vec<HarmonicPeak>,
    /// Energy of the dominant bin versus everything else, in dB
    pub peak_to_rest_db: f64,
    /// Number of samples in the analyzed segment
    pub analyzed_samples: usize,
    /// Frequency width of one spectrum bin in Hz
    pub resolution_hz: f64,
}

/// Mix an interleaved buffer down to one sample per frame (frame mean).
///
/// # Errors
/// [`AnalysisError::InvalidChannelCount`] when `channels` is zero.
pub fn to_mono(interleaved: &[f32], channels: u16) -> Result<Vec<f32>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::InvalidChannelCount { channels });
    }
    let channels = channels as usize;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect())
}

/// Analyze a mono signal for its dominant tone.
///
/// Skips the first 100 ms when enough signal remains, analyzes at most 3
/// seconds, removes DC, and inspects the Hann-windowed magnitude spectrum.
///
/// # Errors
/// [`AnalysisError::EmptyInput`] for an empty signal and
/// [`AnalysisError::TooShort`] below [`MIN_ANALYSIS_SAMPLES`].
pub fn analyze_tone(mono: &[f32], sample_rate: u32) -> Result<ToneReport, AnalysisError> {
    if mono.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    if mono.len() < MIN_ANALYSIS_SAMPLES {
        return Err(AnalysisError::TooShort {
            samples: mono.len(),
            needed: MIN_ANALYSIS_SAMPLES,
        });
    }

    let segment = select_segment(mono, sample_rate);

    // Remove DC so bin 0 does not mask the tone
    let mean = segment.iter().sum::<f32>() / segment.len() as f32;
    let centered: Vec<f32> = segment.iter().map(|&sample| sample - mean).collect();

    let spectrum = Spectrum::of(&centered, sample_rate);
    let dominant_bin = spectrum.dominant_bin();
    let dominant_hz = spectrum.frequency_of(dominant_bin);
    let nyquist_hz = sample_rate as f64 / 2.0;

    let harmonics = (1..=HARMONIC_COUNT)
        .map(|harmonic| dominant_hz * harmonic as f64)
        .take_while(|&target_hz| target_hz <= nyquist_hz)
        .enumerate()
        .map(|(i, target_hz)| HarmonicPeak {
            harmonic: i as u32 + 1,
            frequency_hz: nearest_bin_frequency(&spectrum, target_hz),
            magnitude: spectrum.magnitude_near(target_hz),
        })
        .collect();

    let peak_energy = (spectrum.magnitudes()[dominant_bin] as f64).powi(2);
    let total_energy: f64 = spectrum
        .magnitudes()
        .iter()
        .map(|&magnitude| (magnitude as f64).powi(2))
        .sum();
    let rest_energy = (total_energy - peak_energy).max(1e-20);
    let peak_to_rest_db = 10.0 * ((peak_energy + 1e-20) / rest_energy).log10();

    Ok(ToneReport {
        dominant_hz,
        harmonics,
        peak_to_rest_db,
        analyzed_samples: centered.len(),
        resolution_hz: spectrum.resolution_hz(),
    })
}

/// Pick the analyzed slice: skip the lead-in when the rest is still long
/// enough, then cap the length.
fn select_segment(mono: &[f32], sample_rate: u32) -> &[f32] {
    let skip = (SKIP_LEAD_SECS * sample_rate as f64) as usize;
    let start = if mono.len().saturating_sub(skip) >= MIN_ANALYSIS_SAMPLES {
        skip
    } else {
        0
    };
    let max_len = (sample_rate as u64 * MAX_SEGMENT_SECS) as usize;
    let end = (start + max_len).min(mono.len());
    &mono[start..end]
}

fn nearest_bin_frequency(spectrum: &Spectrum, target_hz: f64) -> f64 {
    let bin = (target_hz / spectrum.resolution_hz()).round() as usize;
    spectrum.frequency_of(bin.min(spectrum.magnitudes().len() - 1))
}
