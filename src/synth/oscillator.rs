//! Sine oscillator - deterministic test tone generation
//!
//! This module provides the sine source that feeds the output callback.
//! Key features:
//! - f64 phase accumulator for drift-free long runs
//! - Phase wrapped into [0, 2π) after every sample
//! - Phase-continuous across buffer boundaries of any size
//! - Zero allocations in the fill path

use std::f64::consts::TAU;

use crate::engine::callback::Render;

/// Frequency of the standard test tone in Hz
pub const DEFAULT_FREQUENCY_HZ: f64 = 440.0;
/// Linear amplitude of the standard test tone
pub const DEFAULT_AMPLITUDE: f64 = 0.2;

/// Sine wave generator with an explicit phase accumulator.
///
/// The phase advances by `2π · frequency / sample_rate` per sample and is
/// kept in `[0, 2π)` by subtracting `2π` on overflow. Sample values are
/// computed in f64 and cast to f32 once, so consecutive buffers of any size
/// produce the same sample sequence as one large buffer.
///
/// # Examples
/// ```
/// use fp_audio::synth::SineOscillator;
///
/// let mut osc = SineOscillator::new(440.0, 48_000, 0.2);
/// assert_eq!(osc.next_sample(), 0.0); // sin(0) * 0.2
/// assert!(osc.phase() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct SineOscillator {
    /// Current phase in radians, always in [0, 2π)
    phase: f64,
    /// Phase increment per sample in radians
    step: f64,
    /// Linear output amplitude
    amplitude: f64,
}

impl SineOscillator {
    /// Create an oscillator for the given frequency, sample rate, and amplitude.
    ///
    /// # Arguments
    /// * `frequency_hz` - Tone frequency in Hz
    /// * `sample_rate` - Output sample rate in Hz
    /// * `amplitude` - Linear amplitude, typically in [0, 1]
    pub fn new(frequency_hz: f64, sample_rate: u32, amplitude: f64) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency_hz / sample_rate as f64,
            amplitude,
        }
    }

    /// Produce the next sample and advance the phase by one step.
    ///
    /// # Returns
    /// `amplitude * sin(phase)` for the phase before the advance
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let sample = (self.phase.sin() * self.amplitude) as f32;
        self.phase += self.step;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        sample
    }

    /// Fill an interleaved buffer, duplicating each frame's sample across
    /// all channels.
    ///
    /// The buffer length must be `frames * channels`; every slot is written.
    ///
    /// # Arguments
    /// * `interleaved` - Output buffer in frame-major interleaved layout
    /// * `channels` - Channels per frame (2 = stereo)
    pub fn fill_interleaved(&mut self, interleaved: &mut [f32], channels: u16) {
        if channels == 0 {
            return;
        }
        for frame in interleaved.chunks_mut(channels as usize) {
            let sample = self.next_sample();
            for slot in frame {
                *slot = sample;
            }
        }
    }

    /// Current phase in radians, in [0, 2π)
    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl Render for SineOscillator {
    fn render(&mut self, interleaved: &mut [f32], channels: u16) {
        self.fill_interleaved(interleaved, channels);
    }
}
