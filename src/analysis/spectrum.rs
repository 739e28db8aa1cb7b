// Magnitude spectrum computation with Hann windowing
//
// A thin layer over rustfft: window the signal to reduce spectral leakage,
// run a forward FFT, and keep the magnitudes of the positive-frequency bins.

use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrum of a real-valued signal.
///
/// Holds the magnitudes of bins `0..=N/2` (positive frequencies only,
/// exploiting the symmetry of a real-input FFT) and the frequency width of
/// one bin.
pub struct Spectrum {
    magnitudes: Vec<f32>,
    resolution_hz: f64,
}

impl Spectrum {
    /// Compute the spectrum of `samples` at the given sample rate.
    ///
    /// A symmetric Hann window is applied before the FFT. The input length
    /// sets the resolution: `resolution_hz = sample_rate / samples.len()`.
    ///
    /// # Panics
    /// Panics when `samples` is empty; callers validate input length first.
    pub fn of(samples: &[f32], sample_rate: u32) -> Self {
        assert!(!samples.is_empty(), "spectrum input must not be empty");
        let n = samples.len();

        // Symmetric Hann window; a single sample degenerates to no window
        let denom = (n.saturating_sub(1)).max(1) as f32;
        let mut buffer: Vec<Complex<f32>> = samples
            .iter()
            .enumerate()
            .map(|(i, &sample)| {
                let window =
                    0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / denom).cos());
                Complex::new(sample * window, 0.0)
            })
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let magnitudes = buffer[..n / 2 + 1].iter().map(|c| c.norm()).collect();
        Self {
            magnitudes,
            resolution_hz: sample_rate as f64 / n as f64,
        }
    }

    /// Magnitudes of bins `0..=N/2`
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Frequency width of one bin in Hz
    pub fn resolution_hz(&self) -> f64 {
        self.resolution_hz
    }

    /// Index of the strongest bin
    pub fn dominant_bin(&self) -> usize {
        self.magnitudes
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(bin, _)| bin)
            .unwrap_or(0)
    }

    /// Center frequency of a bin in Hz
    pub fn frequency_of(&self, bin: usize) -> f64 {
        bin as f64 * self.resolution_hz
    }

    /// Magnitude of the bin nearest to `frequency_hz`, clamped to Nyquist
    pub fn magnitude_near(&self, frequency_hz: f64) -> f32 {
        let bin = (frequency_hz / self.resolution_hz).round() as usize;
        let bin = bin.min(self.magnitudes.len() - 1);
        self.magnitudes[bin]
    }
}
