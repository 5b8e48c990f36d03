// FFT module - windowed power spectrum of one segment
//
// This module handles FFT computation with a periodic Hann window and
// constant detrending. The one-sided power spectrum it returns is scaled
// into a density by the Welch estimator in `spectral`.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// FFT processor that computes one-sided power spectra of fixed-size segments
pub struct FftProcessor {
    fft: Arc<dyn Fft<f64>>,
    fft_size: usize,
    /// Periodic Hann window (pre-computed)
    window: Vec<f64>,
    /// Sum of squared window weights, used for density scaling
    window_power: f64,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - Segment length (the analysis window length)
    pub fn new(fft_size: usize) -> Self {
        let window: Vec<f64> = (0..fft_size)
            .map(|i| {
                0.5 - 0.5 * ((2.0 * std::f64::consts::PI * i as f64) / fft_size as f64).cos()
            })
            .collect();
        let window_power = window.iter().map(|w| w * w).sum();

        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            fft_size,
            window,
            window_power,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn window_power(&self) -> f64 {
        self.window_power
    }

    /// Compute |X[k]|^2 for k = 0..=fft_size/2
    ///
    /// Removes the segment mean, applies the Hann window and transforms.
    /// Segments shorter than `fft_size` are zero-padded, longer ones truncated.
    pub fn compute_power_spectrum(&self, segment: &[f64]) -> Vec<f64> {
        let used = &segment[..segment.len().min(self.fft_size)];
        let mean = if used.is_empty() {
            0.0
        } else {
            used.iter().sum::<f64>() / used.len() as f64
        };

        let mut buffer: Vec<Complex<f64>> = used
            .iter()
            .zip(&self.window)
            .map(|(&sample, &w)| Complex::new((sample - mean) * w, 0.0))
            .collect();
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer[..self.fft_size / 2 + 1]
            .iter()
            .map(|c| c.norm_sqr())
            .collect()
    }
}
