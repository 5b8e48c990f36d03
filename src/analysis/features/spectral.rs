// Spectral module - Welch power spectral density
//
// The segment length equals the window length, so the estimate is a single
// Hann-windowed periodogram scaled to a one-sided density (units^2 / Hz).
//
// References:
// - Welch, P. (1967). The use of FFT for the estimation of power spectra

use super::fft::FftProcessor;

/// Welch PSD estimator for windows of one fixed length
pub struct WelchEstimator {
    fft_processor: FftProcessor,
    sample_rate: f64,
}

impl WelchEstimator {
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `segment_len` - Samples per segment (= window length)
    pub fn new(sample_rate: f64, segment_len: usize) -> Self {
        Self {
            fft_processor: FftProcessor::new(segment_len),
            sample_rate,
        }
    }

    /// Spacing between adjacent PSD bins in Hz
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.fft_processor.fft_size() as f64
    }

    /// Frequency of bin `k` in Hz
    pub fn frequency(&self, k: usize) -> f64 {
        k as f64 * self.bin_width()
    }

    /// Number of one-sided bins
    pub fn bin_count(&self) -> usize {
        self.fft_processor.fft_size() / 2 + 1
    }

    /// One-sided power spectral density of `window`
    pub fn psd(&self, window: &[f64]) -> Vec<f64> {
        let fft_size = self.fft_processor.fft_size();
        let window_power = self.fft_processor.window_power();
        if window_power <= 0.0 {
            return vec![0.0; self.bin_count()];
        }
        let scale = 1.0 / (self.sample_rate * window_power);

        let mut psd = self.fft_processor.compute_power_spectrum(window);
        let last = psd.len() - 1;
        for (k, value) in psd.iter_mut().enumerate() {
            *value *= scale;
            // Fold negative frequencies in, except DC and an even-length nyquist bin
            let unpaired = k == 0 || (k == last && fft_size % 2 == 0);
            if !unpaired {
                *value *= 2.0;
            }
        }
        psd
    }
}
