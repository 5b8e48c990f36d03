// Feature extraction - beta-band energy of one filtered window
//
// Module organization:
// - fft: Hann-windowed, detrended power spectrum
// - spectral: Welch density scaling and bin frequencies
// - mod.rs: BetaBandExtractor (sums the PSD over the beta band)
//
// The feature is the SUM (not the mean) of the PSD bins whose frequency lies
// inside the inclusive beta band. With a 512-sample window at 512 Hz the
// bins are 1 Hz apart and 14-30 Hz covers 17 bins.

mod fft;
mod spectral;

pub use spectral::WelchEstimator;

use std::ops::Range;

use crate::config::DspConfig;
use crate::error::ConfigError;

/// BetaBandExtractor turns one window into one scalar beta energy
pub struct BetaBandExtractor {
    welch: WelchEstimator,
    band_bins: Range<usize>,
}

impl BetaBandExtractor {
    /// Create an extractor for windows of `dsp.window_len()` samples
    ///
    /// # Returns
    /// * `Err(ConfigError)` - The band lies outside [0, nyquist]
    ///
    /// A band that is representable but falls between two bins is accepted
    /// (its energy is always zero) and reported as a warning.
    pub fn new(dsp: &DspConfig) -> Result<Self, ConfigError> {
        dsp.validate()?;
        let welch = WelchEstimator::new(dsp.sample_rate as f64, dsp.window_len());

        let in_band: Vec<usize> = (0..welch.bin_count())
            .filter(|&k| {
                let freq = welch.frequency(k);
                freq >= dsp.beta_low_hz && freq <= dsp.beta_high_hz
            })
            .collect();

        let band_bins = match (in_band.first(), in_band.last()) {
            (Some(&first), Some(&last)) => first..last + 1,
            _ => {
                log::warn!(
                    "[Features] Beta band {}-{} Hz contains no PSD bins at {} Hz / {} samples; energy will always be 0",
                    dsp.beta_low_hz,
                    dsp.beta_high_hz,
                    dsp.sample_rate,
                    dsp.window_len()
                );
                0..0
            }
        };

        Ok(Self { welch, band_bins })
    }

    /// Indices of the PSD bins summed into the feature
    pub fn band_bins(&self) -> Range<usize> {
        self.band_bins.clone()
    }

    /// Sum of the Welch PSD over the beta band
    pub fn beta_energy(&self, window: &[f64]) -> f64 {
        if self.band_bins.is_empty() {
            return 0.0;
        }
        let psd = self.welch.psd(window);
        psd[self.band_bins.clone()].iter().sum()
    }
}
