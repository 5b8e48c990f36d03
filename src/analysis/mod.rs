// Analysis module - DSP pipeline from raw samples to beta energy
//
// Architecture:
// - SampleWindower: collects non-overlapping windows of `sample_rate` samples
// - FilterBank: zero-phase notch + band-pass over each complete window
// - BetaBandExtractor: Welch PSD summed over the beta band
// - FeaturePipeline: coordinator used by both calibration and run time
//
// One feature is produced per completed window, i.e. once per second at
// the nominal rate.

pub mod features;
pub mod filters;
pub mod windower;

pub use features::BetaBandExtractor;
pub use filters::FilterBank;
pub use windower::SampleWindower;

use crate::config::DspConfig;
use crate::error::ConfigError;

/// FeaturePipeline turns a sample stream into a beta-energy stream
pub struct FeaturePipeline {
    windower: SampleWindower,
    filters: FilterBank,
    extractor: BetaBandExtractor,
    windows_completed: u64,
}

impl FeaturePipeline {
    /// Build the windower, filter designs and band extractor for `dsp`
    ///
    /// # Returns
    /// * `Err(ConfigError)` - A frequency is not representable at the sample rate
    pub fn new(dsp: &DspConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            windower: SampleWindower::new(dsp.window_len()),
            filters: FilterBank::design(dsp)?,
            extractor: BetaBandExtractor::new(dsp)?,
            windows_completed: 0,
        })
    }

    /// Feed one sample
    ///
    /// # Returns
    /// * `Some(beta_energy)` - This sample completed a window
    /// * `None` - Window still filling
    pub fn push(&mut self, sample: f64) -> Option<f64> {
        let window = self.windower.push(sample)?;
        let filtered = self.filters.apply(window);
        self.windows_completed += 1;
        Some(self.extractor.beta_energy(&filtered))
    }

    /// Filter and reduce one full window without touching the windower
    pub fn process_window(&self, window: &[f64]) -> f64 {
        self.extractor.beta_energy(&self.filters.apply(window))
    }

    /// Drop any partially accumulated window
    pub fn reset(&mut self) {
        self.windower.reset();
    }

    pub fn window_len(&self) -> usize {
        self.windower.capacity()
    }

    pub fn windows_completed(&self) -> u64 {
        self.windows_completed
    }
}
