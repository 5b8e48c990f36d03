// Filters module - mains notch + Butterworth band-pass, applied zero-phase
//
// Both designs are built once from `DspConfig` and shared read-only by every
// window. Filtering runs each cascade forward then backward over an
// odd-extended copy of the window (the classic filtfilt construction), so the
// output has no net delay and no group-delay distortion.
//
// Coefficients follow the usual digital design recipes with frequencies
// normalized to nyquist:
// - notch: second-order IIR notch with bandwidth w0 / Q
// - band-pass: analog Butterworth prototype -> band-pass transform ->
//   prewarped bilinear transform, emitted as second-order sections

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use crate::config::DspConfig;
use crate::error::ConfigError;

/// Order of the Butterworth prototype (the band-pass has twice as many poles)
pub const BANDPASS_ORDER: usize = 4;

/// Second-order section, `a[0]` normalized to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// Second-order notch
    ///
    /// # Arguments
    /// * `w0` - Notch frequency normalized to nyquist (0 < w0 < 1)
    /// * `q` - Quality factor (notch bandwidth = w0 / q)
    pub fn notch(w0: f64, q: f64) -> Self {
        let w0 = PI * w0;
        let bw = w0 / q;
        let gain = 1.0 / (1.0 + (bw / 2.0).tan());
        let cos_w0 = w0.cos();

        Self {
            b: [gain, -2.0 * gain * cos_w0, gain],
            a: [1.0, -2.0 * gain * cos_w0, 2.0 * gain - 1.0],
        }
    }

    /// Gain for a constant input
    fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Internal state reached after a long unit-step input
    fn step_state(&self) -> [f64; 2] {
        let g = self.dc_gain();
        [g - self.b[0], self.b[2] - self.a[2] * g]
    }

    /// Run the section in place (transposed direct form II)
    fn run(&self, data: &mut [f64], mut state: [f64; 2]) {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        for x in data.iter_mut() {
            let input = *x;
            let y = b0 * input + state[0];
            state[0] = b1 * input - a1 * y + state[1];
            state[1] = b2 * input - a2 * y;
            *x = y;
        }
    }

    /// Complex response at `omega` radians per sample
    pub fn response(&self, omega: f64) -> Complex<f64> {
        let z1 = Complex::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = self.a[0] + z1 * self.a[1] + z2 * self.a[2];
        num / den
    }
}

/// Butterworth band-pass as a cascade of second-order sections
///
/// # Arguments
/// * `order` - Prototype order (4 gives an 8-pole band-pass)
/// * `low`, `high` - Corner frequencies normalized to nyquist
pub fn butterworth_bandpass(order: usize, low: f64, high: f64) -> Vec<Biquad> {
    // Bilinear transform with fs = 2 so that normalized corners map directly
    let fs2 = 4.0;
    let warped_low = fs2 * (PI * low / 2.0).tan();
    let warped_high = fs2 * (PI * high / 2.0).tan();
    let bw = warped_high - warped_low;
    let wo2 = warped_low * warped_high;

    let bilinear = |p: Complex<f64>| (fs2 + p) / (fs2 - p);

    let mut poles = Vec::with_capacity(2 * order);
    for k in 0..order {
        let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
        let lowpass_pole = Complex::from_polar(1.0, theta) * (bw / 2.0);
        let root = (lowpass_pole * lowpass_pole - wo2).sqrt();
        poles.push(lowpass_pole + root);
        poles.push(lowpass_pole - root);
    }

    // Zeros: `order` at s = 0 (z = 1) and `order` at infinity (z = -1)
    let denominator = poles
        .iter()
        .fold(Complex::new(1.0, 0.0), |acc, p| acc * (fs2 - p));
    let gain = (bw.powi(order as i32) * fs2.powi(order as i32) / denominator).re;

    // Conjugate pairs come from the prototype poles in the upper half plane
    let mut sections: Vec<Biquad> = (0..order)
        .filter(|k| (PI * (2 * k + order + 1) as f64 / (2 * order) as f64).sin() > 0.0)
        .flat_map(|k| [poles[2 * k], poles[2 * k + 1]])
        .map(|p| {
            let z = bilinear(p);
            Biquad {
                b: [1.0, 0.0, -1.0],
                a: [1.0, -2.0 * z.re, z.norm_sqr()],
            }
        })
        .collect();

    if let Some(first) = sections.first_mut() {
        for coeff in first.b.iter_mut() {
            *coeff *= gain;
        }
    }
    sections
}

/// Forward-backward filtering through a cascade of sections
///
/// The input is odd-extended by `3 * (2 * sections + 1)` samples on each
/// side and each pass starts from the step-response state scaled by the
/// first sample it sees, which keeps edge transients small.
pub fn filtfilt(sections: &[Biquad], input: &[f64]) -> Vec<f64> {
    let n = input.len();
    if n == 0 || sections.is_empty() {
        return input.to_vec();
    }
    let padlen = (3 * (2 * sections.len() + 1)).min(n - 1);

    let first = input[0];
    let last = input[n - 1];
    let mut extended = Vec::with_capacity(n + 2 * padlen);
    extended.extend((1..=padlen).rev().map(|i| 2.0 * first - input[i]));
    extended.extend_from_slice(input);
    extended.extend((n - 1 - padlen..n - 1).rev().map(|i| 2.0 * last - input[i]));

    let initial_states = cascade_step_states(sections);

    run_cascade(sections, &initial_states, &mut extended);
    extended.reverse();
    run_cascade(sections, &initial_states, &mut extended);
    extended.reverse();

    extended[padlen..padlen + n].to_vec()
}

/// Step-response states for each section, scaled by upstream DC gain
fn cascade_step_states(sections: &[Biquad]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|section| {
            let [z0, z1] = section.step_state();
            let state = [z0 * scale, z1 * scale];
            scale *= section.dc_gain();
            state
        })
        .collect()
}

fn run_cascade(sections: &[Biquad], states: &[[f64; 2]], data: &mut [f64]) {
    let x0 = data[0];
    for (section, state) in sections.iter().zip(states) {
        section.run(data, [state[0] * x0, state[1] * x0]);
    }
}

/// FilterBank holds the notch and band-pass designs for one sample rate
#[derive(Debug, Clone)]
pub struct FilterBank {
    notch: Biquad,
    bandpass: Vec<Biquad>,
}

impl FilterBank {
    /// Design both filters from the configured corners
    ///
    /// # Returns
    /// * `Err(ConfigError)` - A corner is not representable at the sample rate
    pub fn design(dsp: &DspConfig) -> Result<Self, ConfigError> {
        dsp.validate()?;
        let nyquist = dsp.nyquist_hz();

        Ok(Self {
            notch: Biquad::notch(dsp.notch_hz / nyquist, dsp.notch_q),
            bandpass: butterworth_bandpass(
                BANDPASS_ORDER,
                dsp.bandpass_low_hz / nyquist,
                dsp.bandpass_high_hz / nyquist,
            ),
        })
    }

    /// Zero-phase notch then zero-phase band-pass; output length equals input
    pub fn apply(&self, window: &[f64]) -> Vec<f64> {
        let notched = filtfilt(std::slice::from_ref(&self.notch), window);
        filtfilt(&self.bandpass, &notched)
    }

    /// Combined single-pass magnitude response at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sample_rate;
        std::iter::once(&self.notch)
            .chain(self.bandpass.iter())
            .map(|section| section.response(omega).norm())
            .product()
    }
}
