use crate::core::common::Float;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign};

/// Number of wavelengths sampled jointly per pixel sample.
pub const SPECTRUM_SAMPLES: usize = 4;

pub const LAMBDA_MIN: Float = 360.0;
pub const LAMBDA_MAX: Float = 830.0;

/// Integral of the CIE y-bar curve over the visible range; normalizes
/// XYZ accumulation so a flat unit-radiance spectrum has luminance 1.
pub const CIE_Y_INTEGRAL: Float = 106.856895;

/// Set once a dispersive scattering event pins the path to its hero
/// wavelength; connection probabilities are then scaled by the channel
/// count.
pub const WAVELENGTH_PINNED: u32 = 1 << 0;

/// A jointly sampled set of wavelengths with equal offsets across the
/// visible range, plus the hero index driving scalar decisions.
#[derive(Debug, Copy, Clone)]
pub struct WavelengthSamples {
    pub lambdas: [Float; SPECTRUM_SAMPLES],
    pub hero: usize,
    pub flags: u32,
}

impl WavelengthSamples {
    /// Stratified equal-offset wavelengths; `u_hero` picks the hero
    /// channel. Returns the per-channel selection PDF.
    pub fn new_with_equal_offsets(u_lambda: Float, u_hero: Float) -> (Self, Float) {
        let range = LAMBDA_MAX - LAMBDA_MIN;
        let mut lambdas = [0.0; SPECTRUM_SAMPLES];

        for (i, l) in lambdas.iter_mut().enumerate() {
            let mut t = u_lambda + i as Float / SPECTRUM_SAMPLES as Float;
            if t >= 1.0 {
                t -= 1.0;
            }
            *l = LAMBDA_MIN + t * range;
        }

        let hero = ((u_hero * SPECTRUM_SAMPLES as Float) as usize).min(SPECTRUM_SAMPLES - 1);
        let wls = Self {
            lambdas,
            hero,
            flags: 0,
        };

        (wls, 1.0 / range)
    }

    pub fn is_pinned(&self) -> bool {
        self.flags & WAVELENGTH_PINNED != 0
    }

    pub fn hero_lambda(&self) -> Float {
        self.lambdas[self.hero]
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SampledSpectrum {
    c: [Float; SPECTRUM_SAMPLES],
}

impl SampledSpectrum {
    pub fn new(v: Float) -> Self {
        Self {
            c: [v; SPECTRUM_SAMPLES],
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_channels(c: [Float; SPECTRUM_SAMPLES]) -> Self {
        Self { c }
    }

    /// Value in a single channel, zero elsewhere. Used by dispersive
    /// scattering, which is only valid for the hero wavelength.
    pub fn only(channel: usize, v: Float) -> Self {
        let mut c = [0.0; SPECTRUM_SAMPLES];
        c[channel] = v;
        Self { c }
    }

    pub fn is_zero(&self) -> bool {
        self.c.iter().all(|&v| v == 0.0)
    }

    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    pub fn has_infs(&self) -> bool {
        self.c.iter().any(|v| v.is_infinite())
    }

    pub fn max_component(&self) -> Float {
        self.c.iter().cloned().fold(Float::MIN, Float::max)
    }
}

impl Index<usize> for SampledSpectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Float {
        &self.c[i]
    }
}

impl Add for SampledSpectrum {
    type Output = SampledSpectrum;

    fn add(self, rhs: Self) -> Self {
        let mut c = self.c;
        for (a, b) in c.iter_mut().zip(rhs.c.iter()) {
            *a += b;
        }
        Self { c }
    }
}

impl AddAssign for SampledSpectrum {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.c.iter_mut().zip(rhs.c.iter()) {
            *a += b;
        }
    }
}

impl Mul for SampledSpectrum {
    type Output = SampledSpectrum;

    fn mul(self, rhs: Self) -> Self {
        let mut c = self.c;
        for (a, b) in c.iter_mut().zip(rhs.c.iter()) {
            *a *= b;
        }
        Self { c }
    }
}

impl MulAssign for SampledSpectrum {
    fn mul_assign(&mut self, rhs: Self) {
        for (a, b) in self.c.iter_mut().zip(rhs.c.iter()) {
            *a *= b;
        }
    }
}

impl Mul<Float> for SampledSpectrum {
    type Output = SampledSpectrum;

    fn mul(self, rhs: Float) -> Self {
        let mut c = self.c;
        for a in c.iter_mut() {
            *a *= rhs;
        }
        Self { c }
    }
}

impl MulAssign<Float> for SampledSpectrum {
    fn mul_assign(&mut self, rhs: Float) {
        for a in self.c.iter_mut() {
            *a *= rhs;
        }
    }
}

impl Div<Float> for SampledSpectrum {
    type Output = SampledSpectrum;

    fn div(self, rhs: Float) -> Self {
        let inv = 1.0 / rhs;
        self * inv
    }
}

impl DivAssign<Float> for SampledSpectrum {
    fn div_assign(&mut self, rhs: Float) {
        *self *= 1.0 / rhs;
    }
}

// Piecewise-Gaussian fit of the CIE 1931 color matching functions
// (Wyman, Sloan, Shirley 2013). Avoids carrying tabulated data for the
// narrow use the sensor has for it.
fn cmf_gaussian(lambda: Float, alpha: Float, mu: Float, sigma1: Float, sigma2: Float) -> Float {
    let sigma = if lambda < mu { sigma1 } else { sigma2 };
    let t = (lambda - mu) / sigma;

    alpha * (-0.5 * t * t).exp()
}

pub fn cie_x(lambda: Float) -> Float {
    cmf_gaussian(lambda, 1.056, 599.8, 37.9, 31.0)
        + cmf_gaussian(lambda, 0.362, 442.0, 16.0, 26.7)
        + cmf_gaussian(lambda, -0.065, 501.1, 20.4, 26.2)
}

pub fn cie_y(lambda: Float) -> Float {
    cmf_gaussian(lambda, 0.821, 568.8, 46.9, 40.5)
        + cmf_gaussian(lambda, 0.286, 530.9, 16.3, 31.1)
}

pub fn cie_z(lambda: Float) -> Float {
    cmf_gaussian(lambda, 1.217, 437.0, 11.8, 36.0)
        + cmf_gaussian(lambda, 0.681, 459.0, 26.0, 13.8)
}

/// Converts one spectral deposit (already divided by the wavelength
/// selection PDF) into an XYZ tristimulus increment.
pub fn spectrum_to_xyz(wls: &WavelengthSamples, s: &SampledSpectrum) -> [Float; 3] {
    let mut xyz = [0.0; 3];

    for i in 0..SPECTRUM_SAMPLES {
        let l = wls.lambdas[i];
        xyz[0] += cie_x(l) * s[i];
        xyz[1] += cie_y(l) * s[i];
        xyz[2] += cie_z(l) * s[i];
    }

    let norm = 1.0 / (SPECTRUM_SAMPLES as Float * CIE_Y_INTEGRAL);
    for v in xyz.iter_mut() {
        *v *= norm;
    }

    xyz
}

pub fn xyz_to_rgb(xyz: [Float; 3]) -> [Float; 3] {
    let mut rgb = [0.0 as Float; 3];

    rgb[0] = 3.240479 * xyz[0] - 1.537150 * xyz[1] - 0.498535 * xyz[2];
    rgb[1] = -0.969256 * xyz[0] + 1.875991 * xyz[1] + 0.041556 * xyz[2];
    rgb[2] = 0.055648 * xyz[0] - 0.204043 * xyz[1] + 1.057311 * xyz[2];

    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_offsets_cover_range() {
        let (wls, pdf) = WavelengthSamples::new_with_equal_offsets(0.37, 0.9);
        assert_eq!(wls.hero, 3);
        assert!((pdf - 1.0 / (LAMBDA_MAX - LAMBDA_MIN)).abs() < 1.0e-8);

        for w in wls.lambdas.iter() {
            assert!(*w >= LAMBDA_MIN && *w < LAMBDA_MAX);
        }

        // Offsets are equally spaced modulo the range.
        let range = LAMBDA_MAX - LAMBDA_MIN;
        let step = range / SPECTRUM_SAMPLES as Float;
        for i in 1..SPECTRUM_SAMPLES {
            let d = (wls.lambdas[i] - wls.lambdas[i - 1] + range) % range;
            assert!((d - step).abs() < 1.0e-3);
        }
    }

    #[test]
    fn ybar_integral_matches_norm() {
        // Riemann sum of the fitted y-bar over the sampled range.
        let mut sum = 0.0;
        let n = 4700;
        let dl = (LAMBDA_MAX - LAMBDA_MIN) / n as Float;
        for i in 0..n {
            sum += cie_y(LAMBDA_MIN + (i as Float + 0.5) * dl) * dl;
        }
        assert!((sum - CIE_Y_INTEGRAL).abs() / CIE_Y_INTEGRAL < 0.02);
    }

    #[test]
    fn pinned_spectrum_is_single_channel() {
        let s = SampledSpectrum::only(2, 3.0);
        assert_eq!(s[2], 3.0);
        assert_eq!(s[0], 0.0);
        assert!(!s.is_zero());
    }
}
