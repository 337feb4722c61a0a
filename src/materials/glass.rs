use bumpalo::Bump;

use crate::core::common::Float;
use crate::core::reflection::{Bsdfs, DielectricBsdf};
use crate::core::spectrum::{SampledSpectrum, WavelengthSamples, SPECTRUM_SAMPLES};
use crate::materials::Material;

/// Smooth dielectric with a Cauchy dispersion model,
/// `eta(lambda) = a + b / lambda_um^2`. A nonzero `b` makes refraction
/// wavelength dependent, which pins transmitted paths to the hero
/// wavelength.
pub struct Glass {
    coeff: Float,
    cauchy_a: Float,
    cauchy_b: Float,
}

impl Glass {
    pub fn new(coeff: Float, cauchy_a: Float, cauchy_b: Float) -> Self {
        assert!(cauchy_a > 1.0);
        Self {
            coeff,
            cauchy_a,
            cauchy_b,
        }
    }

    fn eta(&self, lambda_nm: Float) -> Float {
        let um = lambda_nm * 1.0e-3;
        self.cauchy_a + self.cauchy_b / (um * um)
    }
}

impl Material for Glass {
    fn create_bsdf<'a>(&self, wls: &WavelengthSamples, arena: &'a Bump) -> &'a Bsdfs {
        let mut etas = [0.0; SPECTRUM_SAMPLES];
        for (i, eta) in etas.iter_mut().enumerate() {
            *eta = self.eta(wls.lambdas[i]);
        }
        let dispersive = self.cauchy_b != 0.0;
        arena.alloc(DielectricBsdf::new(SampledSpectrum::new(self.coeff), etas, dispersive).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cauchy_index_decreases_with_wavelength() {
        let glass = Glass::new(1.0, 1.458, 0.00354);
        assert!(glass.eta(400.0) > glass.eta(700.0));
        assert!(glass.eta(589.3) > 1.458);
    }
}
