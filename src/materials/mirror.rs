use bumpalo::Bump;

use crate::core::common::Float;
use crate::core::reflection::{Bsdfs, SpecularBrdf};
use crate::core::spectrum::{SampledSpectrum, WavelengthSamples};
use crate::materials::Material;

/// Perfect specular reflector.
pub struct Mirror {
    coeff: Float,
}

impl Mirror {
    pub fn new(coeff: Float) -> Self {
        assert!((0.0..=1.0).contains(&coeff));
        Self { coeff }
    }
}

impl Material for Mirror {
    fn create_bsdf<'a>(&self, _wls: &WavelengthSamples, arena: &'a Bump) -> &'a Bsdfs {
        arena.alloc(SpecularBrdf::new(SampledSpectrum::new(self.coeff)).into())
    }
}
