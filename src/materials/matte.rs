use bumpalo::Bump;

use crate::core::common::Float;
use crate::core::reflection::{Bsdfs, LambertBrdf};
use crate::core::spectrum::{SampledSpectrum, WavelengthSamples};
use crate::materials::Material;

/// Wavelength-flat Lambertian surface.
pub struct Matte {
    albedo: Float,
}

impl Matte {
    pub fn new(albedo: Float) -> Self {
        assert!((0.0..=1.0).contains(&albedo));
        Self { albedo }
    }
}

impl Material for Matte {
    fn create_bsdf<'a>(&self, _wls: &WavelengthSamples, arena: &'a Bump) -> &'a Bsdfs {
        arena.alloc(LambertBrdf::new(SampledSpectrum::new(self.albedo)).into())
    }
}
