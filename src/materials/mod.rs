use bumpalo::Bump;
use enum_dispatch::enum_dispatch;

use crate::core::reflection::Bsdfs;
use crate::core::spectrum::WavelengthSamples;

pub mod glass;
pub mod matte;
pub mod mirror;

pub use glass::Glass;
pub use matte::Matte;
pub use mirror::Mirror;

/// Materials build a BSDF specialized to one wavelength packet. The
/// result lives in the per-pixel arena and is dropped wholesale when
/// the arena resets.
#[enum_dispatch]
pub trait Material {
    fn create_bsdf<'a>(&self, wls: &WavelengthSamples, arena: &'a Bump) -> &'a Bsdfs;
}

#[enum_dispatch(Material)]
pub enum Materials {
    Matte,
    Mirror,
    Glass,
}
