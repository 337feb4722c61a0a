use crate::core::camera::{Idfs, ImportanceDistribution};
use crate::core::common::Float;
use crate::core::geometry::{Normal3f, Vector3f};
use crate::core::light::Edfs;
use crate::core::reflection::Bsdfs;
use crate::core::spectrum::SampledSpectrum;
use enum_dispatch::enum_dispatch;
use std::ops::BitOr;

/// Classification of a sampled direction.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DirectionType(u32);

impl DirectionType {
    pub const NONE: DirectionType = DirectionType(0);
    pub const LOW_FREQ: DirectionType = DirectionType(1);
    pub const DELTA: DirectionType = DirectionType(1 << 1);
    pub const DISPERSIVE: DirectionType = DirectionType(1 << 2);
    pub const REFLECTION: DirectionType = DirectionType(1 << 3);
    pub const TRANSMISSION: DirectionType = DirectionType(1 << 4);

    /// Delta events carry zero resampling probability under any other
    /// connection strategy.
    pub fn is_delta(&self) -> bool {
        self.0 & Self::DELTA.0 != 0
    }

    pub fn is_dispersive(&self) -> bool {
        self.0 & Self::DISPERSIVE.0 != 0
    }
}

impl BitOr for DirectionType {
    type Output = DirectionType;

    fn bitor(self, rhs: Self) -> Self {
        DirectionType(self.0 | rhs.0)
    }
}

/// Shared query for all three distribution families. Directions are in
/// the shading frame of the queried vertex.
#[derive(Debug, Default, Copy, Clone)]
pub struct DdfQuery {
    /// Direction toward the previous vertex of the subpath.
    pub dir_in_local: Vector3f,
    /// Geometric normal in shading-local space.
    pub g_normal_local: Normal3f,
    /// Hero wavelength channel index.
    pub hero: usize,
    /// True when transporting importance (light subpath).
    pub adjoint: bool,
}

/// Result of sampling an outgoing direction. Reverse-direction value
/// and PDF are produced by the same call so forward/reverse pairs can
/// never drift apart, and so the previous vertex's reverse densities
/// can be backfilled without a second dispatch.
#[derive(Debug, Default, Copy, Clone)]
pub struct DirectionSample {
    pub value: SampledSpectrum,
    pub dir_local: Vector3f,
    pub dir_pdf: Float,
    pub dir_type: DirectionType,
    pub reverse_value: SampledSpectrum,
    pub reverse_pdf: Float,
}

/// Capability set common to surface scattering and emission.
#[enum_dispatch]
pub trait DirectionalDistribution {
    fn sample(&self, query: &DdfQuery, u: (Float, Float, Float)) -> DirectionSample;

    /// Value toward `dir` and value for the reversed query, in one call.
    fn evaluate(&self, query: &DdfQuery, dir: &Vector3f) -> (SampledSpectrum, SampledSpectrum);

    /// Forward and reverse direction PDFs toward `dir`.
    fn evaluate_pdf(&self, query: &DdfQuery, dir: &Vector3f) -> (Float, Float);
}

/// One vertex's distribution function: a tagged variant over surface
/// scattering, emission, and lens importance. The referents live in
/// the per-pixel scratch arena and must not outlive it.
#[derive(Copy, Clone)]
pub enum Ddf<'a> {
    Scatter(&'a Bsdfs),
    Emission(&'a Edfs),
    Importance(&'a Idfs),
}

impl<'a> Ddf<'a> {
    pub fn evaluate(
        &self,
        query: &DdfQuery,
        dir: &Vector3f,
    ) -> (SampledSpectrum, SampledSpectrum) {
        match self {
            Ddf::Scatter(bsdf) => bsdf.evaluate(query, dir),
            Ddf::Emission(edf) => edf.evaluate(query, dir),
            Ddf::Importance(idf) => idf.evaluate(query, dir),
        }
    }

    pub fn evaluate_pdf(&self, query: &DdfQuery, dir: &Vector3f) -> (Float, Float) {
        match self {
            Ddf::Scatter(bsdf) => bsdf.evaluate_pdf(query, dir),
            Ddf::Emission(edf) => edf.evaluate_pdf(query, dir),
            Ddf::Importance(idf) => idf.evaluate_pdf(query, dir),
        }
    }

    pub fn as_importance(&self) -> Option<&'a Idfs> {
        match self {
            Ddf::Importance(idf) => Some(idf),
            _ => None,
        }
    }
}
