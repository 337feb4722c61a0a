use crate::core::common::Float;
use crate::core::ddf::{DdfQuery, DirectionSample, DirectionType};
use crate::core::geometry::{Point2f, Vector3f};
use crate::core::interaction::SurfacePoint;
use crate::core::spectrum::{SampledSpectrum, WavelengthSamples};
use crate::cameras::perspective::{PerspectiveCamera, PerspectiveIdf};
use bumpalo::Bump;
use enum_dispatch::enum_dispatch;

#[derive(Debug, Copy, Clone)]
pub struct LensPosQuery {
    pub time: Float,
    pub wls: WavelengthSamples,
}

pub struct LensPosResult<'s> {
    pub surf_pt: SurfacePoint<'s>,
    pub area_pdf: Float,
    pub pos_type: DirectionType,
}

#[enum_dispatch]
pub trait Camera {
    /// Samples a lens position; returns the spatial importance We0.
    fn sample<'s>(
        &self,
        query: &LensPosQuery,
        u: (Float, Float),
    ) -> (SampledSpectrum, LensPosResult<'s>);

    /// Creates the importance distribution for a lens point in the
    /// pixel's scratch arena.
    fn create_idf<'a>(
        &self,
        surf_pt: &SurfacePoint,
        wls: &WavelengthSamples,
        arena: &'a Bump,
    ) -> &'a Idfs;
}

#[enum_dispatch(Camera)]
pub enum Cameras {
    PerspectiveCamera,
}

/// Directional importance response of a lens point. Shares the
/// forward/reverse evaluation contract of the other distribution
/// families and can reproject a direction to its pixel for t=1
/// connection strategies.
#[enum_dispatch]
pub trait ImportanceDistribution {
    /// Samples the direction through `p_film` (normalized [0,1)^2).
    fn sample_pixel(&self, p_film: &Point2f) -> DirectionSample;

    fn evaluate(&self, query: &DdfQuery, dir: &Vector3f) -> (SampledSpectrum, SampledSpectrum);

    fn evaluate_pdf(&self, query: &DdfQuery, dir: &Vector3f) -> (Float, Float);

    /// Pixel hit by a (lens-local) direction, or None when the
    /// direction leaves the view frustum.
    fn calculate_pixel(&self, dir: &Vector3f) -> Option<(Float, Float)>;
}

#[enum_dispatch(ImportanceDistribution)]
pub enum Idfs {
    PerspectiveIdf,
}
