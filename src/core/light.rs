use crate::core::common::{Float, PI};
use crate::core::ddf::{DdfQuery, DirectionSample, DirectionType, DirectionalDistribution};
use crate::core::geometry::{Point2f, Vector3f};
use crate::core::interaction::SurfacePoint;
use crate::core::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere};
use crate::core::scene::SceneObject;
use crate::core::spectrum::{SampledSpectrum, WavelengthSamples};
use crate::shapes::Shape;
use enum_dispatch::enum_dispatch;

#[derive(Debug, Copy, Clone)]
pub struct LightPosQuery {
    pub time: Float,
    pub wls: WavelengthSamples,
}

pub struct LightPosResult<'s> {
    pub surf_pt: SurfacePoint<'s>,
    pub area_pdf: Float,
    pub pos_type: DirectionType,
}

/// Handle to one selectable emitting scene object.
#[derive(Copy, Clone)]
pub struct Light<'s> {
    pub index: usize,
    pub obj: &'s SceneObject,
}

impl<'s> Light<'s> {
    /// Samples an emitting position; returns the spectral emittance
    /// at that position.
    pub fn sample(
        &self,
        query: &LightPosQuery,
        u: (Float, Float),
    ) -> (SampledSpectrum, LightPosResult<'s>) {
        let (p, n) = self.obj.shape.sample_position(u);
        let surf_pt = SurfacePoint::on_object(p, n, self.obj);
        let le0 = surf_pt.emittance(&query.wls);

        (
            le0,
            LightPosResult {
                surf_pt,
                area_pdf: 1.0 / self.obj.shape.area(),
                pos_type: DirectionType::LOW_FREQ,
            },
        )
    }
}

#[enum_dispatch(DirectionalDistribution)]
pub enum Edfs {
    DiffuseEdf,
}

/// Cosine-weighted emission over the front hemisphere, normalized so
/// that emittance times the EDF value gives outgoing radiance.
pub struct DiffuseEdf;

impl DiffuseEdf {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DiffuseEdf {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectionalDistribution for DiffuseEdf {
    fn sample(&self, _query: &DdfQuery, u: (Float, Float, Float)) -> DirectionSample {
        let dir = cosine_sample_hemisphere(&Point2f::new(u.0, u.1));
        let value = SampledSpectrum::new(1.0 / PI);

        DirectionSample {
            value,
            dir_local: dir,
            dir_pdf: cosine_hemisphere_pdf(dir.z),
            dir_type: DirectionType::LOW_FREQ,
            reverse_value: value,
            reverse_pdf: 0.0,
        }
    }

    fn evaluate(&self, _query: &DdfQuery, dir: &Vector3f) -> (SampledSpectrum, SampledSpectrum) {
        if dir.z <= 0.0 {
            return (SampledSpectrum::zero(), SampledSpectrum::zero());
        }
        let v = SampledSpectrum::new(1.0 / PI);

        (v, v)
    }

    fn evaluate_pdf(&self, _query: &DdfQuery, dir: &Vector3f) -> (Float, Float) {
        if dir.z <= 0.0 {
            return (0.0, 0.0);
        }

        // An emitter is never traversed by a longer subpath, so the
        // reverse density has no consumer.
        (cosine_hemisphere_pdf(dir.z), 0.0)
    }
}
