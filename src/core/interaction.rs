use crate::core::common::{Float, PI};
use crate::core::geometry::{Frame, Normal3f, Point3f};
use crate::core::light::{DiffuseEdf, Edfs};
use crate::core::reflection::{Bsdfs, LambertBrdf};
use crate::core::scene::SceneObject;
use crate::core::spectrum::{SampledSpectrum, WavelengthSamples};
use crate::materials::Material;
use crate::shapes::Shape;
use bumpalo::Bump;

/// One point on a scene surface (or the at-infinity sphere). Carries
/// everything a subpath vertex needs: position, geometric normal and
/// the shading frame used by all local-space distribution queries.
#[derive(Copy, Clone)]
pub struct SurfacePoint<'s> {
    pub p: Point3f,
    pub g_normal: Normal3f,
    pub shading_frame: Frame,
    pub at_infinity: bool,
    pub obj: Option<&'s SceneObject>,
    /// Radiance of the environment emitter; meaningful only for
    /// at-infinity points.
    pub env_radiance: Float,
}

impl<'s> SurfacePoint<'s> {
    pub fn on_object(p: Point3f, g_normal: Normal3f, obj: &'s SceneObject) -> Self {
        Self {
            p,
            g_normal,
            shading_frame: Frame::from_normal(&g_normal),
            at_infinity: false,
            obj: Some(obj),
            env_radiance: 0.0,
        }
    }

    /// Lens point. The frame must align x/y with the image axes so
    /// that importance queries map back to pixels.
    pub fn on_lens(p: Point3f, frame: Frame) -> Self {
        Self {
            p,
            g_normal: Normal3f::from(frame.z),
            shading_frame: frame,
            at_infinity: false,
            obj: None,
            env_radiance: 0.0,
        }
    }

    pub fn at_infinity(p: Point3f, facing: Normal3f, env_radiance: Float) -> Self {
        Self {
            p,
            g_normal: facing,
            shading_frame: Frame::from_normal(&facing),
            at_infinity: true,
            obj: None,
            env_radiance,
        }
    }

    pub fn create_bsdf<'a>(&self, wls: &WavelengthSamples, arena: &'a Bump) -> &'a Bsdfs {
        match self.obj {
            Some(obj) => obj.material.create_bsdf(wls, arena),
            // At-infinity points scatter nothing; the vertex is popped
            // before any sampling, the distribution is a placeholder.
            None => arena.alloc(LambertBrdf::new(SampledSpectrum::zero()).into()),
        }
    }

    pub fn create_edf<'a>(&self, _wls: &WavelengthSamples, arena: &'a Bump) -> &'a Edfs {
        arena.alloc(DiffuseEdf::new().into())
    }

    pub fn is_emitting(&self) -> bool {
        match self.obj {
            Some(obj) => obj.emitter.is_some(),
            None => self.at_infinity && self.env_radiance > 0.0,
        }
    }

    /// Radiant exitance at the sampled wavelengths.
    pub fn emittance(&self, _wls: &WavelengthSamples) -> SampledSpectrum {
        let radiance = match self.obj {
            Some(obj) => obj.emitter.as_ref().map(|e| e.radiance).unwrap_or(0.0),
            None => self.env_radiance,
        };

        SampledSpectrum::new(radiance * PI)
    }

    /// Density of sampling this position when its emitter is chosen,
    /// in area measure. Zero for the environment: it is reachable only
    /// implicitly, never by light-side sampling.
    pub fn evaluate_area_pdf(&self) -> Float {
        match self.obj {
            Some(obj) => 1.0 / obj.shape.area(),
            None => 0.0,
        }
    }
}

pub struct Intersection<'s> {
    pub dist: Float,
    pub surf_pt: SurfacePoint<'s>,
}
