use crate::core::common::{clamp, Float, INV_PI};
use crate::core::ddf::{DdfQuery, DirectionSample, DirectionType, DirectionalDistribution};
use crate::core::geometry::{Point2f, Vector3f};
use crate::core::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere};
use crate::core::spectrum::{SampledSpectrum, SPECTRUM_SAMPLES};
use enum_dispatch::enum_dispatch;

pub fn fr_dielectric(cos_theta_i: Float, eta_i: Float, eta_t: Float) -> Float {
    let cos_theta_i = clamp(cos_theta_i, -1.0, 1.0).abs();
    let sin_theta_i = (0.0 as Float).max(1.0 - cos_theta_i * cos_theta_i).sqrt();
    let sin_theta_t = eta_i / eta_t * sin_theta_i;

    // Total internal reflection
    if sin_theta_t >= 1.0 {
        return 1.0;
    }

    let cos_theta_t = (0.0 as Float).max(1.0 - sin_theta_t * sin_theta_t).sqrt();
    let r_parl = (eta_t * cos_theta_i - eta_i * cos_theta_t)
        / (eta_t * cos_theta_i + eta_i * cos_theta_t);
    let r_perp = (eta_i * cos_theta_i - eta_t * cos_theta_t)
        / (eta_i * cos_theta_i + eta_t * cos_theta_t);

    (r_parl * r_parl + r_perp * r_perp) / 2.0
}

fn same_hemisphere(a: &Vector3f, b: &Vector3f) -> bool {
    a.z * b.z > 0.0
}

#[enum_dispatch(DirectionalDistribution)]
pub enum Bsdfs {
    LambertBrdf,
    SpecularBrdf,
    DielectricBsdf,
}

/// Ideal diffuse reflection.
pub struct LambertBrdf {
    reflectance: SampledSpectrum,
}

impl LambertBrdf {
    pub fn new(reflectance: SampledSpectrum) -> Self {
        Self { reflectance }
    }
}

impl DirectionalDistribution for LambertBrdf {
    fn sample(&self, query: &DdfQuery, u: (Float, Float, Float)) -> DirectionSample {
        let mut dir = cosine_sample_hemisphere(&Point2f::new(u.0, u.1));
        // Reflect into the hemisphere of the incoming direction.
        if query.dir_in_local.z < 0.0 {
            dir.z = -dir.z;
        }

        let value = self.reflectance * INV_PI;

        DirectionSample {
            value,
            dir_local: dir,
            dir_pdf: cosine_hemisphere_pdf(dir.z.abs()),
            dir_type: DirectionType::LOW_FREQ | DirectionType::REFLECTION,
            reverse_value: value,
            reverse_pdf: cosine_hemisphere_pdf(query.dir_in_local.z.abs()),
        }
    }

    fn evaluate(&self, query: &DdfQuery, dir: &Vector3f) -> (SampledSpectrum, SampledSpectrum) {
        if !same_hemisphere(&query.dir_in_local, dir) {
            return (SampledSpectrum::zero(), SampledSpectrum::zero());
        }
        let v = self.reflectance * INV_PI;

        (v, v)
    }

    fn evaluate_pdf(&self, query: &DdfQuery, dir: &Vector3f) -> (Float, Float) {
        if !same_hemisphere(&query.dir_in_local, dir) {
            return (0.0, 0.0);
        }

        (
            cosine_hemisphere_pdf(dir.z.abs()),
            cosine_hemisphere_pdf(query.dir_in_local.z.abs()),
        )
    }
}

/// Ideal mirror. Delta distribution: continuous evaluation is zero.
pub struct SpecularBrdf {
    coeff: SampledSpectrum,
}

impl SpecularBrdf {
    pub fn new(coeff: SampledSpectrum) -> Self {
        Self { coeff }
    }
}

impl DirectionalDistribution for SpecularBrdf {
    fn sample(&self, query: &DdfQuery, _u: (Float, Float, Float)) -> DirectionSample {
        let wi = query.dir_in_local;
        let dir = Vector3f::new(-wi.x, -wi.y, wi.z);
        let value = self.coeff / dir.z.abs();

        DirectionSample {
            value,
            dir_local: dir,
            dir_pdf: 1.0,
            dir_type: DirectionType::DELTA | DirectionType::REFLECTION,
            reverse_value: value,
            reverse_pdf: 1.0,
        }
    }

    fn evaluate(&self, _query: &DdfQuery, _dir: &Vector3f) -> (SampledSpectrum, SampledSpectrum) {
        (SampledSpectrum::zero(), SampledSpectrum::zero())
    }

    fn evaluate_pdf(&self, _query: &DdfQuery, _dir: &Vector3f) -> (Float, Float) {
        (0.0, 0.0)
    }
}

/// Smooth dielectric with per-channel Cauchy indices of refraction.
/// When the indices differ across channels, a sampled transmission is
/// dispersive: only the hero wavelength remains valid and the sample
/// pins the path to it.
pub struct DielectricBsdf {
    coeff: SampledSpectrum,
    etas: [Float; SPECTRUM_SAMPLES],
    dispersive: bool,
}

impl DielectricBsdf {
    pub fn new(coeff: SampledSpectrum, etas: [Float; SPECTRUM_SAMPLES], dispersive: bool) -> Self {
        Self {
            coeff,
            etas,
            dispersive,
        }
    }

    fn refract(wi: &Vector3f, eta_rel: Float) -> Option<Vector3f> {
        let cos_i = wi.z.abs();
        let sin2_t = eta_rel * eta_rel * (0.0 as Float).max(1.0 - cos_i * cos_i);
        if sin2_t >= 1.0 {
            return None;
        }
        let cos_t = (1.0 - sin2_t).sqrt();
        let z = if wi.z > 0.0 { -cos_t } else { cos_t };

        Some(Vector3f::new(-wi.x * eta_rel, -wi.y * eta_rel, z))
    }
}

impl DirectionalDistribution for DielectricBsdf {
    fn sample(&self, query: &DdfQuery, u: (Float, Float, Float)) -> DirectionSample {
        let wi = query.dir_in_local;
        let entering = wi.z > 0.0;
        let eta_hero = self.etas[query.hero];
        let (eta_i, eta_t) = if entering {
            (1.0, eta_hero)
        } else {
            (eta_hero, 1.0)
        };
        let fr = fr_dielectric(wi.z, eta_i, eta_t);

        if u.2 < fr {
            // Specular reflection; the direction is wavelength
            // independent, so every channel survives.
            let dir = Vector3f::new(-wi.x, -wi.y, wi.z);
            let mut value = SampledSpectrum::zero();
            for i in 0..SPECTRUM_SAMPLES {
                let (ei, et) = if entering {
                    (1.0, self.etas[i])
                } else {
                    (self.etas[i], 1.0)
                };
                value += SampledSpectrum::only(i, fr_dielectric(wi.z, ei, et) * self.coeff[i]);
            }
            value /= dir.z.abs();

            return DirectionSample {
                value,
                dir_local: dir,
                dir_pdf: fr,
                dir_type: DirectionType::DELTA | DirectionType::REFLECTION,
                reverse_value: value,
                reverse_pdf: fr,
            };
        }

        // fr < 1 guarantees the hero-wavelength refraction exists.
        let eta_rel = eta_i / eta_t;
        let dir = match Self::refract(&wi, eta_rel) {
            Some(d) => d,
            None => return DirectionSample::default(),
        };

        let mut scale = (1.0 - fr) / dir.z.abs();
        let mut rev_scale = scale;
        // Radiance carried across a refraction is compressed by the
        // squared relative index; the adjoint quantity is not.
        if !query.adjoint {
            scale *= eta_rel * eta_rel;
        } else {
            rev_scale /= eta_rel * eta_rel;
        }

        let (value, reverse_value, dir_type) = if self.dispersive {
            (
                SampledSpectrum::only(query.hero, self.coeff[query.hero] * scale),
                SampledSpectrum::only(query.hero, self.coeff[query.hero] * rev_scale),
                DirectionType::DELTA | DirectionType::TRANSMISSION | DirectionType::DISPERSIVE,
            )
        } else {
            (
                self.coeff * scale,
                self.coeff * rev_scale,
                DirectionType::DELTA | DirectionType::TRANSMISSION,
            )
        };

        DirectionSample {
            value,
            dir_local: dir,
            dir_pdf: 1.0 - fr,
            dir_type,
            reverse_value,
            reverse_pdf: 1.0 - fr,
        }
    }

    fn evaluate(&self, _query: &DdfQuery, _dir: &Vector3f) -> (SampledSpectrum, SampledSpectrum) {
        (SampledSpectrum::zero(), SampledSpectrum::zero())
    }

    fn evaluate_pdf(&self, _query: &DdfQuery, _dir: &Vector3f) -> (Float, Float) {
        (0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lambert_reciprocal() {
        let brdf = LambertBrdf::new(SampledSpectrum::new(0.5));
        let q = DdfQuery {
            dir_in_local: Vector3f::new(0.3, 0.1, 0.9).normalize(),
            ..Default::default()
        };
        let dir = Vector3f::new(-0.2, 0.4, 0.89).normalize();
        let (f, rev) = brdf.evaluate(&q, &dir);
        assert_eq!(f, rev);
        assert!((f[0] - 0.5 * INV_PI).abs() < 1.0e-6);
    }

    #[test]
    fn dispersive_transmission_pins_to_hero() {
        let bsdf = DielectricBsdf::new(SampledSpectrum::new(1.0), [1.8, 1.6, 1.5, 1.45], true);
        let q = DdfQuery {
            dir_in_local: Vector3f::new(0.0, 0.4, 0.9165).normalize(),
            hero: 2,
            ..Default::default()
        };
        // u.2 = 0.99 forces the transmission branch for this geometry.
        let s = bsdf.sample(&q, (0.5, 0.5, 0.99));
        assert!(s.dir_type.is_dispersive());
        assert!(s.dir_type.is_delta());
        for i in 0..SPECTRUM_SAMPLES {
            if i != 2 {
                assert_eq!(s.value[i], 0.0);
            }
        }
        assert!(s.value[2] > 0.0);
    }

    #[test]
    fn mirror_is_delta_and_unreachable_by_evaluation() {
        let brdf = SpecularBrdf::new(SampledSpectrum::new(0.9));
        let q = DdfQuery {
            dir_in_local: Vector3f::new(0.5, 0.0, 0.866),
            ..Default::default()
        };
        let s = brdf.sample(&q, (0.0, 0.0, 0.0));
        assert!(s.dir_type.is_delta());
        let (f, _) = brdf.evaluate(&q, &s.dir_local);
        assert!(f.is_zero());
    }
}
