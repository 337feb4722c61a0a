use bumpalo::Bump;

use crate::core::camera::{Camera, Idfs, ImportanceDistribution, LensPosQuery, LensPosResult};
use crate::core::common::{radians, Float};
use crate::core::ddf::{DdfQuery, DirectionSample, DirectionType};
use crate::core::geometry::{Frame, Point2f, Point3f, Vector3f};
use crate::core::interaction::SurfacePoint;
use crate::core::spectrum::{SampledSpectrum, WavelengthSamples};

/// Pinhole camera. The lens position is a delta distribution, so the
/// spatial importance We0 is 1 with unit area density; all angular
/// behavior lives in the importance distribution below.
pub struct PerspectiveCamera {
    position: Point3f,
    frame: Frame,
    half_x: Float,
    half_y: Float,
}

impl PerspectiveCamera {
    /// `fov_y` is the vertical field of view in degrees.
    pub fn new(position: Point3f, look_at: Point3f, up: Vector3f, fov_y: Float, aspect: Float) -> Self {
        let forward = (look_at - position).normalize();
        let right = forward.cross(&up).normalize();
        let true_up = right.cross(&forward);

        let half_y = (radians(fov_y) * 0.5).tan();
        let half_x = half_y * aspect;

        Self {
            position,
            frame: Frame {
                x: right,
                y: true_up,
                z: forward,
            },
            half_x,
            half_y,
        }
    }
}

impl Camera for PerspectiveCamera {
    fn sample<'s>(
        &self,
        _query: &LensPosQuery,
        _u: (Float, Float),
    ) -> (SampledSpectrum, LensPosResult<'s>) {
        (
            SampledSpectrum::new(1.0),
            LensPosResult {
                surf_pt: SurfacePoint::on_lens(self.position, self.frame),
                area_pdf: 1.0,
                pos_type: DirectionType::DELTA,
            },
        )
    }

    fn create_idf<'a>(
        &self,
        _surf_pt: &SurfacePoint,
        _wls: &WavelengthSamples,
        arena: &'a Bump,
    ) -> &'a Idfs {
        arena.alloc(PerspectiveIdf::new(self.half_x, self.half_y).into())
    }
}

/// Directional importance of the pinhole. With image-plane area
/// `A = 4 * half_x * half_y` at unit depth, the sampled-direction PDF
/// is `1 / (A cos^3 theta)` and We1 is `1 / (A cos^4 theta)`, which
/// makes the eye-side estimator converge to mean pixel radiance and
/// keeps light-traced splats on the same scale.
pub struct PerspectiveIdf {
    half_x: Float,
    half_y: Float,
    area: Float,
}

impl PerspectiveIdf {
    pub fn new(half_x: Float, half_y: Float) -> Self {
        Self {
            half_x,
            half_y,
            area: 4.0 * half_x * half_y,
        }
    }

    fn in_frustum(&self, dir: &Vector3f) -> bool {
        dir.z > 0.0
            && (dir.x / dir.z).abs() <= self.half_x
            && (dir.y / dir.z).abs() <= self.half_y
    }
}

impl ImportanceDistribution for PerspectiveIdf {
    fn sample_pixel(&self, p_film: &Point2f) -> DirectionSample {
        // Film y grows downward, lens-local y upward.
        let x = (2.0 * p_film.x - 1.0) * self.half_x;
        let y = (1.0 - 2.0 * p_film.y) * self.half_y;
        let dir = Vector3f::new(x, y, 1.0).normalize();
        let cos = dir.z;

        DirectionSample {
            value: SampledSpectrum::new(1.0 / (self.area * cos.powi(4))),
            dir_local: dir,
            dir_pdf: 1.0 / (self.area * cos.powi(3)),
            dir_type: DirectionType::LOW_FREQ,
            reverse_value: SampledSpectrum::zero(),
            reverse_pdf: 0.0,
        }
    }

    fn evaluate(&self, _query: &DdfQuery, dir: &Vector3f) -> (SampledSpectrum, SampledSpectrum) {
        if !self.in_frustum(dir) {
            return (SampledSpectrum::zero(), SampledSpectrum::zero());
        }

        (
            SampledSpectrum::new(1.0 / (self.area * dir.z.powi(4))),
            SampledSpectrum::zero(),
        )
    }

    fn evaluate_pdf(&self, _query: &DdfQuery, dir: &Vector3f) -> (Float, Float) {
        if !self.in_frustum(dir) {
            return (0.0, 0.0);
        }

        (1.0 / (self.area * dir.z.powi(3)), 0.0)
    }

    fn calculate_pixel(&self, dir: &Vector3f) -> Option<(Float, Float)> {
        if !self.in_frustum(dir) {
            return None;
        }

        let x = dir.x / dir.z / self.half_x;
        let y = dir.y / dir.z / self.half_y;

        Some(((x + 1.0) * 0.5, (1.0 - y) * 0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampled_directions_reproject_to_their_pixel() {
        let idf = PerspectiveIdf::new(0.6, 0.4);

        for &(px, py) in &[(0.1, 0.2), (0.5, 0.5), (0.93, 0.07)] {
            let s = idf.sample_pixel(&Point2f::new(px, py));
            let (rx, ry) = idf.calculate_pixel(&s.dir_local).unwrap();
            assert!((rx - px).abs() < 1.0e-5);
            assert!((ry - py).abs() < 1.0e-5);
        }
    }

    #[test]
    fn pdf_and_importance_relate_by_cosine() {
        let idf = PerspectiveIdf::new(0.5, 0.5);
        let s = idf.sample_pixel(&Point2f::new(0.25, 0.75));
        let q = DdfQuery::default();

        let (we1, _) = idf.evaluate(&q, &s.dir_local);
        let (pdf, _) = idf.evaluate_pdf(&q, &s.dir_local);
        assert!((s.dir_pdf - pdf).abs() / pdf < 1.0e-5);
        assert!((we1[0] - pdf / s.dir_local.z).abs() / we1[0] < 1.0e-5);
    }

    #[test]
    fn directions_outside_frustum_are_rejected() {
        let idf = PerspectiveIdf::new(0.5, 0.5);
        assert!(idf.calculate_pixel(&Vector3f::new(0.0, 0.0, -1.0)).is_none());
        assert!(idf.calculate_pixel(&Vector3f::new(0.9, 0.0, 1.0)).is_none());
    }
}
