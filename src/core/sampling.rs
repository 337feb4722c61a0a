use crate::core::common::{Float, INV_PI, PI_OVER2, PI_OVER4};
use crate::core::geometry::{Point2f, Vector3f};

pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    // Map uniform random numbers to [-1, 1]^2
    let ux = 2.0 * u.x - 1.0;
    let uy = 2.0 * u.y - 1.0;

    // Handle degeneracy at the origin
    if ux == 0.0 && uy == 0.0 {
        return Point2f::new(0.0, 0.0);
    }

    // Apply concentric mapping to point
    let (r, theta) = if ux.abs() > uy.abs() {
        (ux, PI_OVER4 * (uy / ux))
    } else {
        (uy, PI_OVER2 - PI_OVER4 * (ux / uy))
    };

    Point2f::new(r * theta.cos(), r * theta.sin())
}

pub fn cosine_sample_hemisphere(u: &Point2f) -> Vector3f {
    let d = concentric_sample_disk(u);
    let z = (0.0 as Float).max(1.0 - d.x * d.x - d.y * d.y).sqrt();

    Vector3f::new(d.x, d.y, z)
}

pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::XorShiftRng;

    #[test]
    fn cosine_samples_lie_on_upper_hemisphere() {
        let mut rng = XorShiftRng::new(3);
        for _ in 0..1000 {
            let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let w = cosine_sample_hemisphere(&u);
            assert!(w.z >= 0.0);
            assert!((w.length() - 1.0).abs() < 1.0e-3);
        }
    }

    #[test]
    fn disk_samples_stay_in_disk() {
        let mut rng = XorShiftRng::new(11);
        for _ in 0..1000 {
            let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let d = concentric_sample_disk(&u);
            assert!(d.x * d.x + d.y * d.y <= 1.0 + 1.0e-6);
        }
    }
}
