use crate::core::common::Float;
use crate::core::common::PI;
use crate::core::geometry::{Frame, Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::sampling::concentric_sample_disk;
use crate::shapes::{Shape, ShapeHit};

/// Flat disk centered at a point, oriented by its normal.
pub struct Disk {
    center: Point3f,
    normal: Normal3f,
    frame: Frame,
    radius: Float,
}

impl Disk {
    pub fn new(center: Point3f, normal: Normal3f, radius: Float) -> Self {
        assert!(radius > 0.0, "degenerate disk");
        Self {
            center,
            normal,
            frame: Frame::from_normal(&normal),
            radius,
        }
    }
}

impl Shape for Disk {
    fn intersect(&self, ray: &Ray) -> Option<ShapeHit> {
        let n = self.normal.as_vec();
        let denom = ray.d.dot(&n);
        if denom.abs() < 1.0e-8 {
            return None;
        }

        let t = (self.center - ray.o).dot(&n) / denom;
        if t <= Ray::EPSILON || t >= ray.t_max {
            return None;
        }

        let p = ray.find_point(t);
        if (p - self.center).length_squared() > self.radius * self.radius {
            return None;
        }

        Some(ShapeHit {
            t,
            p,
            n: self.normal,
        })
    }

    fn sample_position(&self, u: (Float, Float)) -> (Point3f, Normal3f) {
        let d = concentric_sample_disk(&Point2f::new(u.0, u.1));
        let local = Vector3f::new(d.x * self.radius, d.y * self.radius, 0.0);
        (self.center + self.frame.from_local(&local), self.normal)
    }

    fn area(&self) -> Float {
        PI * self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_disk() -> Disk {
        Disk::new(
            Point3f::new(0.0, 0.0, 2.0),
            Normal3f::new(0.0, 0.0, -1.0),
            1.0,
        )
    }

    #[test]
    fn ray_hits_inside_radius_only() {
        let disk = unit_disk();
        let up = Vector3f::new(0.0, 0.0, 1.0);

        let hit = disk
            .intersect(&Ray::new(&Point3f::new(0.5, 0.0, 0.0), &up, 10.0, 0.0))
            .unwrap();
        assert!((hit.t - 2.0).abs() < 1.0e-5);

        assert!(disk
            .intersect(&Ray::new(&Point3f::new(1.5, 0.0, 0.0), &up, 10.0, 0.0))
            .is_none());
    }

    #[test]
    fn samples_lie_within_radius() {
        let disk = unit_disk();
        for &u in &[(0.1, 0.9), (0.5, 0.5), (0.99, 0.01)] {
            let (p, n) = disk.sample_position(u);
            assert!((p - Point3f::new(0.0, 0.0, 2.0)).length() <= 1.0 + 1.0e-5);
            assert_eq!(n, Normal3f::new(0.0, 0.0, -1.0));
        }
    }
}
