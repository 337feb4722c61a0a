use crate::core::common::Float;
use crate::core::geometry::{Normal3f, Point3f, Ray, Vector3f};
use crate::shapes::{Shape, ShapeHit};

/// Parallelogram spanned by two edge vectors from a corner point. The
/// geometric normal follows `e1 x e2`.
pub struct Rectangle {
    p0: Point3f,
    e1: Vector3f,
    e2: Vector3f,
    normal: Normal3f,
    area: Float,
}

impl Rectangle {
    pub fn new(p0: Point3f, e1: Vector3f, e2: Vector3f) -> Self {
        let cross = e1.cross(&e2);
        let area = cross.length();
        assert!(area > 0.0, "degenerate rectangle");

        Self {
            p0,
            e1,
            e2,
            normal: Normal3f::from(cross / area),
            area,
        }
    }
}

impl Shape for Rectangle {
    fn intersect(&self, ray: &Ray) -> Option<ShapeHit> {
        let n = self.normal.as_vec();
        let denom = ray.d.dot(&n);
        if denom.abs() < 1.0e-8 {
            return None;
        }

        let t = (self.p0 - ray.o).dot(&n) / denom;
        if t <= Ray::EPSILON || t >= ray.t_max {
            return None;
        }

        // Planar coordinates of the hit relative to the spanning edges.
        let p = ray.find_point(t);
        let d = p - self.p0;
        let e1e1 = self.e1.dot(&self.e1);
        let e1e2 = self.e1.dot(&self.e2);
        let e2e2 = self.e2.dot(&self.e2);
        let de1 = d.dot(&self.e1);
        let de2 = d.dot(&self.e2);
        let det = e1e1 * e2e2 - e1e2 * e1e2;
        let u = (de1 * e2e2 - de2 * e1e2) / det;
        let v = (de2 * e1e1 - de1 * e1e2) / det;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }

        Some(ShapeHit {
            t,
            p,
            n: self.normal,
        })
    }

    fn sample_position(&self, u: (Float, Float)) -> (Point3f, Normal3f) {
        (self.p0 + self.e1 * u.0 + self.e2 * u.1, self.normal)
    }

    fn area(&self) -> Float {
        self.area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Rectangle {
        Rectangle::new(
            Point3f::new(0.0, 0.0, 0.0),
            Vector3f::new(1.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn ray_hits_interior_and_misses_exterior() {
        let rect = unit_square();
        let down = Vector3f::new(0.0, 0.0, -1.0);

        let hit = rect
            .intersect(&Ray::new(&Point3f::new(0.5, 0.5, 1.0), &down, 10.0, 0.0))
            .unwrap();
        assert!((hit.t - 1.0).abs() < 1.0e-5);
        assert!((hit.n.z - 1.0).abs() < 1.0e-6);

        assert!(rect
            .intersect(&Ray::new(&Point3f::new(1.5, 0.5, 1.0), &down, 10.0, 0.0))
            .is_none());
    }

    #[test]
    fn samples_stay_on_surface() {
        let rect = unit_square();
        let (p, n) = rect.sample_position((0.25, 0.75));
        assert_eq!(p, Point3f::new(0.25, 0.75, 0.0));
        assert!((n.z - 1.0).abs() < 1.0e-6);
        assert!((rect.area() - 1.0).abs() < 1.0e-6);
    }
}
