use crate::core::common::{Float, INFINITY};
use crate::core::geometry::point::Point3f;
use crate::core::geometry::vector::Vector3f;

#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub o: Point3f,
    pub d: Vector3f,
    pub t_max: Float,
    pub time: Float,
}

impl Ray {
    /// Offset applied along the direction (or surface normal) when
    /// spawning rays from a surface, to dodge self-intersection.
    pub const EPSILON: Float = 1.0e-4;

    pub fn new(o: &Point3f, d: &Vector3f, t_max: Float, time: Float) -> Self {
        Self {
            o: *o,
            d: *d,
            t_max,
            time,
        }
    }

    pub fn find_point(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            o: Point3f::default(),
            d: Vector3f::default(),
            t_max: INFINITY,
            time: 0.0,
        }
    }
}
