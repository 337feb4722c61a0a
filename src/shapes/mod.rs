use enum_dispatch::enum_dispatch;

use crate::core::common::Float;
use crate::core::geometry::{Normal3f, Point3f, Ray};

pub mod disk;
pub mod rectangle;

pub use disk::Disk;
pub use rectangle::Rectangle;

/// Geometry record returned by `Shape::intersect`.
pub struct ShapeHit {
    pub t: Float,
    pub p: Point3f,
    pub n: Normal3f,
}

#[enum_dispatch]
pub trait Shape {
    /// Nearest hit along the ray within `(EPSILON, t_max)`.
    fn intersect(&self, ray: &Ray) -> Option<ShapeHit>;
    /// Uniform position sample over the surface.
    fn sample_position(&self, u: (Float, Float)) -> (Point3f, Normal3f);
    fn area(&self) -> Float;
}

#[enum_dispatch(Shape)]
pub enum Shapes {
    Rectangle,
    Disk,
}
