use crate::core::common::Float;
use crate::core::geometry::vector::Vector3f;
use std::ops::{Add, AddAssign, Sub};

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point2f {
    pub x: Float,
    pub y: Float,
}

impl Point2f {
    pub fn new(x: Float, y: Float) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Point3f {
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    pub fn distance_squared(&self, p: &Self) -> Float {
        (*p - *self).length_squared()
    }

    pub fn distance(&self, p: &Self) -> Float {
        self.distance_squared(p).sqrt()
    }
}

impl Add<Vector3f> for Point3f {
    type Output = Point3f;

    fn add(self, rhs: Vector3f) -> Self {
        Point3f::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign<Vector3f> for Point3f {
    fn add_assign(&mut self, rhs: Vector3f) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Point3f {
    type Output = Vector3f;

    fn sub(self, rhs: Self) -> Vector3f {
        Vector3f::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub<Vector3f> for Point3f {
    type Output = Point3f;

    fn sub(self, rhs: Vector3f) -> Point3f {
        Point3f::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
