use crate::core::common::Float;
use crate::core::geometry::vector::Vector3f;
use std::ops::Neg;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Normal3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Normal3f {
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    pub fn dot_vec(&self, v: &Vector3f) -> Float {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    pub fn abs_dot_vec(&self, v: &Vector3f) -> Float {
        self.dot_vec(v).abs()
    }

    pub fn as_vec(&self) -> Vector3f {
        Vector3f::new(self.x, self.y, self.z)
    }
}

impl From<Vector3f> for Normal3f {
    fn from(v: Vector3f) -> Self {
        Normal3f::new(v.x, v.y, v.z)
    }
}

impl Neg for Normal3f {
    type Output = Normal3f;

    fn neg(self) -> Self {
        Normal3f::new(-self.x, -self.y, -self.z)
    }
}
