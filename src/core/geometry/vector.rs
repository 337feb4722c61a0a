use crate::core::common::Float;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Neg, Sub, SubAssign};

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector2f {
    pub x: Float,
    pub y: Float,
}

impl Vector2f {
    pub fn new(x: Float, y: Float) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector3f {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Vector3f {
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn has_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    pub fn length_squared(&self) -> Float {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }

    pub fn normalize(&self) -> Self {
        *self / self.length()
    }

    pub fn dot(&self, v: &Self) -> Float {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    pub fn abs_dot(&self, v: &Self) -> Float {
        self.dot(v).abs()
    }

    pub fn cross(&self, v: &Self) -> Self {
        Self::new(
            self.y * v.z - self.z * v.y,
            self.z * v.x - self.x * v.z,
            self.x * v.y - self.y * v.x,
        )
    }

    pub fn max_component(&self) -> Float {
        self.x.max(self.y).max(self.z)
    }
}

/// Builds two vectors completing v1 to an orthonormal basis. v1 must be
/// normalized.
pub fn coordinate_system(v1: &Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if v1.x.abs() > v1.y.abs() {
        Vector3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vector3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };

    (v2, v1.cross(&v2))
}

impl Add for Vector3f {
    type Output = Vector3f;

    fn add(self, rhs: Self) -> Self {
        Vector3f::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3f {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vector3f {
    type Output = Vector3f;

    fn sub(self, rhs: Self) -> Self {
        Vector3f::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vector3f {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Neg for Vector3f {
    type Output = Vector3f;

    fn neg(self) -> Self {
        Vector3f::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Float> for Vector3f {
    type Output = Vector3f;

    fn mul(self, rhs: Float) -> Self {
        Vector3f::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl MulAssign<Float> for Vector3f {
    fn mul_assign(&mut self, rhs: Float) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl Div<Float> for Vector3f {
    type Output = Vector3f;

    fn div(self, rhs: Float) -> Self {
        assert_ne!(rhs, 0.0);
        let d = 1.0 / rhs;

        Vector3f::new(self.x * d, self.y * d, self.z * d)
    }
}

impl DivAssign<Float> for Vector3f {
    fn div_assign(&mut self, rhs: Float) {
        assert_ne!(rhs, 0.0);
        let d = 1.0 / rhs;
        self.x *= d;
        self.y *= d;
        self.z *= d;
    }
}

impl Index<usize> for Vector3f {
    type Output = Float;

    fn index(&self, i: usize) -> &Float {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vector3f index out of bounds"),
        }
    }
}
