use crate::core::geometry::normal::Normal3f;
use crate::core::geometry::vector::{coordinate_system, Vector3f};

/// Orthonormal shading frame. `z` is the shading normal; scattering
/// distributions work in this local space.
#[derive(Debug, Default, Copy, Clone)]
pub struct Frame {
    pub x: Vector3f,
    pub y: Vector3f,
    pub z: Vector3f,
}

impl Frame {
    pub fn from_z(z: &Vector3f) -> Self {
        let z = z.normalize();
        let (x, y) = coordinate_system(&z);

        Self { x, y, z }
    }

    pub fn from_normal(n: &Normal3f) -> Self {
        Frame::from_z(&n.as_vec())
    }

    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.x), v.dot(&self.y), v.dot(&self.z))
    }

    pub fn from_local(&self, v: &Vector3f) -> Vector3f {
        self.x * v.x + self.y * v.y + self.z * v.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let f = Frame::from_z(&Vector3f::new(0.3, -0.4, 0.87));
        let v = Vector3f::new(0.2, 0.5, -0.8);
        let w = f.from_local(&f.to_local(&v));
        assert!((w - v).length() < 1.0e-5);
    }
}
