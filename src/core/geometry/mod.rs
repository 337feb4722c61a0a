pub mod vector;
pub mod point;
pub mod normal;
pub mod ray;
pub mod frame;

pub use vector::{Vector2f, Vector3f};
pub use point::{Point2f, Point3f};
pub use normal::Normal3f;
pub use ray::Ray;
pub use frame::Frame;
