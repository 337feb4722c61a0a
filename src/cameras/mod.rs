pub mod perspective;

pub use perspective::{PerspectiveCamera, PerspectiveIdf};
