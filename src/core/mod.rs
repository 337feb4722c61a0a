pub mod common;
pub mod geometry;
pub mod rng;
pub mod spectrum;
pub mod sampling;
pub mod ddf;
pub mod reflection;
pub mod light;
pub mod camera;
pub mod interaction;
pub mod scene;
pub mod film;
pub mod settings;
