pub mod bpt;

pub use bpt::BptRenderer;
