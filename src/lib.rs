// clippy
#![cfg_attr(
    feature = "cargo-clippy",
    allow(
        clippy::many_single_char_names,
        clippy::too_many_arguments,
        clippy::excessive_precision,
        clippy::float_cmp
    )
)]

pub mod core;
pub mod shapes;
pub mod materials;
pub mod cameras;
pub mod integrators;
