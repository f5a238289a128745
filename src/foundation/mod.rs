pub mod clock;
pub mod color;
pub mod core;
pub mod error;
pub(crate) mod math;
