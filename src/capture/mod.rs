pub mod bridge;
pub mod sink;
