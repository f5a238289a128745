pub mod particles;
pub mod styles;
pub mod text;
pub mod visualizer;
