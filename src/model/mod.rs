pub mod layers;
pub mod ops;
pub mod playlist;
pub mod state;
