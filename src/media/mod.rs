pub mod catalog;
pub mod decode;
pub mod pcm;
pub mod player;
pub mod rack;
pub mod raster;
pub mod store;
