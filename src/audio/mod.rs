pub mod analyzer;
pub mod automation;
pub mod bus;
pub mod megamix;
