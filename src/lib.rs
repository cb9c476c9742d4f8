pub mod analysis;
pub mod core;
pub mod engine;
pub mod hal;
pub mod playback;
pub mod sources;
