//! Layer extraction stage.
//!
//! Turns downloaded calendar pages into thresholded, padded layers ready
//! for the e-paper firmware.

pub mod ops;
pub mod processor;

pub use processor::Processor;
