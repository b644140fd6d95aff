//! Firmware image packing.
//!
//! Turns extracted layers into the `.bin` images the panel firmware reads.

pub mod packer;

pub use packer::Packer;
