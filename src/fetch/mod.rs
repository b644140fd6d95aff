//! Calendar page download stage.
//!
//! This module fetches the source pages over HTTP into a local directory.

pub mod downloader;

pub use downloader::Downloader;
