//! Domain error types.
//!
//! Application boundaries use `anyhow`; these enums describe the failures
//! the pipeline stages distinguish and report per item.

use std::path::PathBuf;
use thiserror::Error;

/// Failure fetching a single candidate URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} errored with {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure processing a single calendar image.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("image is {width}x{height}, too small to crop {needed_width}x{needed_height} of margins")]
    TooSmall {
        width: u32,
        height: u32,
        needed_width: u32,
        needed_height: u32,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure packing a single layer into the panel format.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("path can not be converted to a file name")]
    UnprocessablePath,

    #[error("file is not a grayscale image ({0:?})")]
    NotGrayscale(png::ColorType),

    #[error("file is not an 8-bit image ({0:?})")]
    NotEightBit(png::BitDepth),

    #[error("failed to decode PNG: {0}")]
    Decode(#[from] png::DecodingError),

    #[error("compressed image is {0} bytes, more than the u16 length header allows")]
    TooLarge(usize),

    #[error("LZSS compression failed: {0}")]
    Compress(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("url_template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),

    #[error("at least one upload folder is required")]
    NoUploadFolders,
}
