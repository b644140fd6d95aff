//! PNG to panel image conversion.
//!
//! Output format:
//! * two bytes: length of the encoded data, little endian
//! * the encoded data: an LZSS-compressed 1-bit-per-pixel stream
//!
//! Pixels are scanned left to right, top to bottom, least significant bit
//! first. A black pixel is 0 and any other value is 1; the tail of the last
//! byte is filled with 1 bits. Dimensions are not stored, the firmware
//! knows them.

use crate::error::PackError;
use crate::models::{RunSummary, Stage};
use crate::progress::progress_bar;
use anyhow::{Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use lzss::{Lzss, SliceReader, VecWriter};
use png::{BitDepth, ColorType};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// LZSS parameters the firmware decoder is built with.
type PanelLzss = Lzss<10, 4, 0x20, { 1 << 10 }, { 2 << 10 }>;

/// A decoded 8-bit grayscale layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayLayer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Sizes of one converted file.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedFile {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub png_bytes: u64,
    pub bin_bytes: usize,
}

/// Converts every PNG in a directory into a `.bin` next to it.
pub struct Packer {
    dir: PathBuf,
}

impl Packer {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// PNG files in the directory, by name.
    pub fn inputs(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read directory: {}", self.dir.display()))?;

        let mut inputs = Vec::new();
        for entry in entries {
            let entry = entry.context("File access")?;
            let is_png = entry
                .file_name()
                .to_str()
                .map(|name| name.to_lowercase().ends_with(".png"))
                .unwrap_or(false);
            if is_png && entry.path().is_file() {
                inputs.push(entry.path());
            }
        }
        inputs.sort();
        Ok(inputs)
    }

    /// Pack every PNG in the directory; failures are recorded, not fatal.
    pub fn run(&self, show_progress: bool) -> Result<RunSummary> {
        info!("Packing PNG layers in {}", self.dir.display());

        let inputs = self.inputs()?;
        let mut summary = RunSummary::new(Stage::Pack);
        let progress = progress_bar(inputs.len() as u64, show_progress)?;

        for input in &inputs {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(ref pb) = progress {
                pb.set_message(name.clone());
            }

            match pack_file(input) {
                Ok(packed) => {
                    info!(
                        "{} {}x{}, PNG: {} bytes, BIN: {} bytes",
                        name, packed.width, packed.height, packed.png_bytes, packed.bin_bytes
                    );
                    debug!("Wrote {}", packed.output.display());
                    summary.saved += 1;
                }
                Err(e) => {
                    warn!("{}: {}", name, e);
                    summary.record_failure(name, e.to_string());
                }
            }

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Packing complete");
        }

        summary.finish();
        info!(
            "Packing finished: {} packed, {} failed",
            summary.saved,
            summary.failed()
        );

        Ok(summary)
    }
}

/// Convert one PNG into `<name>.bin` beside it.
pub fn pack_file(input: &Path) -> Result<PackedFile, PackError> {
    input
        .file_name()
        .and_then(|f| f.to_str())
        .ok_or(PackError::UnprocessablePath)?;

    let layer = read_layer(input)?;
    let compressed = compress(&to_bitstream(&layer.pixels))?;
    let encoded = encode_bin(&compressed)?;

    let output = input.with_extension("bin");
    std::fs::write(&output, &encoded).map_err(|source| PackError::Io {
        path: output.clone(),
        source,
    })?;

    let png_bytes = input
        .metadata()
        .map_err(|source| PackError::Io {
            path: input.to_path_buf(),
            source,
        })?
        .len();

    Ok(PackedFile {
        output,
        width: layer.width,
        height: layer.height,
        png_bytes,
        bin_bytes: encoded.len(),
    })
}

/// Decode a PNG, accepting only 8-bit grayscale.
pub fn read_layer(path: &Path) -> Result<GrayLayer, PackError> {
    let file = File::open(path).map_err(|source| PackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = png::Decoder::new(file).read_info()?;

    match reader.output_color_type() {
        (ColorType::Grayscale, BitDepth::Eight) => {}
        (ColorType::Grayscale, depth) => return Err(PackError::NotEightBit(depth)),
        (color, _) => return Err(PackError::NotGrayscale(color)),
    }

    let mut pixels = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels)?;
    pixels.truncate(info.buffer_size());
    debug!("Decoded {} ({}x{})", path.display(), info.width, info.height);

    Ok(GrayLayer {
        width: info.width,
        height: info.height,
        pixels,
    })
}

/// One bit per pixel, LSB first: 0 for black, 1 otherwise.
pub fn to_bitstream(pixels: &[u8]) -> Vec<u8> {
    let mut bits = vec![0xFF_u8; pixels.len().div_ceil(8)];
    for (index, &pixel) in pixels.iter().enumerate() {
        if pixel == 0 {
            bits[index / 8] &= !(1 << (index % 8));
        }
    }
    bits
}

pub fn compress(bitstream: &[u8]) -> Result<Vec<u8>, PackError> {
    PanelLzss::compress(
        SliceReader::new(bitstream),
        VecWriter::with_capacity(32_768),
    )
    .map_err(|e| PackError::Compress(e.to_string()))
}

/// Prefix the compressed data with its `u16` little-endian length.
pub fn encode_bin(compressed: &[u8]) -> Result<Vec<u8>, PackError> {
    let len = u16::try_from(compressed.len()).map_err(|_| PackError::TooLarge(compressed.len()))?;

    let mut out = vec![0; 2];
    LittleEndian::write_u16(&mut out, len);
    out.extend_from_slice(compressed);
    Ok(out)
}
