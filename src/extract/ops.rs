//! Pixel operations for calendar page extraction.
//!
//! Values follow 8-bit OpenCV conventions: hue is stored as degrees/2
//! (0..=179), luma uses the fixed-point BT.601 weights and thresholds
//! are strict.

use crate::error::ExtractError;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::{self, ThresholdType};

/// Rows removed from the top and bottom of every page.
pub const MARGIN_Y: u32 = 25;
/// Columns removed from the left and right of every page.
pub const MARGIN_X: u32 = 40;
/// Footer rows dropped from side A after the margin crop.
pub const SIDE_A_FOOTER: u32 = 230;
/// Horizontal padding on each side of the side A layers.
pub const SIDE_A_PADDING: u32 = 38;
/// Horizontal padding on each side of the side B layer.
pub const SIDE_B_PADDING: u32 = 39;
/// Side B is resized to this before padding.
pub const SIDE_B_SIZE: (u32, u32) = (402, 648);

const RED_THRESHOLD: u8 = 64;
const RED_LEVEL: u8 = 192;
const INK_THRESHOLD: u8 = 170;

/// Inclusive OpenCV-scaled HSV range.
#[derive(Debug, Clone, Copy)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// Red wraps around hue 0, so it takes two ranges.
pub const RED_RANGES: [HsvRange; 2] = [
    HsvRange {
        lower: [0, 100, 20],
        upper: [25, 255, 255],
    },
    HsvRange {
        lower: [145, 100, 20],
        upper: [179, 255, 255],
    },
];

/// Remove the fixed page margins.
pub fn crop_margins(img: &RgbImage) -> Result<RgbImage, ExtractError> {
    crop_edges(img, MARGIN_X, MARGIN_Y, MARGIN_Y)
}

/// Drop `rows` rows from the bottom of the image.
pub fn trim_bottom(img: &RgbImage, rows: u32) -> Result<RgbImage, ExtractError> {
    crop_edges(img, 0, 0, rows)
}

fn crop_edges(img: &RgbImage, sides: u32, top: u32, bottom: u32) -> Result<RgbImage, ExtractError> {
    let (width, height) = img.dimensions();
    let needed_width = sides * 2;
    let needed_height = top + bottom;

    if width <= needed_width || height <= needed_height {
        return Err(ExtractError::TooSmall {
            width,
            height,
            needed_width,
            needed_height,
        });
    }

    Ok(imageops::crop_imm(img, sides, top, width - needed_width, height - needed_height).to_image())
}

const HSV_SHIFT: u32 = 12;

/// Round-half-even `numerator / (scale * i)` for every `i` in 1..=255, 0 at index 0.
const fn div_table(numerator: i32, scale: i32) -> [i32; 256] {
    let mut table = [0; 256];
    let mut i = 1;
    while i < 256 {
        let divisor = scale * i as i32;
        let quotient = numerator / divisor;
        let twice_rem = 2 * (numerator % divisor);
        table[i] = if twice_rem > divisor || (twice_rem == divisor && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        };
        i += 1;
    }
    table
}

static SDIV_TABLE: [i32; 256] = div_table(255 << HSV_SHIFT, 1);
static HDIV_TABLE: [i32; 256] = div_table(180 << HSV_SHIFT, 6);

/// Convert a pixel to 8-bit HSV with OpenCV's fixed-point arithmetic.
pub fn to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(i32::from);
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);
    let round = 1 << (HSV_SHIFT - 1);

    let s = (diff * SDIV_TABLE[v as usize] + round) >> HSV_SHIFT;

    let hue = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    let mut h = (hue * HDIV_TABLE[diff as usize] + round) >> HSV_SHIFT;
    if h < 0 {
        h += 180;
    }

    [h as u8, s as u8, v as u8]
}

/// 255 where the pixel falls in any of `ranges`, 0 elsewhere.
pub fn hsv_mask(img: &RgbImage, ranges: &[HsvRange]) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let hsv = to_hsv(*img.get_pixel(x, y));
        if ranges.iter().any(|range| range.contains(hsv)) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Keep pixels where the mask is set, black out the rest.
pub fn apply_mask(img: &RgbImage, mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        if mask.get_pixel(x, y)[0] != 0 {
            *img.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// BT.601 luma with OpenCV's 14-bit fixed-point rounding.
pub fn luma(pixel: Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let y = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14;
    y as u8
}

pub fn to_luma(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([luma(*img.get_pixel(x, y))])
    })
}

/// Binary threshold: `maxval` where the value is strictly above `thresh`, else 0.
pub fn threshold(img: &GrayImage, thresh: u8, maxval: u8) -> GrayImage {
    let mut out = contrast::threshold(img, thresh, ThresholdType::Binary);
    if maxval != 255 {
        for p in out.pixels_mut() {
            p[0] = if p[0] != 0 { maxval } else { 0 };
        }
    }
    out
}

/// Per-channel binary threshold of a color image.
pub fn threshold_rgb(img: &RgbImage, thresh: u8, maxval: u8) -> RgbImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        p.0 = p.0.map(|c| binarize(c, thresh, maxval));
    }
    out
}

fn binarize(value: u8, thresh: u8, maxval: u8) -> u8 {
    if value > thresh {
        maxval
    } else {
        0
    }
}

/// Add constant-valued columns on the left and right.
pub fn pad_horizontal(img: &GrayImage, left: u32, right: u32, value: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut out = GrayImage::from_pixel(width + left + right, height, Luma([value]));
    imageops::replace(&mut out, img, left as i64, 0);
    out
}

/// Red and black layers of the front page.
pub struct SideALayers {
    pub red: GrayImage,
    pub black: GrayImage,
}

/// Build the red and black layers from a decoded side A page.
pub fn extract_side_a(page: &RgbImage) -> Result<SideALayers, ExtractError> {
    let cropped = trim_bottom(&crop_margins(page)?, SIDE_A_FOOTER)?;

    let mask = hsv_mask(&cropped, &RED_RANGES);
    let red = to_luma(&apply_mask(&cropped, &mask));
    let red = threshold(&red, RED_THRESHOLD, RED_LEVEL);
    let red = pad_horizontal(&red, SIDE_A_PADDING, SIDE_A_PADDING, 0);

    let black = to_luma(&threshold_rgb(&cropped, INK_THRESHOLD, 255));
    let black = pad_horizontal(&black, SIDE_A_PADDING, SIDE_A_PADDING, 0);

    Ok(SideALayers { red, black })
}

/// Build the single black layer from a decoded side B page.
pub fn extract_side_b(page: &RgbImage) -> Result<GrayImage, ExtractError> {
    let cropped = crop_margins(page)?;
    let gray = threshold(&to_luma(&cropped), INK_THRESHOLD, 255);
    let (width, height) = SIDE_B_SIZE;
    let resized = imageops::resize(&gray, width, height, FilterType::Triangle);
    Ok(pad_horizontal(&resized, SIDE_B_PADDING, SIDE_B_PADDING, 255))
}
