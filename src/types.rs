//! Common types shared across the crate

use std::io;

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while opening, decoding or encoding an image
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the source or writing the output failed
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The codec rejected the source image
    #[error("decode error: {0}")]
    Decode(#[from] jpeg_decoder::Error),

    /// The codec failed to produce the output image
    #[error("encode error: {0}")]
    Encode(#[from] jpeg_encoder::EncodingError),

    /// A caller-supplied parameter is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// The operation is not valid for the handle's current state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The source uses a JPEG feature this library does not handle
    #[error("unsupported format: {0}")]
    UnsupportedFormat(&'static str),
}

/// Pixel layout of decoded pixels and of the re-encoded output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// 8-bit grayscale
    Gray8,
    /// 8-bit RGB, 3 bytes per pixel
    Rgb8,
    /// 8-bit BGR, 3 bytes per pixel
    Bgr8,
    /// 8-bit RGBA, 4 bytes per pixel (alpha is opaque)
    Rgba8,
    /// 8-bit BGRA, 4 bytes per pixel (alpha is opaque)
    Bgra8,
    /// 8-bit CMYK, 4 bytes per pixel
    Cmyk,
}

impl ColorSpace {
    /// Bytes occupied by one pixel in this layout
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorSpace::Gray8 => 1,
            ColorSpace::Rgb8 | ColorSpace::Bgr8 => 3,
            ColorSpace::Rgba8 | ColorSpace::Bgra8 | ColorSpace::Cmyk => 4,
        }
    }
}

/// Crop rectangle in decoded (post-scale) pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Thumbnail metadata carried in `Thumb::*` comment segments
///
/// Fields are independent; a source may carry any subset of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailInfo {
    /// URI of the image the thumbnail was generated from
    pub uri: Option<String>,
    /// Modification time of the original, seconds since the Unix epoch
    pub mtime: Option<u64>,
    /// Width of the original image in pixels
    pub width: Option<u32>,
    /// Height of the original image in pixels
    pub height: Option<u32>,
    /// Mimetype of the original image
    pub mimetype: Option<String>,
}
