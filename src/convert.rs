//! Pixel layout conversion between codec output and requested color spaces

use jpeg_decoder::PixelFormat;

use crate::types::{ColorSpace, Error, Result};

/// Map the codec's native output format onto a [`ColorSpace`].
pub fn native_color_space(format: PixelFormat) -> Result<ColorSpace> {
    match format {
        PixelFormat::L8 => Ok(ColorSpace::Gray8),
        PixelFormat::RGB24 => Ok(ColorSpace::Rgb8),
        PixelFormat::CMYK32 => Ok(ColorSpace::Cmyk),
        PixelFormat::L16 => Err(Error::UnsupportedFormat("16-bit lossless JPEG")),
    }
}

/// Convert decoded pixels to the requested color space.
pub fn convert(pixels: &[u8], format: PixelFormat, target: ColorSpace) -> Result<Vec<u8>> {
    match format {
        PixelFormat::L8 => from_gray(pixels, target),
        PixelFormat::RGB24 => from_rgb(pixels, target),
        PixelFormat::CMYK32 => from_cmyk(pixels, target),
        PixelFormat::L16 => Err(Error::UnsupportedFormat("16-bit lossless JPEG")),
    }
}

// Integer BT.601 luma, same fixed-point weights the codec uses for YCbCr
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

fn from_gray(pixels: &[u8], target: ColorSpace) -> Result<Vec<u8>> {
    let out = match target {
        ColorSpace::Gray8 => pixels.to_vec(),
        ColorSpace::Rgb8 | ColorSpace::Bgr8 => {
            let mut out = Vec::with_capacity(pixels.len() * 3);
            for &v in pixels {
                out.extend_from_slice(&[v, v, v]);
            }
            out
        }
        ColorSpace::Rgba8 | ColorSpace::Bgra8 => {
            let mut out = Vec::with_capacity(pixels.len() * 4);
            for &v in pixels {
                out.extend_from_slice(&[v, v, v, 0xFF]);
            }
            out
        }
        ColorSpace::Cmyk => {
            return Err(Error::InvalidParameter(
                "CMYK output requires a CMYK source",
            ))
        }
    };
    Ok(out)
}

fn from_rgb(pixels: &[u8], target: ColorSpace) -> Result<Vec<u8>> {
    let count = pixels.len() / 3;
    let out = match target {
        ColorSpace::Gray8 => {
            let mut out = Vec::with_capacity(count);
            for px in pixels.chunks_exact(3) {
                out.push(luma(px[0], px[1], px[2]));
            }
            out
        }
        ColorSpace::Rgb8 => pixels.to_vec(),
        ColorSpace::Bgr8 => {
            let mut out = Vec::with_capacity(count * 3);
            for px in pixels.chunks_exact(3) {
                out.extend_from_slice(&[px[2], px[1], px[0]]);
            }
            out
        }
        ColorSpace::Rgba8 => {
            let mut out = Vec::with_capacity(count * 4);
            for px in pixels.chunks_exact(3) {
                out.extend_from_slice(&[px[0], px[1], px[2], 0xFF]);
            }
            out
        }
        ColorSpace::Bgra8 => {
            let mut out = Vec::with_capacity(count * 4);
            for px in pixels.chunks_exact(3) {
                out.extend_from_slice(&[px[2], px[1], px[0], 0xFF]);
            }
            out
        }
        ColorSpace::Cmyk => {
            return Err(Error::InvalidParameter(
                "CMYK output requires a CMYK source",
            ))
        }
    };
    Ok(out)
}

fn from_cmyk(pixels: &[u8], target: ColorSpace) -> Result<Vec<u8>> {
    if target == ColorSpace::Cmyk {
        return Ok(pixels.to_vec());
    }

    // Adobe-style inverted CMYK: channel * k / 255 recovers the RGB value
    let count = pixels.len() / 4;
    let mut rgb = Vec::with_capacity(count * 3);
    for px in pixels.chunks_exact(4) {
        let k = px[3] as u32;
        rgb.push((px[0] as u32 * k / 255) as u8);
        rgb.push((px[1] as u32 * k / 255) as u8);
        rgb.push((px[2] as u32 * k / 255) as u8);
    }
    from_rgb(&rgb, target)
}
