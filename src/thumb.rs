//! The image handle and its open, configure, decode, transform, encode
//! lifecycle
//!
//! Decoding is lazy: the source header is parsed at open, the heavy decode
//! runs on the first call that needs pixels. Configuration that influences
//! decoding is rejected once a frame exists.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use jpeg_decoder::Decoder;
use jpeg_encoder::{ColorType, Encoder};
use log::{debug, trace};

use crate::convert;
use crate::markers;
use crate::types::{ColorSpace, CropRect, Error, Result, ThumbnailInfo};
use crate::DEFAULT_QUALITY;

/// Decoded frame held by the handle after the decode step
struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    color_space: ColorSpace,
}

/// Opaque JPEG thumbnail handle
///
/// Holds the source bytes, the requested decode/encode configuration and,
/// once decoding has run, the decoded frame. Dropping the handle releases
/// everything; there is no explicit close.
pub struct Thumbnailer {
    // Source
    data: Vec<u8>,
    path: Option<PathBuf>,
    mtime: Option<u64>,
    width: u32,
    height: u32,
    native: ColorSpace,
    comments: Vec<String>,

    // Configuration
    decode_size: Option<(u32, u32)>,
    decode_color_space: Option<ColorSpace>,
    quality: u8,
    comment: Option<String>,
    thumbnail_comments: bool,
    crop: Option<CropRect>,

    // State
    frame: Option<Frame>,
}

impl Thumbnailer {
    /// Open a JPEG file.
    ///
    /// The whole file is read into memory and the header is parsed up front,
    /// so a non-JPEG or truncated source fails here rather than at encode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mtime = fs::metadata(path)?
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());

        let mut image = Self::from_memory(data)?;
        image.path = Some(path.to_path_buf());
        image.mtime = mtime;
        Ok(image)
    }

    /// Open a JPEG already held in memory.
    pub fn from_memory(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();

        let mut decoder = Decoder::new(Cursor::new(&data));
        decoder.read_info()?;
        let info = decoder
            .info()
            .ok_or(Error::UnsupportedFormat("missing frame header"))?;
        let native = convert::native_color_space(info.pixel_format)?;
        let comments = markers::comments(&data)?;

        debug!(
            "opened jpeg: {}x{} {:?}, {} comment(s)",
            info.width,
            info.height,
            info.pixel_format,
            comments.len()
        );

        Ok(Self {
            data,
            path: None,
            mtime: None,
            width: info.width as u32,
            height: info.height as u32,
            native,
            comments,
            decode_size: None,
            decode_color_space: None,
            quality: DEFAULT_QUALITY,
            comment: None,
            thumbnail_comments: false,
            crop: None,
            frame: None,
        })
    }

    /// Width of the source image in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the source image in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source dimensions as `(width, height)`
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Native decode color space of the source
    pub fn color_space(&self) -> ColorSpace {
        self.native
    }

    /// First plain comment of the source, skipping thumbnail metadata
    pub fn comment(&self) -> Option<&str> {
        self.comments
            .iter()
            .map(String::as_str)
            .find(|c| !c.starts_with("Thumb::"))
    }

    /// Thumbnail metadata parsed from the source's `Thumb::*` comments
    pub fn thumbnail_info(&self) -> ThumbnailInfo {
        let mut info = ThumbnailInfo::default();
        for comment in &self.comments {
            let Some((key, value)) = comment.split_once('\n') else {
                continue;
            };
            match key {
                "Thumb::URI" => info.uri = Some(value.to_owned()),
                "Thumb::MTime" => info.mtime = value.parse().ok(),
                "Thumb::Image::Width" => info.width = value.parse().ok(),
                "Thumb::Image::Height" => info.height = value.parse().ok(),
                "Thumb::Mimetype" => info.mimetype = Some(value.to_owned()),
                _ => {}
            }
        }
        info
    }

    /// Request a target decode size.
    ///
    /// The codec decodes only the DCT coefficients needed for the smallest
    /// supported scale (1/8, 1/4, 1/2, 1/1) whose output covers the request;
    /// it never upscales. The size actually produced is reported by
    /// [`output_size`](Self::output_size).
    pub fn set_decode_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.ensure_configurable()?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter("decode size must be non-zero"));
        }
        self.decode_size = Some((width, height));
        Ok(())
    }

    /// Request an output color space for decoded pixels.
    pub fn set_decode_color_space(&mut self, color_space: ColorSpace) -> Result<()> {
        self.ensure_configurable()?;
        self.decode_color_space = Some(color_space);
        Ok(())
    }

    /// Set the encode quality. Values are clamped to 1..=100; default 75.
    pub fn set_quality(&mut self, quality: u8) {
        self.quality = quality.clamp(1, 100);
    }

    /// Set a comment to embed in the output, or clear it with `None`.
    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    /// When enabled, the output carries `Thumb::*` comments describing the
    /// source image.
    pub fn set_thumbnail_comments(&mut self, enabled: bool) {
        self.thumbnail_comments = enabled;
    }

    /// Crop the decoded image before encoding.
    ///
    /// Coordinates are in decoded (post-scale) space and are validated once
    /// the decoded size is known.
    pub fn set_crop(&mut self, crop: CropRect) -> Result<()> {
        if crop.width == 0 || crop.height == 0 {
            return Err(Error::InvalidParameter("crop must have a non-zero area"));
        }
        self.crop = Some(crop);
        Ok(())
    }

    /// Dimensions the decode step produced (decoding first if needed)
    pub fn output_size(&mut self) -> Result<(u32, u32)> {
        self.decode()?;
        let frame = self.frame()?;
        Ok((frame.width, frame.height))
    }

    /// Raw pixels of a region of the decoded image, in the configured color
    /// space, rows packed tightly.
    pub fn pixels(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>> {
        self.decode()?;
        let frame = self.frame()?;
        check_region(frame, x, y, width, height)?;
        Ok(copy_region(frame, x, y, width, height))
    }

    /// Decode (if not yet), crop, encode and write the result to a file.
    pub fn write_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let jpeg = self.encode()?;
        fs::write(path, jpeg)?;
        Ok(())
    }

    /// Decode (if not yet), crop, encode and return the result.
    pub fn write_memory(&mut self) -> Result<Vec<u8>> {
        self.encode()
    }

    fn ensure_configurable(&self) -> Result<()> {
        if self.frame.is_some() {
            return Err(Error::InvalidState("image already decoded"));
        }
        Ok(())
    }

    fn frame(&self) -> Result<&Frame> {
        self.frame
            .as_ref()
            .ok_or(Error::InvalidState("image not decoded"))
    }

    fn decode(&mut self) -> Result<()> {
        if self.frame.is_some() {
            return Ok(());
        }

        let mut decoder = Decoder::new(Cursor::new(&self.data));
        decoder.read_info()?;

        let (mut out_width, mut out_height) = (self.width, self.height);
        if let Some((req_w, req_h)) = self.decode_size {
            let (w, h) = decoder.scale(clamp_u16(req_w), clamp_u16(req_h))?;
            out_width = w as u32;
            out_height = h as u32;
            trace!(
                "scaled decode: requested {}x{}, codec chose {}x{}",
                req_w,
                req_h,
                w,
                h
            );
        }

        let pixels = decoder.decode()?;
        let format = decoder
            .info()
            .ok_or(Error::UnsupportedFormat("missing frame header"))?
            .pixel_format;
        let target = self.decode_color_space.unwrap_or(self.native);
        let pixels = convert::convert(&pixels, format, target)?;

        debug!("decoded {}x{} as {:?}", out_width, out_height, target);
        self.frame = Some(Frame {
            pixels,
            width: out_width,
            height: out_height,
            color_space: target,
        });
        Ok(())
    }

    fn encode(&mut self) -> Result<Vec<u8>> {
        self.decode()?;
        let frame = self.frame()?;

        let cropped;
        let (pixels, width, height): (&[u8], u32, u32) = match self.crop {
            Some(crop) => {
                check_region(frame, crop.x, crop.y, crop.width, crop.height)?;
                cropped = copy_region(frame, crop.x, crop.y, crop.width, crop.height);
                (&cropped, crop.width, crop.height)
            }
            None => (&frame.pixels, frame.width, frame.height),
        };

        let mut jpeg = Vec::new();
        let encoder = Encoder::new(&mut jpeg, self.quality);
        encoder.encode(
            pixels,
            clamp_u16(width),
            clamp_u16(height),
            encode_color_type(frame.color_space),
        )?;

        let mut comments = Vec::new();
        if let Some(comment) = &self.comment {
            comments.push(comment.clone());
        }
        if self.thumbnail_comments {
            if let Some(path) = &self.path {
                comments.push(format!("Thumb::URI\nfile://{}", path.display()));
                if let Some(mtime) = self.mtime {
                    comments.push(format!("Thumb::MTime\n{mtime}"));
                }
            }
            comments.push(format!("Thumb::Image::Width\n{}", self.width));
            comments.push(format!("Thumb::Image::Height\n{}", self.height));
            comments.push("Thumb::Mimetype\nimage/jpeg".to_owned());
        }
        let jpeg = markers::splice_comments(&jpeg, &comments)?;

        debug!(
            "encoded {}x{} at quality {} ({} bytes)",
            width,
            height,
            self.quality,
            jpeg.len()
        );
        Ok(jpeg)
    }
}

fn clamp_u16(v: u32) -> u16 {
    v.min(u16::MAX as u32) as u16
}

fn encode_color_type(color_space: ColorSpace) -> ColorType {
    match color_space {
        ColorSpace::Gray8 => ColorType::Luma,
        ColorSpace::Rgb8 => ColorType::Rgb,
        ColorSpace::Bgr8 => ColorType::Bgr,
        ColorSpace::Rgba8 => ColorType::Rgba,
        ColorSpace::Bgra8 => ColorType::Bgra,
        ColorSpace::Cmyk => ColorType::Cmyk,
    }
}

fn check_region(frame: &Frame, x: u32, y: u32, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidParameter("region must have a non-zero area"));
    }
    let right = x
        .checked_add(width)
        .ok_or(Error::InvalidParameter("region exceeds image bounds"))?;
    let bottom = y
        .checked_add(height)
        .ok_or(Error::InvalidParameter("region exceeds image bounds"))?;
    if right > frame.width || bottom > frame.height {
        return Err(Error::InvalidParameter("region exceeds image bounds"));
    }
    Ok(())
}

fn copy_region(frame: &Frame, x: u32, y: u32, width: u32, height: u32) -> Vec<u8> {
    let bpp = frame.color_space.bytes_per_pixel();
    let stride = frame.width as usize * bpp;
    let row_bytes = width as usize * bpp;

    let mut out = Vec::with_capacity(row_bytes * height as usize);
    for row in y..y + height {
        let start = row as usize * stride + x as usize * bpp;
        out.extend_from_slice(&frame.pixels[start..start + row_bytes]);
    }
    out
}
