//! thumbjpeg - fast JPEG thumbnail generation
//!
//! A small convenience library over the `jpeg-decoder`/`jpeg-encoder` codec
//! pair. Open a JPEG from a file or a memory buffer, request a target decode
//! size (the codec then decodes only the DCT coefficients needed for that
//! size), optionally crop, and re-encode at a configurable quality with
//! optional thumbnail metadata, emitting to a file or a memory buffer.
//!
//! ```no_run
//! use thumbjpeg::Thumbnailer;
//!
//! # fn main() -> thumbjpeg::Result<()> {
//! let mut thumb = Thumbnailer::open("photo.jpg")?;
//! thumb.set_decode_size(160, 120)?;
//! thumb.set_quality(80);
//! thumb.set_thumbnail_comments(true);
//! thumb.write_file("photo.thumb.jpg")?;
//! # Ok(())
//! # }
//! ```

mod convert;
mod markers;
mod thumb;
mod types;

pub use markers::MAX_COMMENT_LEN;
pub use thumb::Thumbnailer;
pub use types::{ColorSpace, CropRect, Error, Result, ThumbnailInfo};

/// Encode quality used when none is set
pub const DEFAULT_QUALITY: u8 = 75;
