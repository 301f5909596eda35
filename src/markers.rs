//! Minimal JPEG segment walking: comment extraction and comment insertion
//!
//! Only the marker structure is interpreted here; entropy-coded data is left
//! to the codec. Comments live in COM segments whose payload is at most
//! [`MAX_COMMENT_LEN`] bytes.

use crate::types::{Error, Result};

/// JPEG marker codes
mod codes {
    pub const SOI: [u8; 2] = [0xFF, 0xD8]; // Start of Image
    pub const FILL: u8 = 0xFF; // Markers may be preceded by fill bytes
    pub const TEM: u8 = 0x01; // Temporary marker, no payload
    pub const COM: u8 = 0xFE; // Comment
    pub const SOS: u8 = 0xDA; // Start of Scan
    pub const EOI: u8 = 0xD9; // End of Image
    pub const APP0: u8 = 0xE0; // Application segments
    pub const APP15: u8 = 0xEF;
    pub const RST0: u8 = 0xD0; // Restart markers, no payload
    pub const RST7: u8 = 0xD7;
}

/// Largest COM payload a single segment can carry (65535 minus length bytes)
pub const MAX_COMMENT_LEN: usize = 65533;

/// Collect the payloads of all COM segments preceding the first scan.
///
/// Payloads are decoded lossily as UTF-8; binary comments survive as
/// replacement characters rather than failing the open.
pub fn comments(data: &[u8]) -> Result<Vec<String>> {
    if data.len() < 2 || data[0..2] != codes::SOI {
        return Err(Error::UnsupportedFormat("missing SOI marker"));
    }

    let mut out = Vec::new();
    let mut pos = 2usize;

    while pos + 2 <= data.len() {
        if data[pos] != codes::FILL {
            return Err(Error::UnsupportedFormat("corrupt marker stream"));
        }

        // Skip fill bytes preceding the marker code
        let mut marker = data[pos + 1];
        pos += 2;
        while marker == codes::FILL {
            if pos >= data.len() {
                return Err(Error::UnsupportedFormat("corrupt marker stream"));
            }
            marker = data[pos];
            pos += 1;
        }

        match marker {
            codes::SOS | codes::EOI => break,
            // Standalone markers carry no length field
            codes::TEM | codes::RST0..=codes::RST7 | 0xD8 => continue,
            _ => {
                if pos + 2 > data.len() {
                    return Err(Error::UnsupportedFormat("truncated segment"));
                }
                let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
                if length < 2 || pos + length > data.len() {
                    return Err(Error::UnsupportedFormat("truncated segment"));
                }
                if marker == codes::COM {
                    let payload = &data[pos + 2..pos + length];
                    out.push(String::from_utf8_lossy(payload).into_owned());
                }
                pos += length;
            }
        }
    }

    Ok(out)
}

/// Insert COM segments into a freshly encoded image.
///
/// Segments land after the leading run of APPn segments so the JFIF header
/// stays first, as decoders expect.
pub fn splice_comments(jpeg: &[u8], comments: &[String]) -> Result<Vec<u8>> {
    for comment in comments {
        if comment.len() > MAX_COMMENT_LEN {
            return Err(Error::InvalidParameter(
                "comment exceeds JPEG segment capacity",
            ));
        }
    }

    if comments.is_empty() {
        return Ok(jpeg.to_vec());
    }
    if jpeg.len() < 2 || jpeg[0..2] != codes::SOI {
        return Err(Error::UnsupportedFormat("missing SOI marker"));
    }

    // Insertion point: past SOI and any APPn segments
    let mut pos = 2usize;
    while pos + 4 <= jpeg.len()
        && jpeg[pos] == codes::FILL
        && (codes::APP0..=codes::APP15).contains(&jpeg[pos + 1])
    {
        let length = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > jpeg.len() {
            return Err(Error::UnsupportedFormat("truncated segment"));
        }
        pos += 2 + length;
    }

    let extra: usize = comments.iter().map(|c| c.len() + 4).sum();
    let mut out = Vec::with_capacity(jpeg.len() + extra);
    out.extend_from_slice(&jpeg[..pos]);
    for comment in comments {
        out.push(codes::FILL);
        out.push(codes::COM);
        out.extend_from_slice(&((comment.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(comment.as_bytes());
    }
    out.extend_from_slice(&jpeg[pos..]);
    Ok(out)
}
