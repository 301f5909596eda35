//! End-to-end tests for the full open-to-emit pipeline, against JPEGs
//! synthesized with the codec itself.

use jpeg_encoder::{ColorType, Encoder};
use thumbjpeg::{ColorSpace, CropRect, Thumbnailer};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encode a width x height RGB gradient as a baseline JPEG.
fn gradient_jpeg(width: u16, height: u16, quality: u8) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width) as u8);
            pixels.push((y * 255 / height) as u8);
            pixels.push(128);
        }
    }
    let mut jpeg = Vec::new();
    let encoder = Encoder::new(&mut jpeg, quality);
    encoder
        .encode(&pixels, width, height, ColorType::Rgb)
        .expect("encode gradient");
    jpeg
}

/// Encode an RGB gradient as a progressive JPEG.
fn progressive_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width) as u8);
            pixels.push((y * 255 / height) as u8);
            pixels.push(128);
        }
    }
    let mut jpeg = Vec::new();
    let mut encoder = Encoder::new(&mut jpeg, 90);
    encoder.set_progressive(true);
    encoder
        .encode(&pixels, width, height, ColorType::Rgb)
        .expect("encode progressive gradient");
    jpeg
}

/// Encode a grayscale ramp as a baseline JPEG.
fn gray_jpeg(width: u16, height: u16) -> Vec<u8> {
    let pixels: Vec<u8> = (0..width as usize * height as usize)
        .map(|i| (i % 256) as u8)
        .collect();
    let mut jpeg = Vec::new();
    let encoder = Encoder::new(&mut jpeg, 90);
    encoder
        .encode(&pixels, width, height, ColorType::Luma)
        .expect("encode ramp");
    jpeg
}

#[test]
fn open_from_memory_reports_metadata() {
    init_logger();
    let image = Thumbnailer::from_memory(gradient_jpeg(64, 48, 90)).unwrap();
    assert_eq!(image.size(), (64, 48));
    assert_eq!(image.width(), 64);
    assert_eq!(image.height(), 48);
    assert_eq!(image.color_space(), ColorSpace::Rgb8);
}

#[test]
fn scaled_decode_hits_the_requested_eighth() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(64, 64, 90)).unwrap();
    image.set_decode_size(8, 8).unwrap();
    assert_eq!(image.output_size().unwrap(), (8, 8));

    let thumb = image.write_memory().unwrap();
    let reopened = Thumbnailer::from_memory(thumb).unwrap();
    assert_eq!(reopened.size(), (8, 8));
}

#[test]
fn scaled_decode_picks_covering_quarter() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(64, 64, 90)).unwrap();
    // 9x9 is not reachable with a power-of-two scale; the codec picks the
    // smallest output covering the request.
    image.set_decode_size(9, 9).unwrap();
    assert_eq!(image.output_size().unwrap(), (16, 16));
}

#[test]
fn decode_never_upscales() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(32, 32, 90)).unwrap();
    image.set_decode_size(512, 512).unwrap();
    assert_eq!(image.output_size().unwrap(), (32, 32));
}

#[test]
fn crop_bounds_the_output() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(64, 64, 90)).unwrap();
    image.set_crop(CropRect::new(8, 8, 16, 16)).unwrap();

    let thumb = image.write_memory().unwrap();
    let reopened = Thumbnailer::from_memory(thumb).unwrap();
    assert_eq!(reopened.size(), (16, 16));
}

#[test]
fn crop_outside_decoded_image_fails_at_encode() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(64, 64, 90)).unwrap();
    image.set_decode_size(8, 8).unwrap();
    // Valid against the source, not against the scaled output
    image.set_crop(CropRect::new(32, 32, 16, 16)).unwrap();
    assert!(image.write_memory().is_err());
}

#[test]
fn comment_survives_the_round_trip() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(32, 32, 90)).unwrap();
    image.set_comment(Some("shot on a potato".to_owned()));

    let thumb = image.write_memory().unwrap();
    let reopened = Thumbnailer::from_memory(thumb).unwrap();
    assert_eq!(reopened.comment(), Some("shot on a potato"));
}

#[test]
fn thumbnail_comments_describe_the_source() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(64, 48, 90)).unwrap();
    image.set_decode_size(16, 12).unwrap();
    image.set_thumbnail_comments(true);

    let thumb = image.write_memory().unwrap();
    let info = Thumbnailer::from_memory(thumb).unwrap().thumbnail_info();
    assert_eq!(info.width, Some(64));
    assert_eq!(info.height, Some(48));
    assert_eq!(info.mimetype.as_deref(), Some("image/jpeg"));
    // Memory sources carry no URI or mtime
    assert!(info.uri.is_none());
    assert!(info.mtime.is_none());
}

#[test]
fn thumbnail_comments_are_not_copied_from_the_source() {
    init_logger();
    let mut first = Thumbnailer::from_memory(gradient_jpeg(64, 64, 90)).unwrap();
    first.set_thumbnail_comments(true);
    let thumb = first.write_memory().unwrap();

    // Re-thumbnail the thumbnail without metadata enabled
    let mut second = Thumbnailer::from_memory(thumb).unwrap();
    assert_eq!(second.thumbnail_info().width, Some(64));
    let plain = second.write_memory().unwrap();
    let info = Thumbnailer::from_memory(plain).unwrap().thumbnail_info();
    assert!(info.width.is_none());
    assert!(info.mimetype.is_none());
}

#[test]
fn file_round_trip_with_thumbnail_uri() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("source.jpg");
    let dst = dir.path().join("thumb.jpg");
    std::fs::write(&src, gradient_jpeg(64, 64, 90)).unwrap();

    let mut image = Thumbnailer::open(&src).unwrap();
    image.set_decode_size(8, 8).unwrap();
    image.set_quality(60);
    image.set_thumbnail_comments(true);
    image.write_file(&dst).unwrap();

    let written = std::fs::read(&dst).unwrap();
    assert_eq!(&written[0..2], &[0xFF, 0xD8]);

    let reopened = Thumbnailer::open(&dst).unwrap();
    assert_eq!(reopened.size(), (8, 8));
    let info = reopened.thumbnail_info();
    assert_eq!(info.width, Some(64));
    assert!(info.uri.as_deref().unwrap_or("").starts_with("file://"));
    assert!(info.mtime.is_some());
}

#[test]
fn missing_file_fails_at_open() {
    init_logger();
    assert!(Thumbnailer::open("/nonexistent/input.jpg").is_err());
}

#[test]
fn truncated_source_fails_at_open() {
    init_logger();
    let mut data = gradient_jpeg(64, 64, 90);
    data.truncate(8);
    assert!(Thumbnailer::from_memory(data).is_err());
}

#[test]
fn pixels_returns_requested_region_in_requested_space() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(32, 32, 90)).unwrap();
    image.set_decode_color_space(ColorSpace::Gray8).unwrap();

    let region = image.pixels(4, 4, 8, 8).unwrap();
    assert_eq!(region.len(), 8 * 8);

    let full = image.pixels(0, 0, 32, 32).unwrap();
    assert_eq!(full.len(), 32 * 32);
}

#[test]
fn progressive_source_reencodes_as_baseline() {
    init_logger();
    let mut image = Thumbnailer::from_memory(progressive_jpeg(64, 64)).unwrap();
    assert_eq!(image.size(), (64, 64));
    image.set_decode_size(8, 8).unwrap();

    let thumb = image.write_memory().unwrap();
    let reopened = Thumbnailer::from_memory(thumb.clone()).unwrap();
    assert_eq!(reopened.size(), (8, 8));

    // The emitted image is sequential regardless of the source's coding
    let mut decoder = jpeg_decoder::Decoder::new(std::io::Cursor::new(&thumb));
    decoder.read_info().unwrap();
    let info = decoder.info().unwrap();
    assert_eq!(info.coding_process, jpeg_decoder::CodingProcess::DctSequential);
}

#[test]
fn grayscale_source_decodes_and_reencodes() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gray_jpeg(64, 64)).unwrap();
    assert_eq!(image.color_space(), ColorSpace::Gray8);
    image.set_decode_size(16, 16).unwrap();

    let thumb = image.write_memory().unwrap();
    let reopened = Thumbnailer::from_memory(thumb).unwrap();
    assert_eq!(reopened.size(), (16, 16));
    assert_eq!(reopened.color_space(), ColorSpace::Gray8);
}

#[test]
fn grayscale_request_on_color_source() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(32, 32, 90)).unwrap();
    image.set_decode_color_space(ColorSpace::Gray8).unwrap();

    let thumb = image.write_memory().unwrap();
    let reopened = Thumbnailer::from_memory(thumb).unwrap();
    assert_eq!(reopened.color_space(), ColorSpace::Gray8);
}

#[test]
fn quality_changes_output_size() {
    init_logger();
    let source = gradient_jpeg(64, 64, 95);

    let mut high = Thumbnailer::from_memory(source.clone()).unwrap();
    high.set_quality(95);
    let high_bytes = high.write_memory().unwrap();

    let mut low = Thumbnailer::from_memory(source).unwrap();
    low.set_quality(10);
    let low_bytes = low.write_memory().unwrap();

    assert!(low_bytes.len() < high_bytes.len());
}

#[test]
fn repeated_emission_is_stable() {
    init_logger();
    let mut image = Thumbnailer::from_memory(gradient_jpeg(64, 64, 90)).unwrap();
    image.set_decode_size(8, 8).unwrap();
    let first = image.write_memory().unwrap();
    let second = image.write_memory().unwrap();
    assert_eq!(first, second);
}
