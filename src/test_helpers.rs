//! Shared test utilities.
//!
//! Synthetic images are encoded in memory with the `image` crate so tests
//! never depend on fixture files, plus a store configuration rooted in a
//! temp directory.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let config = test_config(tmp.path());
//! let upload = Upload::new(gif_bytes(32, 32, 3));
//! ```

use crate::config::StoreConfig;
use crate::sizes::{SizeSpec, SizeTable};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

/// A gradient so resized output is not uniform.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Jpeg)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Png)
}

/// A looping GIF with `frames` solid-colour frames, each a different colour.
pub fn gif_bytes(width: u32, height: u32, frames: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        let frames = (0..frames).map(|i| {
            let shade = (i * 60 % 256) as u8;
            let image = RgbaImage::from_pixel(width, height, Rgba([shade, 255 - shade, 0, 255]));
            Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(100, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}

// =========================================================================
// Configuration
// =========================================================================

/// Config writing into `root` with two sizes: `foo = 100x100!` and
/// `bar = <50x50`.
pub fn test_config(root: &Path) -> StoreConfig {
    let sizes: SizeTable = [
        ("foo", SizeSpec::scale("100x100!".parse().unwrap())),
        ("bar", SizeSpec::scale("<50x50".parse().unwrap())),
    ]
    .into_iter()
    .collect();
    StoreConfig {
        save_path: root.to_path_buf(),
        read_path: "images/uploads".to_string(),
        sizes,
        ..StoreConfig::default()
    }
}
