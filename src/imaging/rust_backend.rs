//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::load_from_memory_with_format` |
//! | Decode (GIF, all frames) | `image::codecs::gif::GifDecoder` + `AnimationDecoder` |
//! | Scale | `DynamicImage::resize_exact` (Lanczos3 stills, Triangle animations) |
//! | Crop | fill resize + `DynamicImage::crop_imm` anchored top-left |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → GIF | `image::codecs::gif::GifEncoder`, looping forever |

use super::backend::{BackendError, Frame, FrameSet, ImageBackend};
use super::calculations::{calculate_fill_dimensions, calculate_north_west_crop};
use super::params::{ContentType, ResizeParams, WriteParams};
use crate::sizes::ResizePolicy;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, GenericImageView, ImageFormat};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};

/// GIF quantizer speed (1 = best quality, 30 = fastest).
const GIF_SPEED: i32 = 10;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failed(e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode image: {}", e))
}

/// Decode every frame of a GIF into full-canvas RGBA rasters.
fn decode_gif(bytes: &[u8]) -> Result<FrameSet, BackendError> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(decode_failed)?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(decode_failed)?
        .into_iter()
        .map(|frame| {
            let delay = frame.delay();
            Frame {
                image: DynamicImage::ImageRgba8(frame.into_buffer()),
                delay,
            }
        })
        .collect();
    FrameSet::new(frames)
}

fn resize_frame(
    image: &DynamicImage,
    params: &ResizeParams,
    filter: FilterType,
) -> DynamicImage {
    let target = (params.width, params.height);
    match params.policy {
        ResizePolicy::Scale => image.resize_exact(target.0, target.1, filter),
        ResizePolicy::Crop => {
            let (fill_w, fill_h) = calculate_fill_dimensions(image.dimensions(), target);
            let filled = image.resize_exact(fill_w, fill_h, filter);
            let rect = calculate_north_west_crop((fill_w, fill_h), target);
            filled.crop_imm(rect.x, rect.y, rect.width, rect.height)
        }
    }
}

fn write_jpeg(frames: &FrameSet, params: &WriteParams) -> Result<(), BackendError> {
    let mut writer = BufWriter::new(File::create(&params.output)?);
    let encoder = JpegEncoder::new_with_quality(&mut writer, params.quality.value() as u8);
    // JPEG has no alpha channel; only the first frame is kept.
    DynamicImage::ImageRgb8(frames.frames()[0].image.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    writer.flush()?;
    Ok(())
}

fn write_gif(frames: &FrameSet, params: &WriteParams) -> Result<(), BackendError> {
    let mut writer = BufWriter::new(File::create(&params.output)?);
    let encode_failed =
        |e: image::ImageError| BackendError::ProcessingFailed(format!("GIF encode failed: {}", e));
    {
        // The trailer is written when the encoder drops.
        let mut encoder = GifEncoder::new_with_speed(&mut writer, GIF_SPEED);
        encoder.set_repeat(Repeat::Infinite).map_err(encode_failed)?;
        encoder
            .encode_frames(
                frames
                    .frames()
                    .iter()
                    .map(|f| image::Frame::from_parts(f.image.to_rgba8(), 0, 0, f.delay)),
            )
            .map_err(encode_failed)?;
    }
    writer.flush()?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<FrameSet, BackendError> {
        let format = image::guess_format(bytes).map_err(decode_failed)?;
        if format == ImageFormat::Gif {
            return decode_gif(bytes);
        }
        let image = image::load_from_memory_with_format(bytes, format).map_err(decode_failed)?;
        Ok(FrameSet::single(image))
    }

    fn resize(&self, frames: &FrameSet, params: &ResizeParams) -> Result<FrameSet, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Invalid target size {}x{}",
                params.width, params.height
            )));
        }
        let filter = if frames.is_animated() {
            FilterType::Triangle
        } else {
            FilterType::Lanczos3
        };
        let resized = frames
            .frames()
            .iter()
            .map(|frame| Frame {
                image: resize_frame(&frame.image, params, filter),
                delay: frame.delay,
            })
            .collect();
        FrameSet::new(resized)
    }

    fn write(&self, frames: &FrameSet, params: &WriteParams) -> Result<(), BackendError> {
        match params.content_type {
            ContentType::Jpeg => write_jpeg(frames, params),
            ContentType::Gif => write_gif(frames, params),
        }
    }
}
