//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: decode, resize and write.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the `MockBackend` in this module, which records operations
//! and can be told to fail at a given stage.

use super::params::{ResizeParams, WriteParams};
use image::{Delay, DynamicImage, GenericImageView};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// One decoded raster and how long it is shown.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: DynamicImage,
    pub delay: Delay,
}

impl Frame {
    /// A frame of a still image.
    pub fn still(image: DynamicImage) -> Self {
        Self {
            image,
            delay: Delay::from_numer_denom_ms(0, 1),
        }
    }
}

/// A non-empty sequence of frames of the same size.
///
/// Decoded rasters are many times larger than the encoded upload. A
/// `FrameSet` is an owned value; the pixel buffers are released when it goes
/// out of scope.
#[derive(Debug, Clone)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    pub fn new(frames: Vec<Frame>) -> Result<Self, BackendError> {
        if frames.is_empty() {
            return Err(BackendError::ProcessingFailed(
                "image contains no frames".into(),
            ));
        }
        Ok(Self { frames })
    }

    pub fn single(image: DynamicImage) -> Self {
        Self {
            frames: vec![Frame::still(image)],
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Dimensions of the first frame (all frames share the canvas size).
    pub fn dimensions(&self) -> Dimensions {
        let (width, height) = self.frames[0].image.dimensions();
        Dimensions { width, height }
    }
}

/// Trait for image processing backends.
///
/// Every backend must implement all three operations so the store is
/// backend-agnostic. `Sync` because sizes are resized on the rayon pool.
pub trait ImageBackend: Sync {
    /// Decode an upload into one or more frames.
    fn decode(&self, bytes: &[u8]) -> Result<FrameSet, BackendError>;

    /// Resize every frame of `frames`.
    fn resize(&self, frames: &FrameSet, params: &ResizeParams) -> Result<FrameSet, BackendError>;

    /// Encode `frames` and write them to `params.output`.
    fn write(&self, frames: &FrameSet, params: &WriteParams) -> Result<(), BackendError>;
}
