//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which plans each variant) and the [`backend`](super::backend) (which does
//! the pixel work). The separation allows swapping backends (e.g. for testing
//! with a mock) without changing the planning logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 85). Clamped on construction.
//! - [`ContentType`]: The two output encodings: static JPEG or animated GIF.
//! - [`ResizeParams`]: Target dimensions and the policy used to reach them.
//! - [`WriteParams`]: Output path, encoding and quality for one variant.

use crate::sizes::ResizePolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Output encoding of a stored image.
///
/// Everything is stored as JPEG unless it has more than one frame, in which
/// case it is stored as an animated GIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/gif")]
    Gif,
}

impl ContentType {
    pub fn for_frame_count(frames: usize) -> Self {
        if frames > 1 { Self::Gif } else { Self::Jpeg }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }

    /// Every extension a variant can be stored under.
    pub const EXTENSIONS: [&'static str; 2] = ["jpg", "gif"];

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Parameters for resizing one frame set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    /// Final width of every frame.
    pub width: u32,
    /// Final height of every frame.
    pub height: u32,
    pub policy: ResizePolicy,
}

/// Parameters for encoding and writing one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteParams {
    pub output: PathBuf,
    pub content_type: ContentType,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn content_type_from_frame_count() {
        assert_eq!(ContentType::for_frame_count(1), ContentType::Jpeg);
        assert_eq!(ContentType::for_frame_count(2), ContentType::Gif);
    }

    #[test]
    fn content_type_mime_roundtrip() {
        for ct in [ContentType::Jpeg, ContentType::Gif] {
            assert_eq!(ContentType::from_mime(ct.mime()), Some(ct));
        }
        assert_eq!(ContentType::from_mime("image/png"), None);
        assert_eq!(ContentType::Gif.extension(), "gif");
        assert_eq!(ContentType::Jpeg.extension(), "jpg");
    }
}
