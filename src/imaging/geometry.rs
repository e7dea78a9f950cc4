//! Geometry strings: the compact size language used in `[sizes]`.
//!
//! The grammar is ImageMagick's resize geometry:
//!
//! ```text
//! [W][xH][%][!|<|>|^|@][+X+Y]
//! ```
//!
//! | Form | Meaning |
//! |---|---|
//! | `800` | width 800, height follows the aspect ratio |
//! | `x600` | height 600, width follows the aspect ratio |
//! | `800x600` | fit within 800x600, aspect preserved |
//! | `800x600!` | exactly 800x600, aspect ignored |
//! | `>800x600` | like `800x600` but never enlarges |
//! | `<800x600` | like `800x600` but never shrinks |
//! | `800x600^` | cover 800x600 (minimum dimensions), aspect preserved |
//! | `50%` / `50x25%` | percentage of the original size |
//! | `10000@` | at most 10000 pixels in total, aspect preserved; never enlarges |
//!
//! Flags may be written before or after the numbers (`>800x600` and
//! `800x600>` are the same geometry). Offsets (`+10+20`) are accepted and
//! ignored, since they have no meaning for a resize.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("empty geometry")]
    Empty,
    #[error("unexpected character {found:?} in geometry {input:?}")]
    UnexpectedChar { input: String, found: char },
    #[error("invalid number {number:?} in geometry {input:?}")]
    InvalidNumber { input: String, number: String },
    #[error("geometry {0:?} has no width or height")]
    NoDimensions(String),
    #[error("geometry {0:?} has a zero dimension")]
    ZeroDimension(String),
}

/// Modifier flags attached to a geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryFlags {
    /// `!`: ignore the aspect ratio.
    pub exact: bool,
    /// `>`: only shrink.
    pub shrink_only: bool,
    /// `<`: only enlarge.
    pub enlarge_only: bool,
    /// `^`: treat the dimensions as minimums.
    pub fill: bool,
    /// `%`: values are percentages.
    pub percent: bool,
    /// `@`: the value is a pixel area.
    pub area: bool,
}

/// A parsed geometry string.
///
/// Keeps the original text so it serializes back exactly as written.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    raw: String,
    width: Option<f64>,
    height: Option<f64>,
    flags: GeometryFlags,
}

impl Geometry {
    pub fn width(&self) -> Option<f64> {
        self.width
    }

    pub fn height(&self) -> Option<f64> {
        self.height
    }

    pub fn flags(&self) -> GeometryFlags {
        self.flags
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Compute the output dimensions for a source image of `source` size.
    ///
    /// Results are always at least 1x1.
    pub fn apply(&self, source: (u32, u32)) -> (u32, u32) {
        let (src_w, src_h) = source;
        let (sw, sh) = (src_w as f64, src_h as f64);
        let flags = self.flags;

        let (mut w, mut h) = if flags.area {
            let area = match (self.width, self.height) {
                (Some(w), Some(h)) => w * h,
                (Some(v), None) | (None, Some(v)) => v,
                (None, None) => sw * sh,
            };
            // Only ever shrinks.
            if sw * sh > area {
                let scale = (area / (sw * sh)).sqrt();
                ((sw * scale).floor(), (sh * scale).floor())
            } else {
                (sw, sh)
            }
        } else if flags.percent {
            let px = self.width.or(self.height).unwrap_or(100.0) / 100.0;
            let py = self.height.or(self.width).unwrap_or(100.0) / 100.0;
            (round_half_up(sw * px), round_half_up(sh * py))
        } else {
            match (self.width, self.height) {
                (Some(w), Some(h)) if flags.exact => (w, h),
                (Some(w), Some(h)) => {
                    let (sx, sy) = (w / sw, h / sh);
                    let scale = if flags.fill { sx.max(sy) } else { sx.min(sy) };
                    (round_half_up(sw * scale), round_half_up(sh * scale))
                }
                (Some(w), None) if flags.exact => (w, sh),
                (Some(w), None) => (w, round_half_up(sh * (w / sw))),
                (None, Some(h)) if flags.exact => (sw, h),
                (None, Some(h)) => (round_half_up(sw * (h / sh)), h),
                (None, None) => (sw, sh),
            }
        };

        if flags.shrink_only {
            w = w.min(sw);
            h = h.min(sh);
        }
        if flags.enlarge_only {
            w = w.max(sw);
            h = h.max(sh);
        }

        (to_dimension(w), to_dimension(h))
    }
}

fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

fn to_dimension(v: f64) -> u32 {
    if v.is_finite() && v >= 1.0 {
        v.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

impl FromStr for Geometry {
    type Err = GeometryError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(GeometryError::Empty);
        }

        #[derive(PartialEq)]
        enum Part {
            Width,
            Height,
            Offset,
        }

        let mut flags = GeometryFlags::default();
        let mut part = Part::Width;
        let mut width = String::new();
        let mut height = String::new();
        let mut offsets = 0usize;

        for c in trimmed.chars() {
            match c {
                '!' => flags.exact = true,
                '>' => flags.shrink_only = true,
                '<' => flags.enlarge_only = true,
                '^' => flags.fill = true,
                '%' => flags.percent = true,
                '@' => flags.area = true,
                'x' | 'X' if part == Part::Width => part = Part::Height,
                '+' | '-' if offsets < 2 => {
                    part = Part::Offset;
                    offsets += 1;
                }
                '0'..='9' | '.' => match part {
                    Part::Width => width.push(c),
                    Part::Height => height.push(c),
                    Part::Offset => {}
                },
                other => {
                    return Err(GeometryError::UnexpectedChar {
                        input: input.to_string(),
                        found: other,
                    });
                }
            }
        }

        let parse = |number: &str| -> Result<Option<f64>, GeometryError> {
            if number.is_empty() {
                return Ok(None);
            }
            let value: f64 = number.parse().map_err(|_| GeometryError::InvalidNumber {
                input: input.to_string(),
                number: number.to_string(),
            })?;
            if value <= 0.0 {
                return Err(GeometryError::ZeroDimension(input.to_string()));
            }
            Ok(Some(value))
        };

        let width = parse(&width)?;
        let height = parse(&height)?;
        if width.is_none() && height.is_none() {
            return Err(GeometryError::NoDimensions(input.to_string()));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            width,
            height,
            flags,
        })
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
