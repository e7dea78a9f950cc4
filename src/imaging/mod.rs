//! Image processing in pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` decoders; GIFs keep every frame |
//! | **Scale** | `resize_exact` to the dimensions a [`Geometry`] computes |
//! | **Crop** | fill resize, then clip from the top-left corner |
//! | **Encode** | JPEG for stills, looping GIF for animations |
//!
//! The module is split into:
//! - **Geometry**: The size grammar (`>800x600`, `100x100!`, `50%`, ...)
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod geometry;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, Frame, FrameSet, ImageBackend};
pub use geometry::{Geometry, GeometryError, GeometryFlags};
pub use operations::{create_variant, plan_resize, write_variant};
pub use params::{ContentType, Quality, ResizeParams, WriteParams};
pub use rust_backend::RustBackend;
