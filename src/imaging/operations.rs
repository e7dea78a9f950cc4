//! High-level image operations.
//!
//! These functions combine geometry math with backend execution. They take a
//! size specification, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, FrameSet, ImageBackend};
use super::params::{ContentType, Quality, ResizeParams, WriteParams};
use crate::hashpath::variant_filename;
use crate::sizes::SizeSpec;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Plan a resize without executing it.
///
/// The geometry decides the output dimensions; for [`Crop`](crate::ResizePolicy::Crop)
/// those are the exact dimensions of the clipped result.
pub fn plan_resize(source: Dimensions, spec: &SizeSpec) -> ResizeParams {
    let (width, height) = spec.geometry.apply((source.width, source.height));
    ResizeParams {
        width,
        height,
        policy: spec.policy,
    }
}

/// Resize every frame of `original` for one size.
pub fn create_variant(
    backend: &impl ImageBackend,
    original: &FrameSet,
    spec: &SizeSpec,
) -> Result<FrameSet> {
    let params = plan_resize(original.dimensions(), spec);
    backend.resize(original, &params)
}

/// Encode and write one variant into `dir` as `{size_name}.jpg` or
/// `{size_name}.gif`, choosing the format from the frame count.
///
/// Returns the content type and the path written. If the backend fails,
/// whatever it left at that path is removed before the error is returned.
pub fn write_variant(
    backend: &impl ImageBackend,
    frames: &FrameSet,
    dir: &Path,
    size_name: &str,
    quality: Quality,
) -> Result<(ContentType, PathBuf)> {
    let content_type = ContentType::for_frame_count(frames.len());
    let params = WriteParams {
        output: dir.join(variant_filename(size_name, content_type.extension())),
        content_type,
        quality,
    };
    if let Err(e) = backend.write(frames, &params) {
        match fs::remove_file(&params.output) {
            Ok(()) => debug!(path = %params.output.display(), "removed partial variant"),
            Err(rm) if rm.kind() == ErrorKind::NotFound => {}
            Err(rm) => debug!(
                path = %params.output.display(),
                error = %rm,
                "could not remove partial variant"
            ),
        }
        return Err(e);
    }
    Ok((content_type, params.output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::sizes::ResizePolicy;

    fn spec(s: &str) -> SizeSpec {
        s.parse().unwrap()
    }

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn plan_scale_fits_within_bounds() {
        let params = plan_resize(dims(1600, 1200), &spec(">800x600"));
        assert_eq!((params.width, params.height), (800, 600));
        assert_eq!(params.policy, ResizePolicy::Scale);
    }

    #[test]
    fn plan_shrink_only_keeps_small_source() {
        let params = plan_resize(dims(300, 200), &spec(">800x600"));
        assert_eq!((params.width, params.height), (300, 200));
    }

    #[test]
    fn plan_crop_uses_geometry_dimensions() {
        let params = plan_resize(dims(1600, 1200), &spec("100x100!:crop"));
        assert_eq!((params.width, params.height), (100, 100));
        assert_eq!(params.policy, ResizePolicy::Crop);
    }

    #[test]
    fn create_variant_resizes_all_frames() {
        let backend = MockBackend::with_source(400, 400, 3);
        let original = backend.decode(b"gif").unwrap();

        let variant = create_variant(&backend, &original, &spec("50%")).unwrap();
        assert_eq!(variant.len(), 3);

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize {
                width: 200,
                height: 200,
                frames: 3,
                ..
            }
        ));
    }

    #[test]
    fn write_variant_picks_gif_for_animation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::with_source(10, 10, 2);
        let frames = backend.decode(b"gif").unwrap();

        let (ct, path) =
            write_variant(&backend, &frames, tmp.path(), "a", Quality::default()).unwrap();
        assert_eq!(ct, ContentType::Gif);
        assert_eq!(path, tmp.path().join("a.gif"));
        assert!(path.exists());
    }

    #[test]
    fn write_variant_picks_jpeg_for_still() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let frames = backend.decode(b"jpg").unwrap();

        let (ct, path) =
            write_variant(&backend, &frames, tmp.path(), "a", Quality::new(70)).unwrap();
        assert_eq!(ct, ContentType::Jpeg);
        assert_eq!(path, tmp.path().join("a.jpg"));
        assert!(matches!(
            &backend.get_operations()[1],
            RecordedOp::Write {
                content_type: ContentType::Jpeg,
                frames: 1,
                ..
            }
        ));
    }

    #[test]
    fn write_variant_removes_partial_output_on_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend {
            fail_write_after: Some(0),
            ..MockBackend::new()
        };
        let frames = backend.decode(b"jpg").unwrap();

        let result = write_variant(&backend, &frames, tmp.path(), "a", Quality::default());
        assert!(result.is_err());
        assert!(!tmp.path().join("a.jpg").exists());
    }
}
