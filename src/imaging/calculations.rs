//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Fill dimensions (at least one matches target)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// A rectangle to keep after a fill resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Calculate the crop rectangle anchored at the north-west (top-left) corner.
///
/// `filled` is the size after the fill resize; the rectangle never exceeds it.
pub fn calculate_north_west_crop(filled: (u32, u32), target: (u32, u32)) -> CropRect {
    CropRect {
        x: 0,
        y: 0,
        width: target.0.min(filled.0),
        height: target.1.min(filled.1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_fill_dimensions tests
    // =========================================================================

    #[test]
    fn fill_wider_source_to_portrait_target() {
        // 800x600 (4:3) → 400x500 target
        // Source is wider, so height matches: 500, width = 500 * (4/3) = 667
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 500)), (667, 500));
    }

    #[test]
    fn fill_taller_source_to_landscape_target() {
        // 600x800 (3:4) → 500x400 target
        // Source is taller, so width matches: 500, height = 500 * (4/3) = 667
        assert_eq!(calculate_fill_dimensions((600, 800), (500, 400)), (500, 667));
    }

    #[test]
    fn fill_same_aspect_ratio() {
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 300)), (400, 300));
    }

    #[test]
    fn fill_square_source_to_portrait() {
        // Source is wider (1:1 > 2:3), height matches: 300, width = 300
        assert_eq!(calculate_fill_dimensions((400, 400), (200, 300)), (300, 300));
    }

    #[test]
    fn fill_never_undershoots_target() {
        // Extreme aspect where rounding could lose a pixel
        let (w, h) = calculate_fill_dimensions((3, 1000), (100, 100));
        assert!(w >= 100 && h >= 100);
    }

    // =========================================================================
    // calculate_north_west_crop tests
    // =========================================================================

    #[test]
    fn crop_anchors_top_left() {
        let rect = calculate_north_west_crop((667, 500), (400, 500));
        assert_eq!(
            rect,
            CropRect {
                x: 0,
                y: 0,
                width: 400,
                height: 500
            }
        );
    }

    #[test]
    fn crop_clamps_to_filled_size() {
        let rect = calculate_north_west_crop((100, 80), (120, 80));
        assert_eq!((rect.width, rect.height), (100, 80));
    }
}
