//! Placement of new floating windows.
//!
//! Fixed-size panels are tried at the four inset corners and the center, in
//! that order; the first spot clear of every existing floating rectangle
//! (with a small buffer) wins. When everything collides the allocator falls
//! back to a diagonal cascade, which may overlap but always terminates with
//! a visible offset.

use banter_common::Rect;

pub const FLOAT_WIDTH: f64 = 420.0;
pub const FLOAT_HEIGHT: f64 = 320.0;
pub const FLOAT_MARGIN: f64 = 16.0;
pub const OVERLAP_BUFFER: f64 = 8.0;
pub const CASCADE_STEP: f64 = 24.0;

/// Pick a rectangle for a new floating window. `count` is the number of
/// floating windows already on the workspace, used by the cascade fallback.
pub fn next_floating_rect(existing: &[Rect], bounds: Rect, count: usize) -> Rect {
    let candidates = [
        // Corners first, then the exact center.
        (bounds.x + FLOAT_MARGIN, bounds.y + FLOAT_MARGIN),
        (
            bounds.x + bounds.width - FLOAT_MARGIN - FLOAT_WIDTH,
            bounds.y + FLOAT_MARGIN,
        ),
        (
            bounds.x + FLOAT_MARGIN,
            bounds.y + bounds.height - FLOAT_MARGIN - FLOAT_HEIGHT,
        ),
        (
            bounds.x + bounds.width - FLOAT_MARGIN - FLOAT_WIDTH,
            bounds.y + bounds.height - FLOAT_MARGIN - FLOAT_HEIGHT,
        ),
        (
            bounds.x + (bounds.width - FLOAT_WIDTH) / 2.0,
            bounds.y + (bounds.height - FLOAT_HEIGHT) / 2.0,
        ),
    ];

    for (x, y) in candidates {
        let rect = Rect::new(x, y, FLOAT_WIDTH, FLOAT_HEIGHT);
        let padded = rect.inflate(OVERLAP_BUFFER);
        if !existing.iter().any(|other| padded.intersects(other)) {
            return rect;
        }
    }

    // Diagonal cascade. Overlap is acceptable here; the offset keeps each
    // new window visible.
    let offset = FLOAT_MARGIN + CASCADE_STEP * count as f64;
    Rect::new(
        bounds.x + offset,
        bounds.y + offset,
        FLOAT_WIDTH,
        FLOAT_HEIGHT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 1920.0, 1080.0)
    }

    #[test]
    fn empty_workspace_gets_top_left() {
        let rect = next_floating_rect(&[], bounds(), 0);
        assert_eq!(rect, Rect::new(16.0, 16.0, 420.0, 320.0));
    }

    #[test]
    fn occupied_top_left_falls_to_top_right() {
        let first = next_floating_rect(&[], bounds(), 0);
        let second = next_floating_rect(&[first], bounds(), 1);
        assert_eq!(second.x, 1920.0 - 16.0 - 420.0);
        assert_eq!(second.y, 16.0);
        assert!(!first.intersects(&second));
    }

    #[test]
    fn corners_fill_in_order_then_center() {
        let mut taken = Vec::new();
        for _ in 0..4 {
            let rect = next_floating_rect(&taken, bounds(), taken.len());
            taken.push(rect);
        }
        let center = next_floating_rect(&taken, bounds(), taken.len());
        assert_eq!(center.x, (1920.0 - 420.0) / 2.0);
        assert_eq!(center.y, (1080.0 - 320.0) / 2.0);
        for rect in &taken {
            assert!(!center.intersects(rect));
        }
    }

    #[test]
    fn buffer_rules_out_near_misses() {
        // Touching the top-left candidate's right edge within the 8-unit
        // buffer: the candidate must be skipped.
        let near = Rect::new(16.0 + 420.0 + 4.0, 16.0, 100.0, 100.0);
        let rect = next_floating_rect(&[near], bounds(), 1);
        assert_ne!((rect.x, rect.y), (16.0, 16.0));
    }

    #[test]
    fn cascade_when_everything_collides() {
        // One rectangle covering the whole workspace defeats all five
        // candidates.
        let blanket = Rect::new(-100.0, -100.0, 4000.0, 4000.0);
        let rect = next_floating_rect(&[blanket], bounds(), 3);
        assert_eq!(rect.x, 16.0 + 24.0 * 3.0);
        assert_eq!(rect.y, 16.0 + 24.0 * 3.0);
        assert_eq!(rect.width, FLOAT_WIDTH);
        assert_eq!(rect.height, FLOAT_HEIGHT);
    }

    #[test]
    fn cascade_offset_grows_with_count() {
        let blanket = Rect::new(-100.0, -100.0, 4000.0, 4000.0);
        let a = next_floating_rect(&[blanket], bounds(), 0);
        let b = next_floating_rect(&[blanket], bounds(), 1);
        assert_eq!(b.x - a.x, CASCADE_STEP);
        assert_eq!(b.y - a.y, CASCADE_STEP);
    }
}
