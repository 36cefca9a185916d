//! Geometry helpers shared by the overlay: client rectangles, the viewport,
//! and the overlap test used to build hint stacks.

/// A point in viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the visible viewport in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether `rect` lies entirely within `[0, width] x [0, height]`.
    /// Touching an edge counts as inside.
    #[inline]
    pub fn contains(&self, rect: &Rect) -> bool {
        rect.left >= 0.0 && rect.top >= 0.0 && rect.right <= self.width && rect.bottom <= self.height
    }
}

/// A bounding client rectangle, edges in viewport coordinates.
///
/// Stored by edges rather than origin and size because every consumer
/// (viewport fitting, overlap tests) compares edges.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Build a rectangle from its origin and size.
    #[inline]
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Shift the rectangle by `(delta_x, delta_y)`.
    #[inline]
    #[must_use]
    pub fn translated(self, delta_x: f64, delta_y: f64) -> Self {
        Self {
            left: self.left + delta_x,
            top: self.top + delta_y,
            right: self.right + delta_x,
            bottom: self.bottom + delta_y,
        }
    }
}

/// Axis-aligned overlap test. Rectangles that merely touch overlap.
#[inline]
pub fn overlaps(rect_a: &Rect, rect_b: &Rect) -> bool {
    rect_a.right >= rect_b.left
        && rect_a.left <= rect_b.right
        && rect_a.bottom >= rect_b.top
        && rect_a.top <= rect_b.bottom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_overlap() {
        let left = Rect::from_origin_size(0.0, 0.0, 10.0, 10.0);
        let right = Rect::from_origin_size(10.0, 0.0, 10.0, 10.0);
        assert!(overlaps(&left, &right));
        assert!(overlaps(&right, &left));
    }

    #[test]
    fn disjoint_on_one_axis_does_not_overlap() {
        let upper = Rect::from_origin_size(0.0, 0.0, 10.0, 10.0);
        let lower = Rect::from_origin_size(5.0, 10.5, 10.0, 10.0);
        assert!(!overlaps(&upper, &lower));
    }

    #[test]
    fn viewport_containment_is_inclusive() {
        let viewport = Viewport::new(100.0, 50.0);
        assert!(viewport.contains(&Rect::from_origin_size(0.0, 0.0, 100.0, 50.0)));
        assert!(!viewport.contains(&Rect::from_origin_size(-0.5, 0.0, 10.0, 10.0)));
        assert!(!viewport.contains(&Rect::from_origin_size(95.0, 45.0, 10.0, 10.0)));
    }
}
