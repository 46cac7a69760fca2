use super::Point2D;

/// An axis-aligned rectangle stored by its bottom-left and top-right corners.
///
/// The other two corners and the size are derived. Callers are responsible
/// for `bottom_left` lying below and left of `top_right`; [`is_valid`]
/// reports whether that holds.
///
/// [`is_valid`]: Rectangle::is_valid
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    bottom_left: Point2D,
    top_right: Point2D,
}

impl Rectangle {
    #[inline]
    #[must_use]
    pub fn new(bottom_left: Point2D, top_right: Point2D) -> Self {
        Self {
            bottom_left,
            top_right,
        }
    }

    /// Build from `(minx, miny, maxx, maxy)` bounds.
    #[inline]
    #[must_use]
    pub fn from_bounds(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self::new(Point2D::new(minx, miny), Point2D::new(maxx, maxy))
    }

    #[inline]
    #[must_use]
    pub fn bottom_left(&self) -> Point2D {
        self.bottom_left
    }

    #[inline]
    #[must_use]
    pub fn top_right(&self) -> Point2D {
        self.top_right
    }

    #[inline]
    #[must_use]
    pub fn top_left(&self) -> Point2D {
        Point2D::new(self.bottom_left.x, self.top_right.y)
    }

    #[inline]
    #[must_use]
    pub fn bottom_right(&self) -> Point2D {
        Point2D::new(self.top_right.x, self.bottom_left.y)
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Point2D {
        self.top_right - self.bottom_left
    }

    /// True when both dimensions are strictly positive.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.bottom_left.x < self.top_right.x && self.bottom_left.y < self.top_right.y
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[({}, {}), ({}, {})]",
            self.bottom_left.x, self.bottom_left.y, self.top_right.x, self.top_right.y
        )
    }
}
