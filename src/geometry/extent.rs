use super::{Point2D, Rectangle};
use crate::utils::great_circle_distance;

/// A geographic rectangle in lon/lat degrees.
///
/// Wraps a [`Rectangle`] and adds containment testing and ground size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    rect: Rectangle,
}

impl Extent {
    #[inline]
    #[must_use]
    pub fn new(bottom_left: Point2D, top_right: Point2D) -> Self {
        Self {
            rect: Rectangle::new(bottom_left, top_right),
        }
    }

    /// Build from `(minx, miny, maxx, maxy)` bounds.
    #[inline]
    #[must_use]
    pub fn from_bounds(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            rect: Rectangle::from_bounds(minx, miny, maxx, maxy),
        }
    }

    #[inline]
    #[must_use]
    pub fn rectangle(&self) -> &Rectangle {
        &self.rect
    }

    #[inline]
    #[must_use]
    pub fn bottom_left(&self) -> Point2D {
        self.rect.bottom_left()
    }

    #[inline]
    #[must_use]
    pub fn top_right(&self) -> Point2D {
        self.rect.top_right()
    }

    #[inline]
    #[must_use]
    pub fn top_left(&self) -> Point2D {
        self.rect.top_left()
    }

    #[inline]
    #[must_use]
    pub fn bottom_right(&self) -> Point2D {
        self.rect.bottom_right()
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Point2D {
        self.rect.size()
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.rect.is_valid()
    }

    /// Half-open containment: the bottom and left edges belong to the extent,
    /// the top and right edges do not.
    #[must_use]
    pub fn contains(&self, p: Point2D) -> bool {
        let bl = self.bottom_left();
        let tr = self.top_right();
        p.x >= bl.x && p.y >= bl.y && p.x < tr.x && p.y < tr.y
    }

    /// Width along the top edge and height along the left edge, in meters.
    ///
    /// Each axis is measured independently on the sphere, so this is not the
    /// size of a planar rectangle.
    #[must_use]
    pub fn size_in_meters(&self) -> Point2D {
        let tl = self.top_left();
        let tr = self.top_right();
        let bl = self.bottom_left();
        Point2D::new(
            great_circle_distance(tl.x, tl.y, tr.x, tr.y),
            great_circle_distance(tl.x, tl.y, bl.x, bl.y),
        )
    }
}

impl From<Rectangle> for Extent {
    fn from(rect: Rectangle) -> Self {
        Self { rect }
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.rect, f)
    }
}
