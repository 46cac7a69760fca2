pub mod extent;
pub mod rectangle;

pub use extent::Extent;
pub use rectangle::Rectangle;

use std::ops::{Add, Mul, Sub};

use crate::utils::approx_eq;

/// A geographic position (longitude, latitude) or a real-valued 2D size.
///
/// Equality is tolerance based: two points are equal when both components
/// differ by less than [`GEO_EPSILON`](crate::utils::GEO_EPSILON).
///
/// # Example
///
/// ```rust
/// use geomosaic::Point2D;
///
/// let p = Point2D::new(-115.0, 36.0);
/// assert_eq!(p.lon(), -115.0);
///
/// let q: Point2D = (-115.0 + 1e-9, 36.0).into();
/// assert_eq!(p, q);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Point2D {
    /// X coordinate (longitude for geographic points)
    pub x: f64,
    /// Y coordinate (latitude for geographic points)
    pub y: f64,
}

impl Point2D {
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Semantic alias for `new()` when the coordinates are lon/lat degrees.
    #[inline]
    #[must_use]
    pub fn lonlat(lon: f64, lat: f64) -> Self {
        Self { x: lon, y: lat }
    }

    #[inline]
    #[must_use]
    pub fn lon(&self) -> f64 {
        self.x
    }

    #[inline]
    #[must_use]
    pub fn lat(&self) -> f64 {
        self.y
    }

    /// Component-wise product, used to scale a pixel count by a resolution.
    #[inline]
    #[must_use]
    pub fn scale(&self, factor: Point2D) -> Point2D {
        Point2D::new(self.x * factor.x, self.y * factor.y)
    }

    #[inline]
    #[must_use]
    pub fn to_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl PartialEq for Point2D {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.x, other.x) && approx_eq(self.y, other.y)
    }
}

impl Add for Point2D {
    type Output = Point2D;

    #[inline]
    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    #[inline]
    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    #[inline]
    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point2D {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point2D> for (f64, f64) {
    #[inline]
    fn from(p: Point2D) -> Self {
        (p.x, p.y)
    }
}

impl From<Point2I> for Point2D {
    #[inline]
    fn from(p: Point2I) -> Self {
        Self::new(p.x as f64, p.y as f64)
    }
}

/// Integer pixel coordinates. Row 0 is the southernmost raster row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point2I {
    pub x: i64,
    pub y: i64,
}

impl Point2I {
    #[inline]
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Array index `(row, column)` when the pixel lies inside a `width`×`height` grid.
    #[inline]
    #[must_use]
    pub fn index_in(&self, width: usize, height: usize) -> Option<(usize, usize)> {
        let x = usize::try_from(self.x).ok()?;
        let y = usize::try_from(self.y).ok()?;
        (x < width && y < height).then_some((y, x))
    }
}

impl Add for Point2I {
    type Output = Point2I;

    #[inline]
    fn add(self, rhs: Point2I) -> Point2I {
        Point2I::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2I {
    type Output = Point2I;

    #[inline]
    fn sub(self, rhs: Point2I) -> Point2I {
        Point2I::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i64, i64)> for Point2I {
    #[inline]
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}
