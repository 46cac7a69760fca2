//! Affine pixel ↔ geographic mapping.
//!
//! Rasters in this crate use a bottom-up pixel convention: row 0 is the
//! southernmost row and pixel `(0, 0)` is the south-west cell. Native
//! transforms from raster files usually count rows from the north edge with a
//! negative row-height coefficient; [`GeoTransform::from_native`] re-anchors
//! those once, at construction, and every mapping afterwards works purely in
//! the bottom-up frame.

use crate::error::{GeoError, Result};
use crate::geometry::{Point2D, Point2I};

/// Six-coefficient affine transform in GDAL order.
///
/// ```text
/// geo_x = c0 + px * c1 + py * c2
/// geo_y = c3 + px * c4 + py * c5
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    coeffs: [f64; 6],
}

impl AffineTransform {
    #[inline]
    #[must_use]
    pub fn new(coeffs: [f64; 6]) -> Self {
        Self { coeffs }
    }

    /// Axis-aligned transform with the given origin and per-pixel step.
    #[inline]
    #[must_use]
    pub fn from_origin(origin: Point2D, step: Point2D) -> Self {
        Self::new([origin.x, step.x, 0.0, origin.y, 0.0, step.y])
    }

    #[inline]
    #[must_use]
    pub fn coeffs(&self) -> [f64; 6] {
        self.coeffs
    }

    /// Geographic position of the pixel-space origin.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Point2D {
        Point2D::new(self.coeffs[0], self.coeffs[3])
    }

    /// Apply the transform to fractional pixel coordinates.
    #[inline]
    #[must_use]
    pub fn forward(&self, px: f64, py: f64) -> (f64, f64) {
        let c = &self.coeffs;
        (c[0] + px * c[1] + py * c[2], c[3] + px * c[4] + py * c[5])
    }

    /// Determinant of the 2x2 linear part.
    #[inline]
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let c = &self.coeffs;
        c[1] * c[5] - c[2] * c[4]
    }

    /// True when the transform has no rotation or shear terms.
    #[inline]
    #[must_use]
    pub fn is_axis_aligned(&self) -> bool {
        self.coeffs[2] == 0.0 && self.coeffs[4] == 0.0
    }

    /// Numerically invert the transform.
    pub fn inverse(&self) -> Result<AffineTransform> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON * f64::EPSILON || !det.is_finite() {
            return Err(GeoError::DegenerateTransform { determinant: det });
        }

        let [c0, c1, c2, c3, c4, c5] = self.coeffs;
        let inv_det = 1.0 / det;
        Ok(AffineTransform::new([
            (c2 * c3 - c0 * c5) * inv_det,
            c5 * inv_det,
            -c2 * inv_det,
            (c0 * c4 - c1 * c3) * inv_det,
            -c4 * inv_det,
            c1 * inv_det,
        ]))
    }

    /// Re-express the transform for a raster of `height` rows with row order reversed.
    ///
    /// Applying this twice returns the original transform.
    #[must_use]
    pub fn flip_rows(&self, height: usize) -> AffineTransform {
        let [c0, c1, c2, c3, c4, c5] = self.coeffs;
        let h = height as f64;
        AffineTransform::new([c0 + h * c2, c1, -c2, c3 + h * c5, c4, -c5])
    }
}

/// Where inside a pixel cell [`GeoTransform::pixel_to_geo`] lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelAnchor {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
    #[default]
    Center,
}

impl PixelAnchor {
    pub const ALL: [PixelAnchor; 5] = [
        PixelAnchor::BottomLeft,
        PixelAnchor::BottomRight,
        PixelAnchor::TopLeft,
        PixelAnchor::TopRight,
        PixelAnchor::Center,
    ];

    /// Offset within the cell as a fraction of the resolution.
    #[inline]
    #[must_use]
    pub fn fraction(self) -> (f64, f64) {
        match self {
            PixelAnchor::BottomLeft => (0.0, 0.0),
            PixelAnchor::BottomRight => (1.0, 0.0),
            PixelAnchor::TopLeft => (0.0, 1.0),
            PixelAnchor::TopRight => (1.0, 1.0),
            PixelAnchor::Center => (0.5, 0.5),
        }
    }
}

/// Bottom-up raster transform with its precomputed inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    forward: AffineTransform,
    inverse: AffineTransform,
    resolution: Point2D,
    north_up: bool,
}

impl GeoTransform {
    /// Build from a native file transform for a raster of `height` rows.
    ///
    /// A negative row coefficient marks a north-up raster whose stored rows
    /// run north to south; its origin is moved to the south edge and the row
    /// coefficient negated. The caller must reverse the pixel rows to match.
    pub fn from_native(native: [f64; 6], height: usize) -> Result<Self> {
        let native = AffineTransform::new(native);
        let north_up = native.coeffs[5] < 0.0;
        let forward = if north_up {
            native.flip_rows(height)
        } else {
            native
        };
        Self::new(forward, north_up)
    }

    /// Build from a transform that already counts rows from the south edge.
    pub fn bottom_up(forward: AffineTransform) -> Result<Self> {
        Self::new(forward, false)
    }

    /// Build from a bottom-up `forward` transform, recording whether the
    /// source stored its rows north to south so [`to_native`] can restore them.
    ///
    /// [`to_native`]: GeoTransform::to_native
    pub fn new(forward: AffineTransform, north_up: bool) -> Result<Self> {
        let inverse = forward.inverse()?;
        let c = forward.coeffs;
        Ok(Self {
            forward,
            inverse,
            resolution: Point2D::new(c[1], c[5].abs()),
            north_up,
        })
    }

    /// Geographic position of pixel `pixel` at `anchor`.
    #[must_use]
    pub fn pixel_to_geo(&self, pixel: Point2I, anchor: PixelAnchor) -> Point2D {
        let (gx, gy) = self.forward.forward(pixel.x as f64, pixel.y as f64);
        let (fx, fy) = anchor.fraction();
        Point2D::new(
            gx + fx * self.resolution.x,
            gy + fy * self.resolution.y,
        )
    }

    /// Pixel containing `geo`, in bottom-up coordinates.
    ///
    /// The bottom-up inverse is floored directly, so a position on a
    /// horizontal pixel edge belongs to the pixel above it, matching the
    /// half-open [`Extent::contains`](crate::Extent::contains).
    ///
    /// The result is not bounds-checked; positions outside the raster map to
    /// negative or too-large indices. `None` when the fractional position is
    /// NaN, infinite or beyond the `i64` range.
    #[must_use]
    pub fn geo_to_pixel(&self, geo: Point2D) -> Option<Point2I> {
        let (px, py) = self.inverse.forward(geo.x, geo.y);
        Some(Point2I::new(floor_to_i64(px)?, floor_to_i64(py)?))
    }

    #[inline]
    #[must_use]
    pub fn forward(&self) -> &AffineTransform {
        &self.forward
    }

    #[inline]
    #[must_use]
    pub fn inverse(&self) -> &AffineTransform {
        &self.inverse
    }

    /// South-west corner of pixel `(0, 0)`.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Point2D {
        self.forward.origin()
    }

    #[inline]
    #[must_use]
    pub fn resolution(&self) -> Point2D {
        self.resolution
    }

    /// Whether the source raster stored its rows north to south.
    #[inline]
    #[must_use]
    pub fn north_up(&self) -> bool {
        self.north_up
    }

    /// Transform in the source's native row order for a raster of `height` rows.
    #[must_use]
    pub fn to_native(&self, height: usize) -> [f64; 6] {
        if self.north_up {
            self.forward.flip_rows(height).coeffs
        } else {
            self.forward.coeffs
        }
    }
}

fn floor_to_i64(value: f64) -> Option<i64> {
    let floored = value.floor();
    (floored.is_finite() && floored >= i64::MIN as f64 && floored < i64::MAX as f64)
        .then_some(floored as i64)
}
