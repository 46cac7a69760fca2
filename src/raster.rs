//! Geo-referenced single-band height field.
//!
//! A [`Raster`] owns its pixels as an `ndarray::Array2<f32>` of shape
//! `(rows, columns)`, indexed `[[y, x]]`, with row 0 the southernmost row.
//! Rasters come from one decoded source ([`Raster::from_decoded`]), from a
//! grid of tiles ([`Raster::mosaic`]) or from a crop of another raster
//! ([`Raster::sub_region`]); in each case the bottom-up convention is
//! established once by the constructor.

use std::path::Path;

use ndarray::{Array2, Axis, s};
use tracing::{debug, info, warn};

use crate::affine::{AffineTransform, GeoTransform, PixelAnchor};
use crate::error::{GeoError, Result};
use crate::geometry::{Extent, Point2D, Point2I};
use crate::mesh::{Mesh, Tessellator};
use crate::source::{DecodedRaster, RasterSink, RasterSource};
use crate::tile_list::TileList;
use crate::utils::{approx_eq, remap};

/// Extreme values of a raster and where they were first found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min: f32,
    pub max: f32,
    pub min_pixel: Point2I,
    pub max_pixel: Point2I,
}

impl MinMax {
    #[must_use]
    pub fn range(&self) -> f32 {
        self.max - self.min
    }

    /// Mesh units per meter once heights are normalized to `[0, 1]`.
    #[must_use]
    pub fn meters_per_unit(&self) -> f64 {
        1.0 / f64::from(self.range())
    }
}

#[derive(Debug, Clone)]
pub struct Raster {
    transform: GeoTransform,
    extent: Extent,
    pixels: Array2<f32>,
}

impl Raster {
    /// Build from a decoded buffer in the source's native row order.
    pub fn from_decoded(decoded: DecodedRaster) -> Result<Self> {
        let DecodedRaster {
            pixels,
            width,
            height,
            affine,
        } = decoded;

        if width == 0 || height == 0 {
            return Err(GeoError::InvalidBuffer(format!(
                "raster has zero dimensions ({width}x{height})"
            )));
        }
        if pixels.len() != width * height {
            return Err(GeoError::InvalidBuffer(format!(
                "buffer holds {} samples, expected {width}x{height} = {}",
                pixels.len(),
                width * height
            )));
        }

        let transform = GeoTransform::from_native(affine, height)?;
        let mut grid = Array2::from_shape_vec((height, width), pixels)
            .map_err(|e| GeoError::InvalidBuffer(e.to_string()))?;
        if transform.north_up() {
            grid = flip_rows(&grid);
        }

        Ok(Self::from_parts(transform, grid))
    }

    /// Open and decode a single raster through `source`.
    pub fn open(source: &dyn RasterSource, path: &Path) -> Result<Self> {
        let decoded = source.open(path)?;
        let raster = Self::from_decoded(decoded)?;
        info!(
            path = %path.display(),
            width = raster.width(),
            height = raster.height(),
            extent = %raster.extent,
            "Opened raster"
        );
        Ok(raster)
    }

    /// Open every tile of `tiles` through `source` and stitch them together.
    pub fn mosaic(source: &dyn RasterSource, tiles: &TileList) -> Result<Self> {
        let decoded = tiles
            .paths()
            .iter()
            .map(|path| {
                debug!(path = %path.display(), "Opening tile");
                source.open(path)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::mosaic_decoded(decoded, tiles.columns(), tiles.rows())
    }

    /// Stitch decoded tiles, listed row-major, into one raster.
    ///
    /// Tiles are placed by their geographic position, not by list order; the
    /// list order only determines which widths and heights make up the grid.
    /// All tiles of a grid column must share a width, all tiles of a grid row
    /// a height, and all tiles the anchor tile's resolution.
    pub fn mosaic_decoded(tiles: Vec<DecodedRaster>, columns: usize, rows: usize) -> Result<Self> {
        if columns == 0 || rows == 0 || tiles.len() != columns * rows {
            return Err(GeoError::InvalidTileGrid {
                tiles: tiles.len(),
                columns,
                rows,
            });
        }

        let tiles = tiles
            .into_iter()
            .map(Raster::from_decoded)
            .collect::<Result<Vec<_>>>()?;

        let anchor = top_left_tile(&tiles);
        let anchor_tile = &tiles[anchor];

        let column_widths: Vec<usize> = (0..columns).map(|c| tiles[c].width()).collect();
        let row_heights: Vec<usize> = (0..rows).map(|r| tiles[r * columns].height()).collect();
        for (index, tile) in tiles.iter().enumerate() {
            let (row, column) = (index / columns, index % columns);
            if tile.width() != column_widths[column] || tile.height() != row_heights[row] {
                return Err(GeoError::TileMismatch {
                    index,
                    reason: format!(
                        "size {}x{} differs from grid cell {}x{}",
                        tile.width(),
                        tile.height(),
                        column_widths[column],
                        row_heights[row]
                    ),
                });
            }
            if tile.resolution() != anchor_tile.resolution() {
                return Err(GeoError::TileMismatch {
                    index,
                    reason: format!(
                        "resolution ({}, {}) differs from ({}, {})",
                        tile.resolution().x,
                        tile.resolution().y,
                        anchor_tile.resolution().x,
                        anchor_tile.resolution().y
                    ),
                });
            }
        }

        let width: usize = column_widths.iter().sum();
        let height: usize = row_heights.iter().sum();

        // Shift the anchor's bottom-up origin down so the mosaic's top row
        // lines up with the anchor's top row.
        let mut coeffs = anchor_tile.transform.forward().coeffs();
        let rows_below = anchor_tile.height() as f64 - height as f64;
        let (ox, oy) = anchor_tile.transform.forward().forward(0.0, rows_below);
        coeffs[0] = ox;
        coeffs[3] = oy;
        let transform = GeoTransform::new(AffineTransform::new(coeffs), anchor_tile.north_up())?;

        let mut pixels = Array2::<f32>::zeros((height, width));
        let mut covered = Array2::<bool>::from_elem((height, width), false);
        for (index, tile) in tiles.iter().enumerate() {
            let first_center = tile.pixel_to_geo(Point2I::new(0, 0), PixelAnchor::Center);
            let offset = locate(&transform, first_center)?;
            let far = offset + Point2I::new(tile.width() as i64 - 1, tile.height() as i64 - 1);

            let (Some((y0, x0)), Some((y1, x1))) =
                (offset.index_in(width, height), far.index_in(width, height))
            else {
                let pixel = if offset.index_in(width, height).is_none() { offset } else { far };
                return Err(GeoError::OutOfBounds {
                    pixel,
                    width,
                    height,
                });
            };

            let mut cover = covered.slice_mut(s![y0..=y1, x0..=x1]);
            if cover.iter().any(|&c| c) {
                return Err(GeoError::TileMismatch {
                    index,
                    reason: format!("overlaps a previously placed tile at {offset:?}"),
                });
            }
            cover.fill(true);

            debug!(index, x = offset.x, y = offset.y, "Placing tile");
            pixels
                .slice_mut(s![y0..=y1, x0..=x1])
                .assign(&tile.pixels);
        }

        let mosaic = Self::from_parts(transform, pixels);
        info!(
            tiles = tiles.len(),
            columns,
            rows,
            width,
            height,
            extent = %mosaic.extent,
            "Built mosaic"
        );
        Ok(mosaic)
    }

    fn from_parts(transform: GeoTransform, pixels: Array2<f32>) -> Self {
        let (height, width) = pixels.dim();
        let origin = transform.origin();
        let span = Point2D::new(width as f64, height as f64).scale(transform.resolution());
        Self {
            transform,
            extent: Extent::new(origin, origin + span),
            pixels,
        }
    }

    /// Copy the pixels covering `region` into a new raster.
    ///
    /// The region's corners are pixel edges; each is nudged half a pixel
    /// inward before lookup so it lands in the enclosing pixel. The new
    /// raster's resolution is re-derived from the region size and the pixel
    /// count, so it differs slightly from the source's when the region is not
    /// a whole number of pixels.
    pub fn sub_region(&self, region: &Extent) -> Result<Raster> {
        if !region.is_valid() {
            return Err(GeoError::InvalidRegion(format!(
                "bottom-left must lie below and left of top-right: {region}"
            )));
        }

        let half = self.resolution() * 0.5;
        let top_left = locate(
            &self.transform,
            region.top_left() + Point2D::new(half.x, -half.y),
        )?;
        let bottom_right = locate(
            &self.transform,
            region.bottom_right() + Point2D::new(-half.x, half.y),
        )?;
        self.check_bounds(top_left)?;
        self.check_bounds(bottom_right)?;

        let crop_w = bottom_right.x - top_left.x + 1;
        let crop_h = top_left.y - bottom_right.y + 1;
        if crop_w <= 0 || crop_h <= 0 {
            return Err(GeoError::InvalidRegion(format!(
                "region {region} is smaller than one pixel"
            )));
        }

        // top_left carries the north row, bottom_right the south row
        let (x0, y0) = (top_left.x as usize, bottom_right.y as usize);
        let (w, h) = (crop_w as usize, crop_h as usize);
        let pixels = self.pixels.slice(s![y0..y0 + h, x0..x0 + w]).to_owned();

        let size = region.size();
        let resolution = Point2D::new(size.x / w as f64, size.y / h as f64);
        if !approx_eq(resolution.x, self.resolution().x) || !approx_eq(resolution.y, self.resolution().y) {
            debug!(
                source_x = self.resolution().x,
                source_y = self.resolution().y,
                crop_x = resolution.x,
                crop_y = resolution.y,
                "Sub-region resolution re-derived"
            );
        }
        let forward = AffineTransform::from_origin(region.bottom_left(), resolution);
        let transform = GeoTransform::new(forward, self.north_up())?;

        info!(x0, y0, width = w, height = h, "Extracted sub-region");
        Ok(Self::from_parts(transform, pixels))
    }

    /// Single pass over the pixels in raster order; the first occurrence of
    /// each extreme wins. NaN samples are skipped.
    #[must_use]
    pub fn scan_min_max(&self) -> MinMax {
        let mut result = MinMax {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            min_pixel: Point2I::default(),
            max_pixel: Point2I::default(),
        };
        let mut skipped = 0usize;

        for ((y, x), &height) in self.pixels.indexed_iter() {
            if height.is_nan() {
                skipped += 1;
                continue;
            }
            if height < result.min {
                result.min = height;
                result.min_pixel = Point2I::new(x as i64, y as i64);
            }
            if height > result.max {
                result.max = height;
                result.max_pixel = Point2I::new(x as i64, y as i64);
            }
        }

        if skipped > 0 {
            warn!(skipped, "Skipped NaN samples during min/max scan");
        }
        if result.min > result.max {
            result.min = f32::NAN;
            result.max = f32::NAN;
        }
        result
    }

    /// Map heights onto `[0, 1]` in place and return the statistics used.
    ///
    /// A raster whose minimum equals its maximum is rejected and left
    /// unchanged. NaN samples are ignored by the scan and stay NaN, so a
    /// raster with no-data holes keeps them after normalization.
    pub fn normalize(&mut self) -> Result<MinMax> {
        let stats = self.scan_min_max();
        let range = stats.range();
        if range.is_nan() || range <= 0.0 {
            return Err(GeoError::FlatRaster { value: stats.min });
        }

        let (min, max) = (f64::from(stats.min), f64::from(stats.max));
        self.pixels
            .mapv_inplace(|h| remap(f64::from(h), min, max, 0.0, 1.0).map_or(h, |v| v as f32));
        info!(min = stats.min, max = stats.max, "Normalized raster");
        Ok(stats)
    }

    /// Quad mesh over this raster's extent.
    pub fn tessellate(&self, subdivisions: usize, meters_per_unit: f64) -> Result<Mesh> {
        Tessellator::new(&self.extent)
            .subdivisions(subdivisions)
            .meters_per_unit(meters_per_unit)
            .build()
    }

    /// Value at `pixel`, bounds-checked.
    pub fn pixel(&self, pixel: Point2I) -> Result<f32> {
        let index = self.check_bounds(pixel)?;
        Ok(self.pixels[index])
    }

    /// Value of the pixel containing `geo`.
    pub fn sample(&self, geo: Point2D) -> Result<f32> {
        self.pixel(locate(&self.transform, geo)?)
    }

    #[must_use]
    pub fn pixel_to_geo(&self, pixel: Point2I, anchor: PixelAnchor) -> Point2D {
        self.transform.pixel_to_geo(pixel, anchor)
    }

    #[must_use]
    pub fn geo_to_pixel(&self, geo: Point2D) -> Option<Point2I> {
        self.transform.geo_to_pixel(geo)
    }

    fn check_bounds(&self, pixel: Point2I) -> Result<(usize, usize)> {
        pixel
            .index_in(self.width(), self.height())
            .ok_or(GeoError::OutOfBounds {
                pixel,
                width: self.width(),
                height: self.height(),
            })
    }

    /// Pixels and transform in the source's native row order, ready for a sink.
    #[must_use]
    pub fn to_decoded(&self) -> DecodedRaster {
        let grid = if self.north_up() {
            flip_rows(&self.pixels)
        } else {
            self.pixels.as_standard_layout().into_owned()
        };
        let (pixels, _) = grid.into_raw_vec_and_offset();
        DecodedRaster::new(
            pixels,
            self.width(),
            self.height(),
            self.transform.to_native(self.height()),
        )
    }

    /// Encode through `sink` at `path`.
    pub fn write(&self, sink: &dyn RasterSink, path: &Path) -> Result<()> {
        sink.write(path, &self.to_decoded())?;
        info!(path = %path.display(), "Wrote raster");
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    #[must_use]
    pub fn size(&self) -> Point2I {
        Point2I::new(self.width() as i64, self.height() as i64)
    }

    #[must_use]
    pub fn resolution(&self) -> Point2D {
        self.transform.resolution()
    }

    #[must_use]
    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    #[must_use]
    pub fn north_up(&self) -> bool {
        self.transform.north_up()
    }

    #[must_use]
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    #[must_use]
    pub fn pixels(&self) -> &Array2<f32> {
        &self.pixels
    }
}

fn locate(transform: &GeoTransform, geo: Point2D) -> Result<Point2I> {
    transform
        .geo_to_pixel(geo)
        .ok_or(GeoError::UnmappablePosition { x: geo.x, y: geo.y })
}

/// Copy of `grid` with its rows in reverse order.
fn flip_rows(grid: &Array2<f32>) -> Array2<f32> {
    let mut flipped = grid.view();
    flipped.invert_axis(Axis(0));
    flipped.as_standard_layout().into_owned()
}

/// Tile whose top-left corner is furthest west, ties going to the northernmost.
fn top_left_tile(tiles: &[Raster]) -> usize {
    let mut best = 0;
    for (index, tile) in tiles.iter().enumerate().skip(1) {
        let corner = tile.extent.top_left();
        let current = tiles[best].extent.top_left();
        if approx_eq(corner.x, current.x) {
            if corner.y > current.y {
                best = index;
            }
        } else if corner.x < current.x {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryRasterSource;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::path::PathBuf;

    const RES: f64 = 1.0 / 3600.0;

    /// North-up tile with its top-left corner at (`west`, `north`), values
    /// `base + row * width + col` in native (north-first) order.
    fn tile(west: f64, north: f64, width: usize, height: usize, res: f64, base: f32) -> DecodedRaster {
        let pixels = (0..width * height).map(|i| base + i as f32).collect();
        DecodedRaster::new(pixels, width, height, [west, res, 0.0, north, 0.0, -res])
    }

    #[test]
    fn test_single_tile_scenario() {
        let raster = Raster::from_decoded(tile(-115.0, 37.0, 3600, 3600, RES, 0.0)).unwrap();

        assert_eq!(raster.size(), Point2I::new(3600, 3600));
        assert!(raster.north_up());
        assert_eq!(raster.resolution(), Point2D::new(RES, RES));
        assert_eq!(raster.extent().bottom_left(), Point2D::new(-115.0, 36.0));
        assert_eq!(raster.extent().top_right(), Point2D::new(-114.0, 37.0));
        assert_eq!(raster.extent().top_left(), Point2D::new(-115.0, 37.0));
        assert_eq!(raster.extent().bottom_right(), Point2D::new(-114.0, 36.0));
        assert_eq!(raster.extent().size(), Point2D::new(1.0, 1.0));

        let meters = raster.extent().size_in_meters();
        assert_relative_eq!(meters.x, 88_903.29, epsilon = 0.01);
        assert_relative_eq!(meters.y, 111_319.49, epsilon = 0.01);
    }

    #[test]
    fn test_rows_are_stored_bottom_up() {
        // native rows: [0 1 2] north, [3 4 5] south
        let raster = Raster::from_decoded(tile(0.0, 2.0, 3, 2, 1.0, 0.0)).unwrap();
        assert_eq!(raster.pixel(Point2I::new(0, 0)).unwrap(), 3.0);
        assert_eq!(raster.pixel(Point2I::new(2, 0)).unwrap(), 5.0);
        assert_eq!(raster.pixel(Point2I::new(0, 1)).unwrap(), 0.0);
        assert_eq!(raster.pixel(Point2I::new(2, 1)).unwrap(), 2.0);
    }

    #[test]
    fn test_south_up_source_is_not_flipped() {
        let decoded = DecodedRaster::new(vec![0.0, 1.0, 2.0, 3.0], 2, 2, [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let raster = Raster::from_decoded(decoded).unwrap();
        assert!(!raster.north_up());
        assert_eq!(raster.pixel(Point2I::new(0, 0)).unwrap(), 0.0);
        assert_eq!(raster.pixel(Point2I::new(1, 1)).unwrap(), 3.0);
        assert_eq!(raster.extent().top_right(), Point2D::new(2.0, 2.0));
    }

    #[test]
    fn test_invalid_buffers_are_rejected() {
        let short = DecodedRaster::new(vec![0.0; 5], 3, 2, [0.0, 1.0, 0.0, 2.0, 0.0, -1.0]);
        assert!(matches!(Raster::from_decoded(short), Err(GeoError::InvalidBuffer(_))));

        let empty = DecodedRaster::new(vec![], 0, 0, [0.0, 1.0, 0.0, 2.0, 0.0, -1.0]);
        assert!(matches!(Raster::from_decoded(empty), Err(GeoError::InvalidBuffer(_))));

        let singular = DecodedRaster::new(vec![0.0; 4], 2, 2, [0.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert!(matches!(
            Raster::from_decoded(singular),
            Err(GeoError::DegenerateTransform { .. })
        ));
    }

    #[test]
    fn test_pixel_center_round_trip() {
        let raster = Raster::from_decoded(tile(-115.0, 37.0, 40, 30, 0.025, 0.0)).unwrap();
        for y in 0..30 {
            for x in 0..40 {
                let p = Point2I::new(x, y);
                let center = raster.pixel_to_geo(p, PixelAnchor::Center);
                assert_eq!(raster.geo_to_pixel(center), Some(p));
            }
        }
    }

    #[test]
    fn test_sample_and_bounds() {
        let raster = Raster::from_decoded(tile(0.0, 2.0, 3, 2, 1.0, 0.0)).unwrap();
        assert_eq!(raster.sample(Point2D::new(0.5, 0.5)).unwrap(), 3.0);
        assert_eq!(raster.sample(Point2D::new(2.9, 1.9)).unwrap(), 2.0);
        assert_eq!(raster.sample(raster.extent().bottom_left()).unwrap(), 3.0);

        assert!(matches!(
            raster.sample(raster.extent().top_right()),
            Err(GeoError::OutOfBounds { .. })
        ));
        assert!(matches!(
            raster.pixel(Point2I::new(-1, 0)),
            Err(GeoError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_two_tile_mosaic_scenario() {
        let west = tile(-115.0, 37.0, 3600, 3600, RES, 0.0);
        let east = tile(-114.0, 37.0, 3600, 3600, RES, 1.0e6);
        let west_origin = Raster::from_decoded(west.clone()).unwrap().pixel(Point2I::new(0, 0)).unwrap();

        // list order deliberately east first
        let mosaic = Raster::mosaic_decoded(vec![east, west], 2, 1).unwrap();
        assert_eq!(mosaic.size(), Point2I::new(7200, 3600));
        assert_eq!(mosaic.extent().bottom_left(), Point2D::new(-115.0, 36.0));
        assert_eq!(mosaic.extent().top_right(), Point2D::new(-113.0, 37.0));
        assert_eq!(mosaic.pixel(Point2I::new(0, 0)).unwrap(), west_origin);
    }

    #[test]
    fn test_grid_mosaic_places_tiles_by_position() {
        // 2x2 grid of 2x2 tiles, one degree apart
        let nw = tile(0.0, 2.0, 2, 2, 0.5, 100.0);
        let ne = tile(1.0, 2.0, 2, 2, 0.5, 200.0);
        let sw = tile(0.0, 1.0, 2, 2, 0.5, 300.0);
        let se = tile(1.0, 1.0, 2, 2, 0.5, 400.0);
        let sw_raster = Raster::from_decoded(sw.clone()).unwrap();
        let ne_raster = Raster::from_decoded(ne.clone()).unwrap();

        let mosaic = Raster::mosaic_decoded(vec![se, sw, ne, nw], 2, 2).unwrap();
        assert_eq!(mosaic.size(), Point2I::new(4, 4));
        assert_eq!(mosaic.extent().bottom_left(), Point2D::new(0.0, 0.0));
        assert_eq!(mosaic.extent().top_right(), Point2D::new(2.0, 2.0));

        assert_eq!(
            mosaic.pixel(Point2I::new(0, 0)).unwrap(),
            sw_raster.pixel(Point2I::new(0, 0)).unwrap()
        );
        assert_eq!(
            mosaic.pixel(Point2I::new(3, 3)).unwrap(),
            ne_raster.pixel(Point2I::new(1, 1)).unwrap()
        );
        // every sample comes from exactly one tile
        assert!(mosaic.pixels().iter().all(|&v| v >= 100.0));
    }

    #[test]
    fn test_mosaic_rejects_bad_grid() {
        let a = tile(0.0, 1.0, 2, 2, 0.5, 0.0);
        let result = Raster::mosaic_decoded(vec![a.clone(), a], 3, 1);
        assert!(matches!(
            result,
            Err(GeoError::InvalidTileGrid { tiles: 2, columns: 3, rows: 1 })
        ));
        assert!(matches!(
            Raster::mosaic_decoded(vec![], 0, 0),
            Err(GeoError::InvalidTileGrid { .. })
        ));
    }

    #[test]
    fn test_mosaic_rejects_mismatched_tiles() {
        let a = tile(0.0, 1.0, 2, 2, 0.5, 0.0);
        let b = tile(1.0, 1.0, 2, 3, 0.5, 0.0);
        assert!(matches!(
            Raster::mosaic_decoded(vec![a.clone(), b], 2, 1),
            Err(GeoError::TileMismatch { index: 1, .. })
        ));

        let c = tile(1.0, 1.0, 2, 2, 0.25, 0.0);
        assert!(matches!(
            Raster::mosaic_decoded(vec![a, c], 2, 1),
            Err(GeoError::TileMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_mosaic_rejects_overlapping_tiles() {
        let a = tile(0.0, 1.0, 2, 2, 0.5, 0.0);
        assert!(matches!(
            Raster::mosaic_decoded(vec![a.clone(), a], 2, 1),
            Err(GeoError::TileMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_mosaic_rejects_tiles_outside_the_grid() {
        // second tile is two tile-widths east, leaving a gap
        let a = tile(0.0, 1.0, 2, 2, 0.5, 0.0);
        let b = tile(2.0, 1.0, 2, 2, 0.5, 0.0);
        assert!(matches!(
            Raster::mosaic_decoded(vec![a, b], 2, 1),
            Err(GeoError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_mosaic_from_source() {
        let source = MemoryRasterSource::new()
            .with("w.tif", tile(0.0, 1.0, 2, 2, 0.5, 0.0))
            .with("e.tif", tile(1.0, 1.0, 2, 2, 0.5, 10.0));
        let list = TileList::new(1, 2, vec![PathBuf::from("w.tif"), PathBuf::from("e.tif")]).unwrap();
        let mosaic = Raster::mosaic(&source, &list).unwrap();
        assert_eq!(mosaic.size(), Point2I::new(4, 2));

        let missing = TileList::new(1, 1, vec![PathBuf::from("nope.tif")]).unwrap();
        assert!(matches!(Raster::mosaic(&source, &missing), Err(GeoError::Open(_))));
    }

    #[test]
    fn test_sub_region_copies_pixels() {
        // 4x4 raster, 1 unit pixels, origin (0, 0) south-west
        let raster = Raster::from_decoded(tile(0.0, 4.0, 4, 4, 1.0, 0.0)).unwrap();
        let crop = raster.sub_region(&Extent::from_bounds(1.0, 1.0, 3.0, 4.0)).unwrap();

        assert_eq!(crop.size(), Point2I::new(2, 3));
        assert_eq!(crop.resolution(), Point2D::new(1.0, 1.0));
        assert_eq!(crop.extent().bottom_left(), Point2D::new(1.0, 1.0));
        assert_eq!(crop.extent().top_right(), Point2D::new(3.0, 4.0));
        for y in 0..3 {
            for x in 0..2 {
                assert_eq!(
                    crop.pixel(Point2I::new(x, y)).unwrap(),
                    raster.pixel(Point2I::new(x + 1, y + 1)).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_sub_region_is_independent() {
        let raster = Raster::from_decoded(tile(0.0, 4.0, 4, 4, 1.0, 0.0)).unwrap();
        let mut crop = raster.sub_region(&Extent::from_bounds(0.0, 0.0, 2.0, 2.0)).unwrap();
        let before = raster.pixel(Point2I::new(0, 0)).unwrap();
        crop.normalize().unwrap();
        assert_eq!(raster.pixel(Point2I::new(0, 0)).unwrap(), before);
    }

    #[test]
    fn test_sub_region_rederives_resolution() {
        let raster = Raster::from_decoded(tile(0.0, 4.0, 4, 4, 1.0, 0.0)).unwrap();
        let crop = raster.sub_region(&Extent::from_bounds(0.0, 0.0, 2.5, 2.0)).unwrap();
        assert_eq!(crop.size(), Point2I::new(3, 2));
        assert_relative_eq!(crop.resolution().x, 2.5 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(crop.resolution().y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sub_region_full_extent() {
        let raster = Raster::from_decoded(tile(-115.0, 37.0, 360, 360, 1.0 / 360.0, 0.0)).unwrap();
        let crop = raster.sub_region(raster.extent()).unwrap();
        assert_eq!(crop.size(), raster.size());
        assert_eq!(crop.pixels(), raster.pixels());
    }

    #[test]
    fn test_sub_region_errors() {
        let raster = Raster::from_decoded(tile(0.0, 4.0, 4, 4, 1.0, 0.0)).unwrap();
        assert!(matches!(
            raster.sub_region(&Extent::from_bounds(3.0, 3.0, 1.0, 1.0)),
            Err(GeoError::InvalidRegion(_))
        ));
        assert!(matches!(
            raster.sub_region(&Extent::from_bounds(2.0, 2.0, 6.0, 3.0)),
            Err(GeoError::OutOfBounds { .. })
        ));
        assert!(matches!(
            raster.sub_region(&Extent::from_bounds(1.1, 1.1, 1.3, 1.3)),
            Err(GeoError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_scan_min_max_locations() {
        let mut decoded = tile(0.0, 4.0, 4, 4, 1.0, 0.0);
        decoded.pixels.fill(50.0);
        decoded.pixels[1] = 900.0; // native row 0 = bottom-up row 3
        decoded.pixels[14] = -20.0; // native row 3 = bottom-up row 0
        let raster = Raster::from_decoded(decoded).unwrap();

        let stats = raster.scan_min_max();
        assert_eq!(stats.max, 900.0);
        assert_eq!(stats.max_pixel, Point2I::new(1, 3));
        assert_eq!(stats.min, -20.0);
        assert_eq!(stats.min_pixel, Point2I::new(2, 0));
    }

    #[test]
    fn test_scan_min_max_first_occurrence_wins() {
        let decoded = DecodedRaster::new(
            vec![1.0, 5.0, 1.0, 5.0],
            2,
            2,
            [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        );
        let stats = Raster::from_decoded(decoded).unwrap().scan_min_max();
        assert_eq!(stats.min_pixel, Point2I::new(0, 0));
        assert_eq!(stats.max_pixel, Point2I::new(1, 0));
    }

    #[test]
    fn test_scan_min_max_skips_nan() {
        let decoded = DecodedRaster::new(
            vec![f32::NAN, 2.0, 7.0, f32::NAN],
            2,
            2,
            [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        );
        let stats = Raster::from_decoded(decoded).unwrap().scan_min_max();
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 7.0);

        let all_nan = DecodedRaster::new(vec![f32::NAN; 4], 2, 2, [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let stats = Raster::from_decoded(all_nan).unwrap().scan_min_max();
        assert!(stats.min.is_nan() && stats.max.is_nan());
    }

    #[test]
    fn test_normalize_maps_onto_unit_range() {
        let original = Raster::from_decoded(tile(0.0, 4.0, 4, 4, 1.0, 665.0)).unwrap();
        let mut normalized = original.clone();
        let stats = normalized.normalize().unwrap();
        assert_eq!(stats.min, 665.0);
        assert_eq!(stats.max, 680.0);
        assert_relative_eq!(stats.meters_per_unit(), 1.0 / 15.0, epsilon = 1e-12);

        for (v, o) in normalized.pixels().iter().zip(original.pixels().iter()) {
            assert!((0.0..=1.0).contains(v));
            assert_abs_diff_eq!(stats.min + v * stats.range(), *o, epsilon = 1e-3);
        }
        assert_eq!(normalized.pixel(stats.min_pixel).unwrap(), 0.0);
        assert_eq!(normalized.pixel(stats.max_pixel).unwrap(), 1.0);
    }

    #[test]
    fn test_normalize_flat_raster_is_rejected() {
        let decoded = DecodedRaster::new(vec![42.0; 4], 2, 2, [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let mut raster = Raster::from_decoded(decoded).unwrap();
        assert!(matches!(
            raster.normalize(),
            Err(GeoError::FlatRaster { value }) if value == 42.0
        ));
        assert!(raster.pixels().iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_normalize_accepts_one_ulp_range() {
        let south_up = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let decoded = DecodedRaster::new(vec![1.0, 1.0 + f32::EPSILON], 2, 1, south_up);
        let mut raster = Raster::from_decoded(decoded).unwrap();
        raster.normalize().unwrap();
        assert_eq!(raster.pixel(Point2I::new(0, 0)).unwrap(), 0.0);
        assert_eq!(raster.pixel(Point2I::new(1, 0)).unwrap(), 1.0);

        let decoded = DecodedRaster::new(vec![0.0, 1.0e-7], 2, 1, south_up);
        let mut raster = Raster::from_decoded(decoded).unwrap();
        let stats = raster.normalize().unwrap();
        assert_eq!(stats.max, 1.0e-7);
        assert_eq!(raster.pixel(Point2I::new(1, 0)).unwrap(), 1.0);
    }

    #[test]
    fn test_normalize_keeps_nan_holes() {
        let decoded =
            DecodedRaster::new(vec![f32::NAN, 10.0, 20.0], 3, 1, [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let mut raster = Raster::from_decoded(decoded).unwrap();
        raster.normalize().unwrap();
        assert!(raster.pixel(Point2I::new(0, 0)).unwrap().is_nan());
        assert_eq!(raster.pixel(Point2I::new(1, 0)).unwrap(), 0.0);
        assert_eq!(raster.pixel(Point2I::new(2, 0)).unwrap(), 1.0);
    }

    #[test]
    fn test_sample_rejects_non_finite_position() {
        let decoded = DecodedRaster::new(vec![5.0, 6.0], 2, 1, [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let raster = Raster::from_decoded(decoded).unwrap();
        assert_eq!(raster.geo_to_pixel(Point2D::new(f64::NAN, f64::NAN)), None);
        assert!(matches!(
            raster.sample(Point2D::new(f64::NAN, f64::NAN)),
            Err(GeoError::UnmappablePosition { .. })
        ));
        assert!(matches!(
            raster.sample(Point2D::new(0.5, f64::INFINITY)),
            Err(GeoError::UnmappablePosition { .. })
        ));
        assert_eq!(raster.sample(Point2D::new(1.5, 0.5)).unwrap(), 6.0);
    }

    #[test]
    fn test_to_decoded_restores_native_layout() {
        let decoded = tile(-115.0, 37.0, 3, 2, 0.5, 0.0);
        let raster = Raster::from_decoded(decoded.clone()).unwrap();
        let back = raster.to_decoded();
        assert_eq!(back.pixels, decoded.pixels);
        assert_eq!((back.width, back.height), (3, 2));
        for (a, b) in back.affine.iter().zip(decoded.affine.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tessellate_extent() {
        let mut raster = Raster::from_decoded(tile(-115.0, 37.0, 8, 8, 0.125, 600.0)).unwrap();
        let stats = raster.normalize().unwrap();
        let mesh = raster.tessellate(4, stats.meters_per_unit()).unwrap();
        assert_eq!(mesh.faces().len(), 16);
        let (w, _) = mesh.size();
        assert_relative_eq!(w, 88_903.289_614_881 * stats.meters_per_unit(), epsilon = 1e-6);
    }
}
