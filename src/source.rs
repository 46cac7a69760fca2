//! Raster source and sink abstractions.
//!
//! The mosaic engine never touches files directly. It asks a [`RasterSource`]
//! for a decoded single-band buffer plus its native affine, and hands a
//! [`DecodedRaster`] to a [`RasterSink`] to persist results. This allows the
//! same engine to work with:
//! - GeoTIFF files on disk ([`TiffRasterSource`](crate::tiff_io::TiffRasterSource))
//! - In-memory tiles ([`MemoryRasterSource`])

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{OpenError, WriteError};

/// A single-band pixel buffer as stored by its source.
///
/// `pixels` is row-major in the source's own row order: row 0 is the first
/// stored row, which for north-up files is the northernmost one. `affine` is
/// the matching six-coefficient transform in GDAL order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRaster {
    pub pixels: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub affine: [f64; 6],
}

impl DecodedRaster {
    #[must_use]
    pub fn new(pixels: Vec<f32>, width: usize, height: usize, affine: [f64; 6]) -> Self {
        Self {
            pixels,
            width,
            height,
            affine,
        }
    }

    /// Native origin (top-left corner for north-up rasters).
    #[must_use]
    pub fn origin(&self) -> (f64, f64) {
        (self.affine[0], self.affine[3])
    }
}

/// Capability to open and decode a raster.
pub trait RasterSource {
    fn open(&self, path: &Path) -> Result<DecodedRaster, OpenError>;
}

/// Capability to encode and write a raster.
pub trait RasterSink {
    fn write(&self, path: &Path, raster: &DecodedRaster) -> Result<(), WriteError>;
}

/// In-memory raster store keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemoryRasterSource {
    rasters: HashMap<PathBuf, DecodedRaster>,
}

impl MemoryRasterSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `raster` under `path`, replacing any previous entry.
    pub fn insert(&mut self, path: impl Into<PathBuf>, raster: DecodedRaster) {
        self.rasters.insert(path.into(), raster);
    }

    #[must_use]
    pub fn with(mut self, path: impl Into<PathBuf>, raster: DecodedRaster) -> Self {
        self.insert(path, raster);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }
}

impl RasterSource for MemoryRasterSource {
    fn open(&self, path: &Path) -> Result<DecodedRaster, OpenError> {
        self.rasters
            .get(path)
            .cloned()
            .ok_or_else(|| OpenError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> DecodedRaster {
        DecodedRaster::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2, [10.0, 1.0, 0.0, 20.0, 0.0, -1.0])
    }

    #[test]
    fn test_memory_source_open() {
        let source = MemoryRasterSource::new().with("a.tif", tiny());
        assert_eq!(source.len(), 1);
        let raster = source.open(Path::new("a.tif")).unwrap();
        assert_eq!(raster.width, 2);
        assert_eq!(raster.origin(), (10.0, 20.0));
    }

    #[test]
    fn test_memory_source_missing() {
        let source = MemoryRasterSource::new();
        assert!(source.is_empty());
        assert!(matches!(
            source.open(Path::new("missing.tif")),
            Err(OpenError::NotFound(_))
        ));
    }
}
