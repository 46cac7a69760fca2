//! Error types for raster sources, sinks and the mosaic engine.

use std::path::PathBuf;

use crate::geometry::Point2I;

/// Shorthand used by the command-line binary, where any error is terminal.
pub type AnyResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Result alias for core raster operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Failure to open and decode a raster from a source.
#[derive(thiserror::Error, Debug)]
pub enum OpenError {
    #[error("raster not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported raster format in {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("corrupt raster header in {path}: {reason}")]
    CorruptHeader { path: PathBuf, reason: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to encode and write a raster to a sink.
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("path is not writable: {0}")]
    PathUnwritable(PathBuf),

    #[error("disk full while writing {0}")]
    DiskFull(PathBuf),

    #[error("encoding error for {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied
            | std::io::ErrorKind::NotFound
            | std::io::ErrorKind::ReadOnlyFilesystem
            | std::io::ErrorKind::IsADirectory => WriteError::PathUnwritable(path),
            std::io::ErrorKind::StorageFull => WriteError::DiskFull(path),
            _ => WriteError::Io { path, source: err },
        }
    }
}

/// Errors raised by the geo-transform, mosaic, crop and mesh operations.
#[derive(thiserror::Error, Debug)]
pub enum GeoError {
    #[error("invalid tile grid: {tiles} tiles cannot fill a {columns}x{rows} grid")]
    InvalidTileGrid {
        tiles: usize,
        columns: usize,
        rows: usize,
    },

    #[error("tile {index} does not fit the grid: {reason}")]
    TileMismatch { index: usize, reason: String },

    #[error("malformed region bounds: {0}")]
    InvalidRegion(String),

    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    #[error("mesh needs at least one subdivision per side")]
    InvalidSubdivisions,

    #[error("mesh scale must be positive and finite, got {0}")]
    InvalidScale(f64),

    #[error("tile list line {line}: {reason}")]
    TileList { line: usize, reason: String },

    #[error("affine transform is not invertible (determinant {determinant})")]
    DegenerateTransform { determinant: f64 },

    #[error("raster has no dynamic range (min = max = {value})")]
    FlatRaster { value: f32 },

    #[error("position ({x}, {y}) does not map to a pixel")]
    UnmappablePosition { x: f64, y: f64 },

    #[error("pixel {pixel:?} is outside a {width}x{height} raster")]
    OutOfBounds {
        pixel: Point2I,
        width: usize,
        height: usize,
    },

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_from_permission_denied() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let mapped = WriteError::from_io(PathBuf::from("/root/x.tif"), err);
        assert!(matches!(mapped, WriteError::PathUnwritable(_)));
    }

    #[test]
    fn test_write_error_from_storage_full() {
        let err = std::io::Error::new(std::io::ErrorKind::StorageFull, "full");
        let mapped = WriteError::from_io(PathBuf::from("/tmp/x.tif"), err);
        assert!(matches!(mapped, WriteError::DiskFull(_)));
    }

    #[test]
    fn test_open_error_converts_into_geo_error() {
        let err: GeoError = OpenError::NotFound(PathBuf::from("missing.tif")).into();
        assert!(matches!(err, GeoError::Open(OpenError::NotFound(_))));
        assert_eq!(err.to_string(), "raster not found: missing.tif");
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = GeoError::OutOfBounds {
            pixel: Point2I::new(5, -1),
            width: 4,
            height: 4,
        };
        assert!(err.to_string().contains("4x4"));
    }
}
