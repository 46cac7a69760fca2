//! # geomosaic - Height-field mosaic and mesh engine
//!
//! Turns single-band elevation rasters into a normalized height field and a
//! flat quad mesh ready for displacement.
//!
//! ## Features
//!
//! - **Bottom-up pixel frame**: row 0 is the southernmost row; north-up files
//!   are re-anchored once when they are opened
//! - **Mosaics**: stitch a grid of tiles by geographic position
//! - **Sub-regions**: crop by geographic bounds with half-pixel snapping
//! - **Statistics**: min/max scan with pixel locations, `[0, 1]` normalization
//! - **Tessellation**: N×N quad grid sized by great-circle distance
//! - **I/O**: GeoTIFF read/write, WKT and OBJ export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use geomosaic::{Extent, Raster, TiffRasterSource, TileList};
//!
//! let tiles = TileList::from_file(Path::new("tiles.txt"))?;
//! let mosaic = Raster::mosaic(&TiffRasterSource::new(), &tiles)?;
//!
//! let mut region = mosaic.sub_region(&Extent::from_bounds(-115.0, 36.0, -114.5, 36.5))?;
//! let stats = region.normalize()?;
//! let mesh = region.tessellate(64, stats.meters_per_unit())?;
//! println!("{} quads over {}", mesh.faces().len(), region.extent());
//! # Ok::<(), geomosaic::GeoError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`geometry`]: Points, rectangles and extents
//! - [`affine`]: Affine pixel ↔ geographic transforms
//! - [`raster`]: The [`Raster`] height field with mosaic, crop and statistics
//! - [`mesh`]: Quad grid tessellation via the [`Tessellator`] builder
//! - [`source`]: [`RasterSource`] / [`RasterSink`] capabilities
//! - [`tiff_io`]: GeoTIFF adapters for those capabilities
//! - [`tile_list`]: Tile grid description files
//! - [`wkt`] and [`obj`]: Text exports

// ============================================================================
// Public modules
// ============================================================================

pub mod affine;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod obj;
pub mod raster;
pub mod source;
pub mod tiff_io;
pub mod tile_list;
pub mod utils;
pub mod wkt;

// ============================================================================
// Geometry
// ============================================================================

pub use geometry::{
    Extent,
    Point2D,
    Point2I,
    Rectangle,
};

// ============================================================================
// Transforms
// ============================================================================

pub use affine::{
    AffineTransform,
    GeoTransform,
    PixelAnchor,
};

// ============================================================================
// Raster Engine
// ============================================================================

pub use raster::{
    MinMax,
    Raster,
};

pub use mesh::{
    DEFAULT_SUBDIVISIONS,
    FaceVertex,
    Mesh,
    Tessellator,
};

// ============================================================================
// Sources & Sinks
// ============================================================================

pub use source::{
    DecodedRaster,
    MemoryRasterSource,
    RasterSink,
    RasterSource,
};

pub use tiff_io::{
    TiffRasterSink,
    TiffRasterSource,
};

pub use tile_list::TileList;

// ============================================================================
// Exports
// ============================================================================

pub use obj::{ObjWriter, write_obj};
pub use wkt::{ToWkt, write_wkt_file};

// ============================================================================
// Errors
// ============================================================================

pub use error::{
    AnyResult,
    GeoError,
    OpenError,
    Result,
    WriteError,
};
