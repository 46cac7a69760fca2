//! Well-known-text export of points and extents.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::WriteError;
use crate::geometry::{Extent, Point2D, Rectangle};

/// Header line GIS tools use to detect a WKT column in a CSV file.
pub const WKT_HEADER: &str = "wkt;";

pub trait ToWkt {
    fn to_wkt(&self) -> String;
}

impl ToWkt for Point2D {
    fn to_wkt(&self) -> String {
        format!("POINT({} {})", self.x, self.y)
    }
}

/// Closed outline starting and ending at the top-left corner, clockwise.
impl ToWkt for Rectangle {
    fn to_wkt(&self) -> String {
        let corners = [
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
            self.top_left(),
        ];
        let coords: Vec<String> = corners.iter().map(|p| format!("{} {}", p.x, p.y)).collect();
        format!("LINESTRING({})", coords.join(", "))
    }
}

impl ToWkt for Extent {
    fn to_wkt(&self) -> String {
        self.rectangle().to_wkt()
    }
}

/// Write `geometries` to `path`, one per line after the `wkt;` header.
pub fn write_wkt_file(path: &Path, geometries: &[&dyn ToWkt]) -> Result<(), WriteError> {
    let io_err = |e| WriteError::from_io(path.to_path_buf(), e);
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    writeln!(writer, "{WKT_HEADER}").map_err(io_err)?;
    for geometry in geometries {
        writeln!(writer, "{}", geometry.to_wkt()).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}
