//! Plain-text description of a mosaic tile grid.
//!
//! ```text
//! # rows cols
//! 1 2
//! "N36W115.tif"
//! N36W114.tif
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. The first data line
//! gives the grid size; each following line names one tile, row-major.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GeoError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileList {
    rows: usize,
    columns: usize,
    paths: Vec<PathBuf>,
}

impl TileList {
    pub fn new(rows: usize, columns: usize, paths: Vec<PathBuf>) -> Result<Self> {
        if rows == 0 || columns == 0 || paths.len() != rows * columns {
            return Err(GeoError::InvalidTileGrid {
                tiles: paths.len(),
                columns,
                rows,
            });
        }
        Ok(Self {
            rows,
            columns,
            paths,
        })
    }

    /// Parse `text`, resolving relative tile paths against `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let (header_line, header) = lines.next().ok_or(GeoError::TileList {
            line: 0,
            reason: "missing \"rows cols\" header".to_string(),
        })?;
        let (rows, columns) = parse_header(header).ok_or_else(|| GeoError::TileList {
            line: header_line,
            reason: format!("expected \"rows cols\", got {header:?}"),
        })?;

        let mut paths = Vec::with_capacity(rows.saturating_mul(columns));
        for (line_no, line) in lines {
            let name = unquote(line).ok_or_else(|| GeoError::TileList {
                line: line_no,
                reason: format!("unterminated quote in {line:?}"),
            })?;
            let path = Path::new(name);
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };
            debug!(line = line_no, path = %path.display(), "Tile list entry");
            paths.push(path);
        }

        Self::new(rows, columns, paths)
    }

    /// Read and parse a tile list file; relative entries resolve against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, base_dir)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn parse_header(header: &str) -> Option<(usize, usize)> {
    let mut fields = header.split_whitespace();
    let rows = fields.next()?.parse().ok()?;
    let columns = fields.next()?.parse().ok()?;
    fields.next().is_none().then_some((rows, columns))
}

fn unquote(line: &str) -> Option<&str> {
    match line.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"'),
        None => Some(line),
    }
}
