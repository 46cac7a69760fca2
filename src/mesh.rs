//! Quad mesh tessellation of a geographic region.
//!
//! The mesh is a flat grid (z = 0) sized in "normalized height units": the
//! ground size of the region in meters multiplied by a meters-per-unit
//! scale, so a height field normalized to `[0, 1]` can be applied as a
//! displacement map with correct proportions. Texture coordinates span
//! `[0, 1]` on both axes.
//!
//! # Example
//!
//! ```rust
//! use geomosaic::{Extent, Tessellator};
//!
//! let region = Extent::from_bounds(-115.0, 36.0, -114.0, 37.0);
//! let mesh = Tessellator::new(&region)
//!     .subdivisions(4)
//!     .meters_per_unit(1.0 / 250.0)
//!     .build()?;
//! assert_eq!(mesh.faces().len(), 16);
//! assert_eq!(mesh.vertices().len(), 25);
//! # Ok::<(), geomosaic::GeoError>(())
//! ```

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::error::{GeoError, Result};
use crate::geometry::{Extent, Point2D};
use crate::utils::great_circle_distance;

/// Default number of quads along each side of the grid.
pub const DEFAULT_SUBDIVISIONS: usize = 64;

/// One corner of a face: indices into [`Mesh::vertices`] and [`Mesh::uvs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceVertex {
    pub vertex: usize,
    pub uv: usize,
}

/// Indexed quad mesh. Faces list their corners counter-clockwise seen from +z.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<[f64; 3]>,
    uvs: Vec<[f64; 2]>,
    faces: Vec<[FaceVertex; 4]>,
}

impl Mesh {
    #[must_use]
    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    #[must_use]
    pub fn uvs(&self) -> &[[f64; 2]] {
        &self.uvs
    }

    #[must_use]
    pub fn faces(&self) -> &[[FaceVertex; 4]] {
        &self.faces
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Largest vertex coordinates, i.e. the mesh width and length.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        self.vertices
            .iter()
            .fold((0.0_f64, 0.0_f64), |(w, l), v| (w.max(v[0]), l.max(v[1])))
    }
}

/// Interns vertex positions so corners shared by neighbouring quads get one index.
///
/// The key is the exact bit pattern of `(x, y)`; grid positions are always
/// produced by the same expression, so equal lattice points hash equally.
/// UVs are pushed in lockstep, which makes the uv index equal to the vertex index.
struct MeshBuilder {
    mesh: Mesh,
    lookup: AHashMap<(u64, u64), usize>,
}

impl MeshBuilder {
    fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            mesh: Mesh {
                vertices: Vec::with_capacity(vertices),
                uvs: Vec::with_capacity(vertices),
                faces: Vec::with_capacity(faces),
            },
            lookup: AHashMap::with_capacity(vertices),
        }
    }

    fn intern(&mut self, x: f64, y: f64, u: f64, v: f64) -> FaceVertex {
        let key = (x.to_bits(), y.to_bits());
        let mesh = &mut self.mesh;
        let index = *self.lookup.entry(key).or_insert_with(|| {
            mesh.vertices.push([x, y, 0.0]);
            mesh.uvs.push([u, v]);
            mesh.vertices.len() - 1
        });
        FaceVertex { vertex: index, uv: index }
    }

    fn push_face(&mut self, face: [FaceVertex; 4]) {
        self.mesh.faces.push(face);
    }

    fn finish(self) -> Mesh {
        self.mesh
    }
}

/// Builder for a quad grid over a region given by its four corners.
#[derive(Debug, Clone, Copy)]
pub struct Tessellator {
    top_left: Point2D,
    top_right: Point2D,
    bottom_left: Point2D,
    subdivisions: usize,
    meters_per_unit: f64,
}

impl Tessellator {
    /// Tessellate the whole of `extent`.
    #[must_use]
    pub fn new(extent: &Extent) -> Self {
        Self::from_corners(extent.top_left(), extent.top_right(), extent.bottom_left())
    }

    /// Tessellate the region spanned by three of its corners.
    ///
    /// Width is measured from `top_left` to `top_right`, length from
    /// `top_left` to `bottom_left`.
    #[must_use]
    pub fn from_corners(top_left: Point2D, top_right: Point2D, bottom_left: Point2D) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            subdivisions: DEFAULT_SUBDIVISIONS,
            meters_per_unit: 1.0,
        }
    }

    /// Quads along each side.
    #[must_use]
    pub fn subdivisions(mut self, subdivisions: usize) -> Self {
        self.subdivisions = subdivisions;
        self
    }

    /// Mesh units per meter of ground distance, usually `1 / (max - min)`.
    #[must_use]
    pub fn meters_per_unit(mut self, scale: f64) -> Self {
        self.meters_per_unit = scale;
        self
    }

    /// Ground width and length of the region in mesh units.
    #[must_use]
    pub fn grid_size(&self) -> (f64, f64) {
        let tl = self.top_left;
        let width = great_circle_distance(tl.x, tl.y, self.top_right.x, self.top_right.y);
        let length = great_circle_distance(tl.x, tl.y, self.bottom_left.x, self.bottom_left.y);
        (width * self.meters_per_unit, length * self.meters_per_unit)
    }

    pub fn build(&self) -> Result<Mesh> {
        let n = self.subdivisions;
        if n == 0 {
            return Err(GeoError::InvalidSubdivisions);
        }
        if !(self.meters_per_unit.is_finite() && self.meters_per_unit > 0.0) {
            return Err(GeoError::InvalidScale(self.meters_per_unit));
        }

        let (width, length) = self.grid_size();
        if width <= 0.0 || length <= 0.0 {
            warn!(width, length, "Tessellating a region with zero ground size");
        }

        let steps = n as f64;
        let dx = width / steps;
        let dy = length / steps;
        let duv = 1.0 / steps;

        let mut builder = MeshBuilder::with_capacity((n + 1) * (n + 1), n * n);
        for j in 0..n {
            for i in 0..n {
                let face = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)].map(|(a, b)| {
                    let (a, b) = (a as f64, b as f64);
                    builder.intern(a * dx, b * dy, a * duv, b * duv)
                });
                builder.push_face(face);
            }
        }

        let mesh = builder.finish();
        debug!(
            subdivisions = n,
            width,
            length,
            vertices = mesh.vertices.len(),
            faces = mesh.faces.len(),
            "Tessellated region"
        );
        Ok(mesh)
    }
}
