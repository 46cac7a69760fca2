//! Wavefront OBJ export for tessellated meshes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::WriteError;
use crate::mesh::Mesh;

/// Streams a [`Mesh`] as OBJ text with a single `+z` normal record.
pub struct ObjWriter<W: Write> {
    writer: W,
}

impl<W: Write> ObjWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_mesh(&mut self, mesh: &Mesh) -> std::io::Result<()> {
        let w = &mut self.writer;
        writeln!(w, "# geomosaic height-field grid")?;
        for [x, y, z] in mesh.vertices() {
            writeln!(w, "v {x} {y} {z}")?;
        }
        for [u, v] in mesh.uvs() {
            writeln!(w, "vt {u} {v}")?;
        }
        writeln!(w, "vn 0 0 1")?;

        // OBJ indices are 1-based
        for face in mesh.faces() {
            write!(w, "f")?;
            for corner in face {
                write!(w, " {}/{}", corner.vertex + 1, corner.uv + 1)?;
            }
            writeln!(w)?;
        }
        w.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Write `mesh` to an OBJ file at `path`.
pub fn write_obj(path: &Path, mesh: &Mesh) -> Result<(), WriteError> {
    let file = File::create(path).map_err(|e| WriteError::from_io(path.to_path_buf(), e))?;
    ObjWriter::new(BufWriter::new(file))
        .write_mesh(mesh)
        .map_err(|e| WriteError::from_io(path.to_path_buf(), e))?;
    debug!(
        path = %path.display(),
        vertices = mesh.vertices().len(),
        faces = mesh.faces().len(),
        "Wrote OBJ mesh"
    );
    Ok(())
}
