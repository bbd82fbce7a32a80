//! STL (stereolithography) format support.
//!
//! STL stores one triangle soup, either binary or ASCII. `stl_io` merges
//! coincident corners into shared vertices while reading, which recovers the
//! connectivity the heat method needs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{GeodesicError, Result};
use crate::mesh::{build_from_triangles, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Triangles that collapse to
/// fewer than three distinct vertices are dropped.
///
/// # Example
///
/// ```no_run
/// use heatgeo::io::stl;
/// use heatgeo::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let stl = stl_io::read_stl(&mut reader).map_err(|e| GeodesicError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|[i0, i1, i2]| i0 != i1 && i1 != i2 && i0 != i2)
        .collect();

    let dropped = stl.faces.len() - faces.len();
    if dropped > 0 {
        log::warn!("{}: dropped {} collapsed triangles", path.display(), dropped);
    }

    if faces.is_empty() {
        return Err(GeodesicError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_triangles(&vertices, &faces)
}
