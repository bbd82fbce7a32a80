//! PLY (Stanford polygon) format support.
//!
//! Meshes are read with `ply-rs`; polygons with more than three vertices are
//! fan-triangulated. Output is ASCII, optionally with a per-vertex `quality`
//! scalar carrying a distance field, which most viewers can map to a color ramp.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{GeodesicError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use heatgeo::io::ply;
/// use heatgeo::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let load_error = |message: &str| GeodesicError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| load_error(&e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let coord = |name: &str| {
            get_float_property(vertex, name)
                .ok_or_else(|| load_error(&format!("vertex missing {} coordinate", name)))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;

        // Fan triangulation; fewer than three indices is skipped
        for i in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    if faces.is_empty() {
        return Err(load_error("PLY file contains no faces"));
    }

    log::debug!(
        "loaded {}: {} vertices, {} triangles",
        path.display(),
        vertices.len(),
        faces.len()
    );
    build_from_triangles(&vertices, &faces)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to an ASCII PLY file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    write_ply(mesh, None, path.as_ref())
}

/// Save a mesh with one scalar per vertex stored as the `quality` property.
///
/// # Example
///
/// ```no_run
/// use heatgeo::prelude::*;
/// use heatgeo::io::ply;
///
/// let mesh: HalfEdgeMesh = ply::load("model.ply").unwrap();
/// let result = heat_method(&mesh, VertexId::new(0), &HeatMethodOptions::default()).unwrap();
/// ply::save_with_quality(&mesh, result.distances(), "distance.ply").unwrap();
/// ```
pub fn save_with_quality<P: AsRef<Path>, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    quality: &[f64],
    path: P,
) -> Result<()> {
    if quality.len() != mesh.num_vertices() {
        return Err(GeodesicError::invalid_param(
            "quality length",
            quality.len(),
            "must match the vertex count",
        ));
    }
    write_ply(mesh, Some(quality), path.as_ref())
}

fn write_ply<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, quality: Option<&[f64]>, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    // Write header
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by heatgeo")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if quality.is_some() {
        writeln!(writer, "property float quality")?;
    }
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, v) in vertices.iter().enumerate() {
        match quality {
            Some(q) => writeln!(writer, "{} {} {} {}", v.x, v.y, v.z, q[i])?,
            None => writeln!(writer, "{} {} {}", v.x, v.y, v.z)?,
        }
    }

    for f in &faces {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::octahedron;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let mesh = octahedron();
        let dir = tempdir().unwrap();
        let path = dir.path().join("octahedron.ply");
        save(&mesh, &path).unwrap();

        let loaded: HalfEdgeMesh = load(&path).unwrap();
        assert_eq!(loaded.num_vertices(), 6);
        assert_eq!(loaded.num_faces(), 8);
        assert!(loaded.is_closed());
    }

    #[test]
    fn test_quality_property_is_readable() {
        let mesh = octahedron();
        let values: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
        let dir = tempdir().unwrap();
        let path = dir.path().join("quality.ply");
        save_with_quality(&mesh, &values, &path).unwrap();

        let mut reader = BufReader::new(File::open(&path).unwrap());
        let ply = Parser::<DefaultElement>::new().read_ply(&mut reader).unwrap();
        let read: Vec<f64> = ply
            .payload
            .get("vertex")
            .unwrap()
            .iter()
            .map(|v| get_float_property(v, "quality").unwrap())
            .collect();
        assert_eq!(read, values);

        // Geometry still loads with the extra property present
        let loaded: HalfEdgeMesh = load(&path).unwrap();
        assert_eq!(loaded.num_vertices(), 6);
    }

    #[test]
    fn test_quality_length_checked() {
        let mesh = octahedron();
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.ply");
        assert!(save_with_quality(&mesh, &[1.0, 2.0], &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result: Result<HalfEdgeMesh> = load(dir.path().join("does-not-exist.ply"));
        assert!(matches!(result, Err(GeodesicError::Io(_))));
    }
}
