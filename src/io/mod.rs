//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | PLY | `.ply` | ✓ | ✓ | ASCII output, optional per-vertex `quality` |
//! | STL | `.stl` | ✓ | ✗ | Binary and ASCII |
//! | Text | `.txt` | ✗ | ✓ | Scalar field only, `index value` per line |
//!
//! # Usage
//!
//! ```no_run
//! use heatgeo::io::{load, save_field};
//! use heatgeo::mesh::HalfEdgeMesh;
//!
//! // Load with automatic format detection
//! let mesh: HalfEdgeMesh = load("model.stl").unwrap();
//!
//! // Write a per-vertex field next to the geometry
//! let zeros = vec![0.0; mesh.num_vertices()];
//! save_field(&mesh, &zeros, "field.ply").unwrap();
//! ```

pub mod ply;
pub mod stl;
pub mod text;

use std::path::Path;

use crate::error::{GeodesicError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PLY (Stanford polygon) format.
    Ply,
    /// STL (stereolithography) format.
    Stl,
    /// Plain text scalar field.
    Text,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "ply" => Some(Format::Ply),
            "stl" => Some(Format::Stl),
            "txt" => Some(Format::Text),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn unsupported(path: &Path) -> GeodesicError {
    GeodesicError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    }
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    match Format::from_path(path) {
        Some(Format::Ply) => ply::load(path),
        Some(Format::Stl) => stl::load(path),
        Some(Format::Text) | None => Err(unsupported(path)),
    }
}

/// Save a per-vertex scalar field, choosing the layout from the extension.
///
/// `.ply` writes the mesh with the field as vertex `quality`; `.txt` writes the
/// field alone.
pub fn save_field<P: AsRef<Path>, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    values: &[f64],
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    match Format::from_path(path) {
        Some(Format::Ply) => ply::save_with_quality(mesh, values, path),
        Some(Format::Text) => text::save_values(values, path),
        Some(Format::Stl) | None => Err(unsupported(path)),
    }
}
