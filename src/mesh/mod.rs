//! Triangle mesh representation.
//!
//! [`HalfEdgeMesh`] stores a triangle mesh with half-edge connectivity. It is the
//! surface every distance computation in this crate runs on, and provides the
//! queries the operators need:
//!
//! - vertex positions and stable 0-based indices,
//! - the faces of each vertex together with the vertex's corner index in each,
//! - rotation around a vertex's one-ring in angular order,
//! - face-face adjacency, unit face normals, boundary detection.
//!
//! Element indices are typed ([`VertexId`], [`HalfEdgeId`], [`FaceId`]) and generic
//! over the integer width ([`MeshIndex`]).
//!
//! ```
//! use heatgeo::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert!(!mesh.is_closed());
//! ```

mod builder;
mod halfedge;
mod index;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::{build_from_triangles, to_face_vertex};
pub use halfedge::{Corner, Face, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
