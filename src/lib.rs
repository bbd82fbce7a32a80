//! # heatgeo
//!
//! Approximate geodesic distances on triangle meshes with the heat method.
//!
//! Given a triangulated surface and one or more source vertices, heatgeo
//! computes the distance along the surface from the sources to every vertex.
//! A query diffuses heat from the sources for a short time, normalizes the
//! direction in which the heat decreases, and recovers the distance by a
//! Poisson solve. Both linear systems are sparse, symmetric positive definite,
//! and solved with a sparse Cholesky factorization.
//!
//! ## Features
//!
//! - **Half-edge data structure**: one-ring traversal, corner enumeration, and
//!   face adjacency with type-safe indices
//! - **Heat method**: cotangent Laplacian, lumped mass matrix, configurable
//!   timestep, boundary policy, and gradient discretization
//! - **File formats**: PLY and STL input, PLY output with the distance stored as
//!   per-vertex `quality`
//!
//! ## Quick Start
//!
//! ```no_run
//! use heatgeo::prelude::*;
//!
//! let mesh: HalfEdgeMesh = heatgeo::io::load("bunny.ply").unwrap();
//!
//! let result = heat_method(&mesh, VertexId::new(0), &HeatMethodOptions::default())
//!     .unwrap()
//!     .shifted_to_min();
//!
//! heatgeo::io::ply::save_with_quality(&mesh, result.distances(), "distance.ply").unwrap();
//! ```
//!
//! ## Lower-Level Entry Point
//!
//! [`heat_geodesic`](algo::geodesic::heat_geodesic) takes an arbitrary initial
//! heat distribution and returns the raw field:
//!
//! ```
//! use heatgeo::prelude::*;
//! use heatgeo::algo::geodesic::{heat_geodesic, initial_condition};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let u0 = initial_condition(mesh.num_vertices(), &[VertexId::<u32>::new(0)]).unwrap();
//! let phi = heat_geodesic(&mesh, &u0, &HeatMethodOptions::default()).unwrap();
//! assert_eq!(phi.len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use heatgeo::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::geodesic::{
        heat_method, heat_method_multiple, BoundaryPolicy, GeodesicResult, GradientScheme,
        HeatMethodOptions,
    };
    pub use crate::error::{GeodesicError, Result};
    pub use crate::mesh::{
        build_from_triangles, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron_query() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];

        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];

        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
        assert!(mesh.is_closed());

        let options = HeatMethodOptions::default().with_boundary_policy(BoundaryPolicy::Reject);
        let result = heat_method(&mesh, VertexId::new(0), &options).unwrap();

        assert_eq!(result.len(), 4);
        assert!(result.distances().iter().all(|d| d.is_finite()));
        assert_eq!(result.shifted_to_min().distance(VertexId::new(0)), 0.0);
    }
}
