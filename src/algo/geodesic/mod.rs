//! Geodesic distance computation on meshes.
//!
//! Distances along the surface are computed with the heat method: one short
//! implicit diffusion step, the normalized direction of the diffused heat, and
//! a Poisson solve that turns that direction field back into distance.
//!
//! The building blocks are public so callers can inspect or reuse them:
//!
//! - [`operators`]: per-face areas and normals, the lumped mass matrix, the
//!   cotangent Laplacian, and the diffusion timestep.
//! - [`field`]: gradient, normalization, and divergence of vector fields.
//! - [`sparse`]: sparse operator assembly and the Cholesky solver.
//!
//! # Example
//!
//! ```no_run
//! use heatgeo::prelude::*;
//! use heatgeo::algo::geodesic::{heat_method, HeatMethodOptions};
//!
//! let mesh: HalfEdgeMesh = heatgeo::io::load("mesh.ply").unwrap();
//!
//! // Compute distances from vertex 0, anchored so the closest vertex is at 0
//! let source = VertexId::new(0);
//! let result = heat_method(&mesh, source, &HeatMethodOptions::default())
//!     .unwrap()
//!     .shifted_to_min();
//!
//! // Get distance to another vertex
//! let target = VertexId::new(10);
//! println!("Distance: {}", result.distance(target));
//!
//! // Find the farthest vertex
//! if let Some((v, d)) = result.farthest_vertex() {
//!     println!("Farthest vertex: {:?} at distance {}", v, d);
//! }
//! ```

pub mod field;
mod heat;
pub mod operators;
pub mod sparse;

use std::marker::PhantomData;

use nalgebra::DVector;

pub use field::{GradientScheme, VectorField};
pub use heat::{
    heat_geodesic, heat_geodesic_verbose, heat_method, heat_method_multiple, initial_condition,
    HeatMethodOptions,
};
pub use operators::BoundaryPolicy;

use crate::mesh::{MeshIndex, VertexId};

/// Result of geodesic distance computation.
///
/// Holds one value per vertex. The heat method determines distance only up to
/// a global additive constant, so the stored values are not anchored; see
/// [`shifted_to_min`](Self::shifted_to_min) and [`relative_to`](Self::relative_to).
#[derive(Debug, Clone, PartialEq)]
pub struct GeodesicResult<I: MeshIndex = u32> {
    distances: DVector<f64>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> GeodesicResult<I> {
    /// Wrap a per-vertex distance field.
    pub fn new(distances: DVector<f64>) -> Self {
        Self {
            distances,
            _marker: PhantomData,
        }
    }

    /// Get the distance to a vertex.
    #[inline]
    pub fn distance(&self, v: VertexId<I>) -> f64 {
        self.distances[v.index()]
    }

    /// Get all distances as a slice.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        self.distances.as_slice()
    }

    /// Borrow the underlying field.
    #[inline]
    pub fn as_vector(&self) -> &DVector<f64> {
        &self.distances
    }

    /// Unwrap into the underlying field.
    pub fn into_vector(self) -> DVector<f64> {
        self.distances
    }

    /// Get the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Smallest value, `+inf` when empty.
    pub fn min(&self) -> f64 {
        self.distances.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest value, `-inf` when empty.
    pub fn max(&self) -> f64 {
        self.distances.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Shift the field so its minimum is zero.
    pub fn shifted_to_min(&self) -> Self {
        let min = self.min();
        Self::new(self.distances.map(|d| d - min))
    }

    /// Shift the field so `v` is at zero.
    pub fn relative_to(&self, v: VertexId<I>) -> Self {
        let origin = self.distance(v);
        Self::new(self.distances.map(|d| d - origin))
    }

    /// Find the vertex with the maximum finite distance.
    pub fn farthest_vertex(&self) -> Option<(VertexId<I>, f64)> {
        let mut max_dist = f64::NEG_INFINITY;
        let mut max_vertex = None;

        for (i, &d) in self.distances.iter().enumerate() {
            if d.is_finite() && d > max_dist {
                max_dist = d;
                max_vertex = Some(i);
            }
        }

        max_vertex.map(|i| (VertexId::new(i), max_dist))
    }

    /// Iterate over all vertices with their distances.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId<I>, f64)> + '_ {
        self.distances
            .iter()
            .enumerate()
            .map(|(i, &d)| (VertexId::new(i), d))
    }
}
