//! Discrete operators of the heat method.
//!
//! - [`FaceFrames`]: per-face area and unit normal, computed once per query.
//! - [`build_mass_matrix`]: lumped (barycentric) vertex areas.
//! - [`build_cotan_laplacian`]: cotangent Laplacian, assembled by rotating
//!   around each vertex's one-ring.
//! - [`characteristic_edge_length`] and [`diffusion_timestep`]: the diffusion
//!   time scale.
//!
//! Sign convention: the Laplacian has positive off-diagonal weights and a
//! negative diagonal, so it is negative semi-definite and every row sums to zero.

use nalgebra::{DVector, Point3, Vector3};

use super::sparse::{from_triplets, SparseOperator};
use crate::error::{GeodesicError, Result};
use crate::mesh::{FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// How the Laplacian treats an edge with a face on only one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// The missing side contributes nothing; the edge weight is half the one
    /// interior cotangent. This is the natural (Neumann) boundary condition.
    #[default]
    OneSided,
    /// Refuse meshes with boundary edges.
    Reject,
}

/// Per-face geometry shared by the mass matrix, gradient, and divergence stages.
#[derive(Debug, Clone)]
pub struct FaceFrames {
    /// Triangle area from Heron's formula, indexed by face.
    pub areas: Vec<f64>,
    /// Unit normal following the face winding, indexed by face.
    pub normals: Vec<Vector3<f64>>,
}

impl FaceFrames {
    /// Compute areas and unit normals for every face.
    pub fn compute<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Self {
        let (areas, normals) = mesh
            .face_ids()
            .map(|f| {
                let [p0, p1, p2] = mesh.face_positions(f);
                (heron_area(&p0, &p1, &p2), mesh.face_normal(f))
            })
            .unzip();
        Self { areas, normals }
    }

    /// Area of face `f`.
    #[inline]
    pub fn area<I: MeshIndex>(&self, f: FaceId<I>) -> f64 {
        self.areas[f.index()]
    }

    /// Unit normal of face `f`.
    #[inline]
    pub fn normal<I: MeshIndex>(&self, f: FaceId<I>) -> Vector3<f64> {
        self.normals[f.index()]
    }
}

/// Triangle area from its three edge lengths.
///
/// Degenerate triangles give zero or, through rounding, NaN; callers check.
pub fn heron_area(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    let [a, b, c] = edge_lengths(p0, p1, p2);
    let s = (a + b + c) / 2.0;
    (s * (s - a) * (s - b) * (s - c)).sqrt()
}

fn edge_lengths(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> [f64; 3] {
    [(p1 - p0).norm(), (p2 - p0).norm(), (p2 - p1).norm()]
}

/// Cotangent of the angle between two vectors: `dot / |cross|`.
///
/// Not clamped; parallel vectors give an infinite or NaN result.
#[inline]
pub fn cotan(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b) / a.cross(b).norm()
}

/// Lumped mass matrix: one third of the incident face areas per vertex.
///
/// Returned as the diagonal of the operator.
pub fn build_mass_matrix<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, frames: &FaceFrames) -> DVector<f64> {
    DVector::from_iterator(
        mesh.num_vertices(),
        mesh.vertex_ids()
            .map(|v| mesh.vertex_faces(v).map(|f| frames.area(f)).sum::<f64>() / 3.0),
    )
}

/// Cotangent of the angle at the vertex opposite half-edge `he`, or `None` when
/// `he` is a boundary half-edge.
fn opposite_cotan<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> Option<f64> {
    let apex = mesh.opposite_vertex(he)?;
    let p = mesh.position(apex);
    let far = mesh.position(mesh.dest(he)) - p;
    let near = mesh.position(mesh.origin(he)) - p;
    Some(cotan(&far, &near))
}

/// Assemble the cotangent Laplacian.
///
/// For every vertex `vp` the one-ring is rotated once. Each outgoing edge
/// `(vp, vo)` receives `(cot α + cot β) / 2`, where α and β are the angles
/// opposite the edge in its left and right triangles. The diagonal is then set
/// to the negated row sum.
///
/// Degenerate triangles produce non-finite weights, which are left in place.
pub fn build_cotan_laplacian<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    boundary: BoundaryPolicy,
) -> Result<SparseOperator> {
    let n = mesh.num_vertices();
    let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(mesh.num_halfedges() + n);
    let mut diagonal = vec![0.0; n];

    for vp in mesh.vertex_ids() {
        for he in mesh.vertex_halfedges(vp) {
            let vo = mesh.dest(he);
            let twin = mesh.twin(he);

            let left = opposite_cotan(mesh, he);
            let right = opposite_cotan(mesh, twin);
            if boundary == BoundaryPolicy::Reject && (left.is_none() || right.is_none()) {
                return Err(boundary_error(vp, vo));
            }

            let weight = (left.unwrap_or(0.0) + right.unwrap_or(0.0)) / 2.0;
            triplets.push((vp.index(), vo.index(), weight));
            diagonal[vp.index()] -= weight;
        }
    }

    triplets.extend(diagonal.into_iter().enumerate().map(|(i, d)| (i, i, d)));
    Ok(from_triplets(n, triplets))
}

fn boundary_error<I: MeshIndex>(v0: VertexId<I>, v1: VertexId<I>) -> GeodesicError {
    GeodesicError::BoundaryEdge {
        v0: v0.index(),
        v1: v1.index(),
    }
}

/// Characteristic edge length: total semi-perimeter over `1.5 * face count`.
///
/// This is the mean edge length over face-edge incidences, so interior edges
/// count twice.
pub fn characteristic_edge_length<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> f64 {
    if mesh.num_faces() == 0 {
        return 0.0;
    }
    let semi_perimeters: f64 = mesh
        .face_ids()
        .map(|f| {
            let [p0, p1, p2] = mesh.face_positions(f);
            edge_lengths(&p0, &p1, &p2).iter().sum::<f64>() / 2.0
        })
        .sum();
    semi_perimeters / (1.5 * mesh.num_faces() as f64)
}

/// Diffusion time `m * h^2`.
#[inline]
pub fn diffusion_timestep(edge_length: f64, multiplier: f64) -> f64 {
    multiplier * edge_length * edge_length
}
