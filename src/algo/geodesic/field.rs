//! Vector fields on the mesh: gradient, normalization, and divergence.
//!
//! Two discretizations are supported, chosen with [`GradientScheme`]:
//!
//! - [`GradientScheme::PerFace`]: the gradient of the piecewise-linear heat
//!   function is constant on each triangle, `∇u = 1/(2A) Σ uᵢ (N × eᵢ)`. The
//!   divergence integrates the per-face field over each vertex's dual cell.
//! - [`GradientScheme::VertexLumped`]: a simplified construction that builds one
//!   vector per vertex from that vertex's own heat value only, and samples that
//!   vector in every incident face when taking the divergence. It does not
//!   converge to the true gradient; it is kept so results can be reproduced
//!   against tools that use it.
//!
//! In both cases `eᵢ` is the edge opposite local corner `i`, oriented
//! counter-clockwise: `e₀ = p₂ - p₁`, `e₁ = p₀ - p₂`, `e₂ = p₁ - p₀`.

use nalgebra::{DVector, Point3, Vector3};

use super::operators::{cotan, FaceFrames};
use crate::mesh::{Corner, HalfEdgeMesh, MeshIndex, VertexId};

/// Discretization of the gradient and divergence stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientScheme {
    /// One gradient per triangle from all three corner values.
    #[default]
    PerFace,
    /// One vector per vertex from the vertex's own heat value.
    VertexLumped,
}

/// Where the vectors of a [`VectorField`] live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSupport {
    /// One vector per vertex.
    Vertices,
    /// One vector per face.
    Faces,
}

/// A dense field of 3D vectors on vertices or faces.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    support: FieldSupport,
    vectors: Vec<Vector3<f64>>,
}

impl VectorField {
    /// Wrap a list of vectors.
    pub fn new(support: FieldSupport, vectors: Vec<Vector3<f64>>) -> Self {
        Self { support, vectors }
    }

    /// The elements the vectors are attached to.
    #[inline]
    pub fn support(&self) -> FieldSupport {
        self.support
    }

    /// All vectors, indexed by vertex or face.
    #[inline]
    pub fn vectors(&self) -> &[Vector3<f64>] {
        &self.vectors
    }

    /// Number of vectors.
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the field is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// The vector seen by corner `corner` of vertex `v`.
    #[inline]
    fn at_corner<I: MeshIndex>(&self, v: VertexId<I>, corner: &Corner<I>) -> Vector3<f64> {
        match self.support {
            FieldSupport::Vertices => self.vectors[v.index()],
            FieldSupport::Faces => self.vectors[corner.face.index()],
        }
    }
}

/// Edge opposite local corner `local`, counter-clockwise.
#[inline]
fn opposite_edge(p: &[Point3<f64>; 3], local: usize) -> Vector3<f64> {
    p[(local + 2) % 3] - p[(local + 1) % 3]
}

/// Gradient of the heat field.
pub fn compute_gradient<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    frames: &FaceFrames,
    heat: &DVector<f64>,
    scheme: GradientScheme,
) -> VectorField {
    match scheme {
        GradientScheme::PerFace => face_gradient(mesh, frames, heat),
        GradientScheme::VertexLumped => vertex_lumped_gradient(mesh, frames, heat),
    }
}

fn face_gradient<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    frames: &FaceFrames,
    heat: &DVector<f64>,
) -> VectorField {
    let vectors: Vec<Vector3<f64>> = mesh
        .face_ids()
        .map(|f| {
            let tri = mesh.face_triangle(f);
            let p = mesh.face_positions(f);
            let n = frames.normal(f);
            let sum: Vector3<f64> = (0..3)
                .map(|i| heat[tri[i].index()] * n.cross(&opposite_edge(&p, i)))
                .sum();
            sum / (2.0 * frames.area(f))
        })
        .collect();
    VectorField::new(FieldSupport::Faces, vectors)
}

fn vertex_lumped_gradient<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    frames: &FaceFrames,
    heat: &DVector<f64>,
) -> VectorField {
    let vectors: Vec<Vector3<f64>> = mesh
        .vertex_ids()
        .map(|v| {
            let u = heat[v.index()];
            mesh.vertex_corners(v)
                .map(|c| {
                    let p = mesh.face_positions(c.face);
                    let e = opposite_edge(&p, c.local).normalize();
                    let g = frames.normal(c.face).cross(&e);
                    g * (u / (2.0 * frames.area(c.face)))
                })
                .sum::<Vector3<f64>>()
        })
        .collect();
    VectorField::new(FieldSupport::Vertices, vectors)
}

/// Negate and normalize: `X = -g / |g|`.
///
/// Zero vectors become NaN; the divergence stage deals with them.
pub fn normalize_field(gradient: &VectorField) -> VectorField {
    let vectors = gradient.vectors.iter().map(|g| -g / g.norm()).collect();
    VectorField::new(gradient.support, vectors)
}

/// Integrated divergence of `field` at every vertex.
///
/// Non-finite results are replaced with zero before returning, so a few
/// degenerate elements do not poison the Poisson solve. The number of replaced
/// entries is returned alongside the field.
pub fn compute_divergence<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    field: &VectorField,
    scheme: GradientScheme,
) -> (DVector<f64>, usize) {
    let mut divergence = DVector::from_iterator(
        mesh.num_vertices(),
        mesh.vertex_ids().map(|v| {
            mesh.vertex_corners(v)
                .map(|c| {
                    let p = mesh.face_positions(c.face);
                    let x = field.at_corner(v, &c);
                    match scheme {
                        GradientScheme::PerFace => corner_divergence(&p, c.local, &x),
                        GradientScheme::VertexLumped => lumped_corner_divergence(&p, c.local, &x),
                    }
                })
                .sum::<f64>()
        }),
    );

    let mut replaced = 0;
    for d in divergence.iter_mut().filter(|d| !d.is_finite()) {
        *d = 0.0;
        replaced += 1;
    }
    (divergence, replaced)
}

/// `½ (cot θⱼ (eᵢₖ·X) + cot θₖ (eᵢⱼ·X))` for corner `i` with neighbors `j`, `k`:
/// each edge leaving the corner is weighted by the cotangent of the angle
/// opposite it.
fn corner_divergence(p: &[Point3<f64>; 3], i: usize, x: &Vector3<f64>) -> f64 {
    let j = (i + 1) % 3;
    let k = (i + 2) % 3;
    let e_ij = p[j] - p[i];
    let e_ik = p[k] - p[i];
    let cot_j = cotan(&(p[i] - p[j]), &(p[k] - p[j]));
    let cot_k = cotan(&(p[i] - p[k]), &(p[j] - p[k]));
    0.5 * (cot_k * e_ij.dot(x) + cot_j * e_ik.dot(x))
}

/// Corner term of the vertex-lumped scheme: cotangents of each adjacent edge
/// against the opposite edge, paired with the unit edges crosswise. The edge
/// directions per corner are fixed, including the flipped opposite edge of
/// corner 1.
fn lumped_corner_divergence(p: &[Point3<f64>; 3], i: usize, x: &Vector3<f64>) -> f64 {
    let [p0, p1, p2] = p;
    let (el, er, eo) = match i {
        0 => (p2 - p0, p1 - p0, p1 - p2),
        1 => (p0 - p1, p2 - p1, p0 - p2),
        _ => (p1 - p2, p0 - p2, p0 - p1),
    };
    let cot_l = cotan(&el, &eo);
    let cot_r = cotan(&er, &eo);
    0.5 * (cot_l * er.normalize().dot(x) + cot_r * el.normalize().dot(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::geodesic::operators::{build_cotan_laplacian, BoundaryPolicy};
    use crate::mesh::fixtures::{grid, sphere};

    fn linear_heat<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, a: Vector3<f64>) -> DVector<f64> {
        DVector::from_iterator(
            mesh.num_vertices(),
            mesh.vertex_ids().map(|v| a.dot(&mesh.position(v).coords)),
        )
    }

    #[test]
    fn test_face_gradient_of_linear_function_is_exact() {
        let mesh = grid(3, 0.5);
        let frames = FaceFrames::compute(&mesh);
        let a = Vector3::new(2.0, -1.0, 0.0);
        let g = compute_gradient(&mesh, &frames, &linear_heat(&mesh, a), GradientScheme::PerFace);

        assert_eq!(g.support(), FieldSupport::Faces);
        assert_eq!(g.len(), mesh.num_faces());
        for v in g.vectors() {
            assert!((v - a).norm() < 1e-10);
        }
    }

    #[test]
    fn test_vertex_lumped_gradient_support() {
        let mesh = sphere(1);
        let frames = FaceFrames::compute(&mesh);
        let heat = DVector::from_element(mesh.num_vertices(), 1.0);
        let g = compute_gradient(&mesh, &frames, &heat, GradientScheme::VertexLumped);
        assert_eq!(g.support(), FieldSupport::Vertices);
        assert_eq!(g.len(), mesh.num_vertices());
        assert!(g.vectors().iter().all(|v| v.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn test_vertex_lumped_gradient_single_face() {
        // Unit square split along 0-3, heat 1 at vertex 1 only.
        let mesh = grid(1, 1.0);
        let frames = FaceFrames::compute(&mesh);
        let mut heat = DVector::zeros(mesh.num_vertices());
        heat[1] = 1.0;
        let g = compute_gradient(&mesh, &frames, &heat, GradientScheme::VertexLumped);

        // Vertex 1 is in face [0, 1, 3] only, at local corner 1. The opposite
        // edge is p0 - p3 = (-1, -1, 0); rotated about +z it becomes (1, -1, 0).
        let expected = Vector3::new(1.0, -1.0, 0.0) / 2.0_f64.sqrt() * (1.0 / (2.0 * 0.5));
        assert!((g.vectors()[1] - expected).norm() < 1e-12);
        assert_eq!(g.vectors()[0], Vector3::zeros());
    }

    #[test]
    fn test_lumped_divergence_corner_terms() {
        // Right triangle p0 = origin, p1 = +x, p2 = +y.
        //   corner 0: cot_l = -1, cot_r = 1
        //   corner 1: cot_l = 0, cot_r = -1 (opposite edge p0 - p2)
        //   corner 2: cot_l = -1, cot_r = 0
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh =
            crate::mesh::build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        let along = |x: Vector3<f64>| {
            let field = VectorField::new(FieldSupport::Vertices, vec![x; 3]);
            compute_divergence(&mesh, &field, GradientScheme::VertexLumped).0
        };

        let div_x = along(Vector3::x());
        let expected_x = [-0.5, 0.5, 0.0];
        for (d, e) in div_x.iter().zip(expected_x) {
            assert!((d - e).abs() < 1e-12, "{:?}", div_x);
        }

        let div_y = along(Vector3::y());
        let expected_y = [0.5, 0.0, 0.5];
        for (d, e) in div_y.iter().zip(expected_y) {
            assert!((d - e).abs() < 1e-12, "{:?}", div_y);
        }

        // Direct corner terms agree with the assembled field
        let p = mesh.face_positions(crate::mesh::FaceId::<u32>::new(0));
        for (i, e) in expected_x.iter().enumerate() {
            assert!((lumped_corner_divergence(&p, i, &Vector3::x()) - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalize_negates_and_scales() {
        let field = VectorField::new(
            FieldSupport::Faces,
            vec![Vector3::new(3.0, 4.0, 0.0), Vector3::zeros()],
        );
        let x = normalize_field(&field);
        assert!((x.vectors()[0] - Vector3::new(-0.6, -0.8, 0.0)).norm() < 1e-12);
        assert!(x.vectors()[1].iter().all(|c| c.is_nan()));
    }

    #[test]
    fn test_divergence_of_gradient_matches_laplacian() {
        // For a linear function the per-face divergence of its gradient equals
        // the cotangent Laplacian applied to it.
        let mesh = grid(3, 1.0);
        let frames = FaceFrames::compute(&mesh);
        let heat = linear_heat(&mesh, Vector3::new(1.0, 2.0, 0.0));
        let g = compute_gradient(&mesh, &frames, &heat, GradientScheme::PerFace);
        let (div, replaced) = compute_divergence(&mesh, &g, GradientScheme::PerFace);
        assert_eq!(replaced, 0);

        let l = build_cotan_laplacian(&mesh, BoundaryPolicy::OneSided).unwrap();
        let mut lu = DVector::zeros(mesh.num_vertices());
        for (row, col, &w) in l.triplet_iter() {
            lu[row] += w * heat[col];
        }
        assert!((div - lu).norm() < 1e-10);
    }

    #[test]
    fn test_divergence_of_constant_field_sums_to_zero() {
        let mesh = sphere(2);
        let field = VectorField::new(
            FieldSupport::Faces,
            vec![Vector3::new(0.3, -0.2, 0.9); mesh.num_faces()],
        );
        let (div, _) = compute_divergence(&mesh, &field, GradientScheme::PerFace);
        assert!(div.sum().abs() < 1e-10);
    }

    #[test]
    fn test_divergence_sanitizes_nan() {
        let mesh = sphere(1);
        let mut vectors = vec![Vector3::new(1.0, 0.0, 0.0); mesh.num_faces()];
        vectors[0] = Vector3::new(f64::NAN, f64::NAN, f64::NAN);
        let field = VectorField::new(FieldSupport::Faces, vectors);

        let (div, replaced) = compute_divergence(&mesh, &field, GradientScheme::PerFace);
        // The three corners of face 0 were poisoned
        assert_eq!(replaced, 3);
        assert!(div.iter().all(|d| d.is_finite()));
        for v in mesh.face_triangle(crate::mesh::FaceId::<u32>::new(0)) {
            assert_eq!(div[v.index()], 0.0);
        }
    }
}
