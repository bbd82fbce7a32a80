//! Mesh construction from face-vertex lists.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{GeodesicError, Result};

/// Build a half-edge mesh from vertex positions and triangles.
///
/// Faces must be consistently oriented: every interior edge must appear once in
/// each direction. An edge seen twice in the same direction is reported as
/// [`GeodesicError::NonManifoldEdge`]. Edges seen in only one direction become
/// boundary edges.
///
/// # Example
/// ```
/// use heatgeo::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(GeodesicError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(GeodesicError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(GeodesicError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    for &pos in vertices {
        mesh.add_vertex(pos);
    }

    // Directed edge (v0, v1) -> half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> =
        HashMap::with_capacity(faces.len() * 3);

    for (fi, face) in faces.iter().enumerate() {
        let face_id = FaceId::<I>::new(fi);
        let base = mesh.num_halfedges();
        let ids = [0, 1, 2].map(|k| HalfEdgeId::<I>::new(base + k));

        mesh.faces.push(Face { halfedge: ids[0] });

        for k in 0..3 {
            let origin = VertexId::new(face[k]);
            mesh.halfedges.push(HalfEdge {
                origin,
                twin: HalfEdgeId::invalid(),
                next: ids[(k + 1) % 3],
                prev: ids[(k + 2) % 3],
                face: face_id,
            });
            mesh.vertex_mut(origin).halfedge = ids[k];

            let key = (face[k], face[(k + 1) % 3]);
            if edge_map.insert(key, ids[k]).is_some() {
                return Err(GeodesicError::NonManifoldEdge {
                    v0: key.0,
                    v1: key.1,
                });
            }
        }
    }

    link_twins(&mut mesh, &edge_map);
    link_boundary_loops(&mut mesh)?;
    anchor_boundary_vertices(&mut mesh);
    check_vertex_fans(&mesh, faces)?;

    Ok(mesh)
}

/// Pair up opposite half-edges, creating boundary half-edges where a
/// direction is missing.
fn link_twins<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    edge_map: &HashMap<(usize, usize), HalfEdgeId<I>>,
) {
    // Sorted so boundary half-edge ids do not depend on hash order.
    let mut edges: Vec<_> = edge_map.iter().map(|(&k, &he)| (k, he)).collect();
    edges.sort_unstable_by_key(|&(k, _)| k);

    for ((v0, v1), he) in edges {
        if let Some(&twin) = edge_map.get(&(v1, v0)) {
            mesh.halfedge_mut(he).twin = twin;
        } else {
            let boundary = HalfEdgeId::<I>::new(mesh.num_halfedges());
            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(v1),
                twin: he,
                ..HalfEdge::new()
            });
            mesh.halfedge_mut(he).twin = boundary;
        }
    }
}

/// Link boundary half-edges into loops via `next`/`prev`.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let boundary: Vec<HalfEdgeId<I>> = mesh.boundary_halfedges().collect();

    let mut outgoing: HashMap<usize, HalfEdgeId<I>> = HashMap::with_capacity(boundary.len());
    for &he in &boundary {
        let origin = mesh.origin(he).index();
        if outgoing.insert(origin, he).is_some() {
            // Two boundary fans meet at this vertex
            return Err(GeodesicError::NonManifoldVertex { vertex: origin });
        }
    }

    for &he in &boundary {
        if let Some(&next) = outgoing.get(&mesh.dest(he).index()) {
            mesh.halfedge_mut(he).next = next;
            mesh.halfedge_mut(next).prev = he;
        }
    }

    Ok(())
}

/// Point boundary vertices at their outgoing boundary half-edge so one-ring
/// rotation starts at the edge of the fan.
fn anchor_boundary_vertices<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let anchors: Vec<(VertexId<I>, HalfEdgeId<I>)> = mesh
        .boundary_halfedges()
        .map(|he| (mesh.origin(he), he))
        .collect();
    for (v, he) in anchors {
        mesh.vertex_mut(v).halfedge = he;
    }
}

/// Every face touching a vertex must be reachable by rotating around it.
/// Surfaces that meet at a single vertex leave part of the fan unvisited.
fn check_vertex_fans<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, faces: &[[usize; 3]]) -> Result<()> {
    let mut incident = vec![0usize; mesh.num_vertices()];
    for face in faces {
        for &vi in face {
            incident[vi] += 1;
        }
    }

    for v in mesh.vertex_ids() {
        if mesh.vertex_faces(v).count() != incident[v.index()] {
            return Err(GeodesicError::NonManifoldVertex { vertex: v.index() });
        }
    }
    Ok(())
}

/// Convert a half-edge mesh back to positions and vertex-index triangles.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_triangle(f).map(|v| v.index()))
        .collect();
    (vertices, faces)
}
