//! Small meshes shared by the unit tests.

use std::collections::HashMap;

use nalgebra::Point3;

use super::{build_from_triangles, HalfEdgeMesh};

/// Flat `n` x `n` grid of squares with side `spacing`, each split along the
/// same diagonal. Vertex `j * (n + 1) + i` sits at `(i, j) * spacing`.
pub fn grid(n: usize, spacing: f64) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Regular tetrahedron-like closed mesh with outward winding.
pub fn tetrahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, 1.0, 0.0),
        Point3::new(0.5, 0.5, 1.0),
    ];
    let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Unit octahedron: vertices on the coordinate axes, outward winding.
pub fn octahedron() -> HalfEdgeMesh {
    let (vertices, faces) = octahedron_lists();
    build_from_triangles(&vertices, &faces).unwrap()
}

fn octahedron_lists() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    (vertices, faces)
}

/// Unit sphere from an octahedron refined `levels` times by 1-to-4 splits,
/// with new vertices pushed onto the sphere.
pub fn sphere(levels: usize) -> HalfEdgeMesh {
    let (mut vertices, mut faces) = octahedron_lists();

    for _ in 0..levels {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut midpoint = |a: usize, b: usize, vertices: &mut Vec<Point3<f64>>| -> usize {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let m = nalgebra::center(&vertices[a], &vertices[b]);
                vertices.push(Point3::from(m.coords.normalize()));
                vertices.len() - 1
            })
        };

        let mut refined = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            refined.push([a, ab, ca]);
            refined.push([ab, b, bc]);
            refined.push([ca, bc, c]);
            refined.push([ab, bc, ca]);
        }
        faces = refined;
    }

    build_from_triangles(&vertices, &faces).unwrap()
}
