//! Half-edge mesh.
//!
//! Each undirected edge is stored as two opposite half-edges. A half-edge knows
//! its origin, its twin, the next and previous half-edges of its face, and the
//! face itself. Every vertex stores one outgoing half-edge and every face one
//! half-edge of its boundary.
//!
//! Edges on an open boundary get an extra half-edge with an invalid face, linked
//! into boundary loops. Boundary vertices always point at their outgoing boundary
//! half-edge, so rotating around a vertex from its stored half-edge visits the
//! whole fan in angular order.

use nalgebra::{Point3, Vector3};

use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A vertex position plus one outgoing half-edge.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// Position in space.
    pub position: Point3<f64>,

    /// One outgoing half-edge; invalid for isolated vertices.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create an unconnected vertex at `position`.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A directed edge.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge leaves.
    pub origin: VertexId<I>,

    /// The opposite half-edge.
    pub twin: HalfEdgeId<I>,

    /// The next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face.
    pub prev: HalfEdgeId<I>,

    /// The face on the left; invalid on a boundary.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// An unlinked half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Whether this half-edge lies outside the surface.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A triangular face.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// The half-edge leaving the face's corner 0.
    pub halfedge: HalfEdgeId<I>,
}

/// One corner of a face: the face plus the local position (0, 1 or 2) of a
/// vertex within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner<I: MeshIndex = u32> {
    /// The face.
    pub face: FaceId<I>,
    /// Local index of the vertex inside `face`.
    pub local: usize,
}

/// Triangle mesh with half-edge connectivity.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Closed meshes need exactly 3F half-edges; leave a little room for boundary.
        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_faces * 3 + num_faces / 2),
            faces: Vec::with_capacity(num_faces),
        }
    }

    // ==================== Accessors ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of half-edges, boundary half-edges included.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    // ==================== Topology Queries ====================

    /// Opposite half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Origin vertex.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Destination vertex.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Face on the left of a half-edge (invalid on a boundary).
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// The vertex of `face_of(he)` that is not on `he`, or `None` on a boundary.
    #[inline]
    pub fn opposite_vertex(&self, he: HalfEdgeId<I>) -> Option<VertexId<I>> {
        if self.is_boundary_halfedge(he) {
            None
        } else {
            Some(self.origin(self.prev(he)))
        }
    }

    /// Whether a half-edge is outside the surface.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Whether a vertex lies on an open boundary. Isolated vertices count as boundary.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        if !self.vertex(v).halfedge.is_valid() {
            return true;
        }
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_halfedge(he))
    }

    /// Whether a vertex has no incident face.
    #[inline]
    pub fn is_isolated_vertex(&self, v: VertexId<I>) -> bool {
        !self.vertex(v).halfedge.is_valid()
    }

    /// Iterate over all boundary half-edges.
    pub fn boundary_halfedges(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedge_ids()
            .filter(move |&he| self.is_boundary_halfedge(he))
    }

    /// Whether every edge has a face on both sides.
    pub fn is_closed(&self) -> bool {
        self.boundary_halfedges().next().is_none()
    }

    // ==================== Iteration ====================

    /// All vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// All half-edge ids.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// All face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Outgoing half-edges of a vertex, in angular order around its one-ring.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Vertices adjacent to `v`.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Faces incident to `v`.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Corners of the faces incident to `v`: each incident face together with
    /// the local index of `v` inside it.
    pub fn vertex_corners(&self, v: VertexId<I>) -> impl Iterator<Item = Corner<I>> + '_ {
        self.vertex_faces(v).filter_map(move |f| {
            self.face_triangle(f)
                .iter()
                .position(|&fv| fv == v)
                .map(|local| Corner { face: f, local })
        })
    }

    /// The three faces across the edges of `f`, in the order of the face's
    /// half-edges (edge 0-1, 1-2, 2-0). `None` where the edge is on a boundary.
    pub fn face_neighbors(&self, f: FaceId<I>) -> [Option<FaceId<I>>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [he0, he1, he2].map(|he| {
            let other = self.face_of(self.twin(he));
            other.is_valid().then_some(other)
        })
    }

    /// The three vertices of a face, in winding order.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Positions of the three vertices of a face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        self.face_triangle(f).map(|v| *self.position(v))
    }

    // ==================== Geometry ====================

    /// Unit normal of a face, following the winding order.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }

    /// Area of a face (cross-product form).
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Number of edges incident to `v`.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let (min, max) = self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                lo.coords.inf(&v.position.coords).into(),
                hi.coords.sup(&v.position.coords).into(),
            )
        });
        Some((min, max))
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Construction ====================

    pub(crate) fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    // ==================== Validation ====================

    /// Check that all connectivity links are mutually consistent.
    pub fn is_valid(&self) -> bool {
        let vertices_ok = self.vertex_ids().all(|v| {
            let he = self.vertex(v).halfedge;
            !he.is_valid() || self.origin(he) == v
        });

        let halfedges_ok = self.halfedge_ids().all(|id| {
            let he = self.halfedge(id);
            (!he.twin.is_valid() || self.twin(he.twin) == id)
                && (!he.next.is_valid() || self.prev(he.next) == id)
                && (!he.prev.is_valid() || self.next(he.prev) == id)
        });

        let faces_ok = self.faces.iter().all(|f| f.halfedge.is_valid());

        vertices_ok && halfedges_ok && faces_ok
    }
}

/// Iterator over the outgoing half-edges of a vertex.
///
/// Rotates with `next(twin(he))`, which moves to the following outgoing half-edge
/// of the same vertex, and stops when it returns to the starting half-edge.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<I: MeshIndex> Iterator for VertexHalfEdgeIter<'_, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.mesh.twin(self.current));

        if self.current == self.start || !self.current.is_valid() {
            self.done = true;
        }

        Some(result)
    }
}
