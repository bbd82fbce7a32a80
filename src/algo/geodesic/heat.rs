//! Heat method for geodesic distances.
//!
//! Computes geodesic distances using the heat method (Crane et al. 2013):
//! diffuse heat from the sources for a short time, take the direction in which
//! heat decreases, and recover the scalar function whose gradient best matches
//! that direction with a Poisson solve.
//!
//! The returned field is defined up to a global additive constant. Use
//! [`GeodesicResult::shifted_to_min`] or [`GeodesicResult::relative_to`] to anchor it.

use nalgebra::DVector;

use super::field::{
    compute_divergence, compute_gradient, normalize_field, GradientScheme, VectorField,
};
use super::operators::{
    build_cotan_laplacian, build_mass_matrix, characteristic_edge_length, diffusion_timestep,
    BoundaryPolicy, FaceFrames,
};
use super::sparse::{
    diagonal_plus_scaled, ensure_finite, non_finite_entries, SparseOperator, SpdSolver,
};
use super::GeodesicResult;
use crate::error::{GeodesicError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Options for the heat method geodesic distance computation.
#[derive(Debug, Clone)]
pub struct HeatMethodOptions {
    /// Multiplier `m` in the diffusion time `t = m * h^2`, where `h` is the
    /// characteristic edge length of the mesh.
    pub timestep_multiplier: f64,

    /// Explicit diffusion time. Overrides `timestep_multiplier` when set.
    pub time_step: Option<f64>,

    /// Diagonal shift `ε` added to the Poisson system to make it positive definite.
    pub regularization: f64,

    /// Discretization of the gradient and divergence.
    pub gradient_scheme: GradientScheme,

    /// Treatment of boundary edges when building the Laplacian.
    pub boundary_policy: BoundaryPolicy,

    /// Dump every intermediate operator and field at `trace` level.
    pub verbose: bool,
}

impl Default for HeatMethodOptions {
    fn default() -> Self {
        Self {
            timestep_multiplier: 1.0,
            time_step: None,
            regularization: 1e-6,
            gradient_scheme: GradientScheme::default(),
            boundary_policy: BoundaryPolicy::default(),
            verbose: false,
        }
    }
}

impl HeatMethodOptions {
    /// Set the timestep multiplier.
    pub fn with_timestep_multiplier(mut self, m: f64) -> Self {
        self.timestep_multiplier = m;
        self
    }

    /// Set custom time step (overrides the multiplier).
    pub fn with_time_step(mut self, t: f64) -> Self {
        self.time_step = Some(t);
        self
    }

    /// Set the Poisson regularization.
    pub fn with_regularization(mut self, eps: f64) -> Self {
        self.regularization = eps;
        self
    }

    /// Set the gradient scheme.
    pub fn with_gradient_scheme(mut self, scheme: GradientScheme) -> Self {
        self.gradient_scheme = scheme;
        self
    }

    /// Set the boundary policy.
    pub fn with_boundary_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.boundary_policy = policy;
        self
    }

    /// Enable or disable intermediate dumps.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check that every numeric parameter is finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.timestep_multiplier.is_finite() && self.timestep_multiplier > 0.0) {
            return Err(GeodesicError::invalid_param(
                "timestep_multiplier",
                self.timestep_multiplier,
                "must be finite and positive",
            ));
        }
        if let Some(t) = self.time_step {
            if !(t.is_finite() && t > 0.0) {
                return Err(GeodesicError::invalid_param(
                    "time_step",
                    t,
                    "must be finite and positive",
                ));
            }
        }
        if !(self.regularization.is_finite() && self.regularization > 0.0) {
            return Err(GeodesicError::invalid_param(
                "regularization",
                self.regularization,
                "must be finite and positive",
            ));
        }
        Ok(())
    }

    /// Diffusion time for a mesh with characteristic edge length `h`.
    pub fn timestep(&self, h: f64) -> f64 {
        self.time_step
            .unwrap_or_else(|| diffusion_timestep(h, self.timestep_multiplier))
    }
}

/// Build an initial heat distribution: 1 at every source, 0 elsewhere.
pub fn initial_condition<I: MeshIndex>(n: usize, sources: &[VertexId<I>]) -> Result<DVector<f64>> {
    let mut u0 = DVector::zeros(n);
    for &s in sources {
        if s.index() >= n {
            return Err(GeodesicError::SourceOutOfRange {
                vertex: s.index(),
                num_vertices: n,
            });
        }
        u0[s.index()] = 1.0;
    }
    Ok(u0)
}

/// Compute the geodesic distance field for an initial heat distribution.
///
/// `initial` has one value per vertex; sources are typically 1 and every other
/// vertex 0. The result has one value per vertex and is correct up to an
/// additive constant.
///
/// # Errors
///
/// - [`GeodesicError::InvalidParameter`] if the options do not validate.
/// - [`GeodesicError::InitialConditionLength`] if `initial` has the wrong length.
/// - [`GeodesicError::IsolatedVertex`] if a vertex has no incident face.
/// - [`GeodesicError::BoundaryEdge`] under [`BoundaryPolicy::Reject`] on an open mesh.
/// - [`GeodesicError::NonFinite`] if degenerate triangles break an operator.
/// - [`GeodesicError::NotPositiveDefinite`] if a factorization fails.
pub fn heat_geodesic<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    initial: &DVector<f64>,
    options: &HeatMethodOptions,
) -> Result<DVector<f64>> {
    options.validate()?;

    let n = mesh.num_vertices();
    if initial.len() != n {
        return Err(GeodesicError::InitialConditionLength {
            expected: n,
            actual: initial.len(),
        });
    }
    if mesh.num_faces() == 0 {
        return Err(GeodesicError::EmptyMesh);
    }
    check_topology(mesh, options.boundary_policy)?;

    let frames = FaceFrames::compute(mesh);
    let mass = build_mass_matrix(mesh, &frames);
    ensure_finite("mass matrix", mass.as_slice())?;

    let laplacian = build_cotan_laplacian(mesh, options.boundary_policy)?;
    if let Some((count, first)) = non_finite_entries(&laplacian) {
        return Err(GeodesicError::NonFinite {
            stage: "cotangent Laplacian",
            count,
            first,
        });
    }
    log::debug!(
        "operators: {} vertices, {} faces, {} Laplacian non-zeros",
        n,
        mesh.num_faces(),
        laplacian.nnz()
    );

    let h = characteristic_edge_length(mesh);
    let t = options.timestep(h);
    log::debug!("edge scale h = {:.6e}, timestep t = {:.6e}", h, t);

    if options.verbose {
        dump_vector("face areas", &DVector::from_column_slice(&frames.areas));
        dump_vector("mass", &mass);
        dump_operator("laplacian", &laplacian);
        dump_vector("initial condition", initial);
    }

    // (M - tL) u = u0
    let heat_op = diagonal_plus_scaled(&mass, -t, &laplacian);
    let heat = SpdSolver::factor(&heat_op, "heat flow")?.solve(initial)?;
    log::debug!("heat flow solved");

    let gradient = compute_gradient(mesh, &frames, &heat, options.gradient_scheme);
    let direction = normalize_field(&gradient);
    let (mut divergence, replaced) =
        compute_divergence(mesh, &direction, options.gradient_scheme);
    if replaced > 0 {
        log::warn!(
            "divergence: replaced {} non-finite entries of {} with zero",
            replaced,
            n
        );
    }

    if options.verbose {
        dump_vector("heat", &heat);
        dump_field("gradient", &gradient);
        dump_field("normalized field", &direction);
        dump_vector("divergence", &divergence);
    }

    // The constant part of div X is outside the range of L. Left in, eps turns it
    // into a -mean/eps offset on the whole field.
    let mean = divergence.mean();
    divergence.add_scalar_mut(-mean);
    log::debug!("divergence mean {:.6e} removed", mean);

    // L phi = div X, solved as (-L + eps I) phi = -div X.
    let shift = DVector::from_element(n, options.regularization);
    let poisson_op = diagonal_plus_scaled(&shift, -1.0, &laplacian);
    let phi = SpdSolver::factor(&poisson_op, "poisson")?.solve(&-divergence)?;
    log::debug!("poisson solved");

    if options.verbose {
        dump_vector("distance", &phi);
    }

    Ok(phi)
}

/// [`heat_geodesic`] with intermediate dumps enabled regardless of `options.verbose`.
///
/// The dumps go to the `log` facade at `trace` level.
pub fn heat_geodesic_verbose<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    initial: &DVector<f64>,
    options: &HeatMethodOptions,
) -> Result<DVector<f64>> {
    let options = options.clone().with_verbose(true);
    heat_geodesic(mesh, initial, &options)
}

/// Compute geodesic distances from a single source vertex.
///
/// # Example
///
/// ```no_run
/// use heatgeo::prelude::*;
/// use heatgeo::algo::geodesic::{heat_method, HeatMethodOptions};
///
/// let mesh: HalfEdgeMesh = heatgeo::io::load("mesh.ply").unwrap();
/// let source = VertexId::new(0);
///
/// let result = heat_method(&mesh, source, &HeatMethodOptions::default()).unwrap();
/// let anchored = result.shifted_to_min();
/// println!("Distance to vertex 10: {}", anchored.distance(VertexId::new(10)));
/// ```
pub fn heat_method<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    options: &HeatMethodOptions,
) -> Result<GeodesicResult<I>> {
    heat_method_multiple(mesh, &[source], options)
}

/// Compute geodesic distances from the nearest of several source vertices.
///
/// # Example
///
/// ```no_run
/// use heatgeo::prelude::*;
/// use heatgeo::algo::geodesic::{heat_method_multiple, HeatMethodOptions};
///
/// let mesh: HalfEdgeMesh = heatgeo::io::load("mesh.ply").unwrap();
/// let sources = vec![VertexId::new(0), VertexId::new(10), VertexId::new(20)];
///
/// let result = heat_method_multiple(&mesh, &sources, &HeatMethodOptions::default()).unwrap();
/// ```
pub fn heat_method_multiple<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    sources: &[VertexId<I>],
    options: &HeatMethodOptions,
) -> Result<GeodesicResult<I>> {
    if sources.is_empty() {
        return Err(GeodesicError::invalid_param(
            "sources",
            "[]",
            "at least one source vertex is required",
        ));
    }
    let u0 = initial_condition(mesh.num_vertices(), sources)?;
    let phi = heat_geodesic(mesh, &u0, options)?;
    Ok(GeodesicResult::new(phi))
}

fn check_topology<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, policy: BoundaryPolicy) -> Result<()> {
    if let Some(v) = mesh.vertex_ids().find(|&v| mesh.is_isolated_vertex(v)) {
        return Err(GeodesicError::IsolatedVertex { vertex: v.index() });
    }
    if policy == BoundaryPolicy::Reject {
        if let Some(he) = mesh.boundary_halfedges().next() {
            return Err(GeodesicError::BoundaryEdge {
                v0: mesh.origin(he).index(),
                v1: mesh.dest(he).index(),
            });
        }
    }
    Ok(())
}

fn dump_vector(name: &str, values: &DVector<f64>) {
    log::trace!("{} ({} values)", name, values.len());
    for (i, v) in values.iter().enumerate() {
        log::trace!("  {}[{}] = {:.12e}", name, i, v);
    }
}

fn dump_field(name: &str, field: &VectorField) {
    log::trace!("{} ({} vectors on {:?})", name, field.len(), field.support());
    for (i, v) in field.vectors().iter().enumerate() {
        log::trace!("  {}[{}] = ({:.12e}, {:.12e}, {:.12e})", name, i, v.x, v.y, v.z);
    }
}

fn dump_operator(name: &str, op: &SparseOperator) {
    log::trace!("{} ({}x{}, {} non-zeros)", name, op.nrows(), op.ncols(), op.nnz());
    for (row, col, value) in op.triplet_iter() {
        log::trace!("  {}({}, {}) = {:.12e}", name, row, col, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mesh::build_from_triangles;
    use crate::mesh::fixtures::{grid, sphere};
    use nalgebra::Point3;

    fn corner_distances(n: usize) -> GeodesicResult {
        let mesh = grid(n, 1.0);
        heat_method(&mesh, VertexId::new(0), &HeatMethodOptions::default())
            .unwrap()
            .shifted_to_min()
    }

    #[test]
    fn test_grid_distance_increases_from_corner() {
        let n = 8;
        let result = corner_distances(n);
        let at = |i: usize, j: usize| result.distance(VertexId::new(j * (n + 1) + i));

        for k in 0..n {
            assert!(at(k, 0) < at(k + 1, 0), "row not monotonic at {}", k);
            assert!(at(0, k) < at(0, k + 1), "column not monotonic at {}", k);
            assert!(at(k, k) < at(k + 1, k + 1), "diagonal not monotonic at {}", k);
        }
    }

    #[test]
    fn test_grid_far_corner_close_to_euclidean() {
        let n = 8;
        let result = corner_distances(n);
        let far = result.distance(VertexId::new((n + 1) * (n + 1) - 1));
        let exact = (2.0 * (n * n) as f64).sqrt();
        assert!(
            ((far - exact) / exact).abs() < 0.3,
            "far corner at {}, expected about {}",
            far,
            exact
        );
    }

    #[test]
    fn test_source_attains_minimum() {
        let mesh = grid(6, 0.5);
        let source = VertexId::new(10);
        let result = heat_method(&mesh, source, &HeatMethodOptions::default()).unwrap();

        let range = result.max() - result.min();
        assert!(range > 0.0);
        assert!(result.distance(source) - result.min() <= 1e-3 * range);
    }

    #[test]
    fn test_deterministic() {
        let mesh = sphere(2);
        let options = HeatMethodOptions::default();
        let a = heat_method(&mesh, VertexId::new(4), &options).unwrap();
        let b = heat_method(&mesh, VertexId::new(4), &options).unwrap();
        assert_eq!(a.distances(), b.distances());
    }

    #[test]
    fn test_sphere_symmetry() {
        let mesh = sphere(3);
        let result = heat_method(&mesh, VertexId::new(4), &HeatMethodOptions::default())
            .unwrap()
            .shifted_to_min();

        // Vertices 0..4 lie on the equator, 5 is the antipode of the source.
        let equator: Vec<f64> = (0..4).map(|i| result.distance(VertexId::new(i))).collect();
        for d in &equator {
            assert!((d - equator[0]).abs() < 1e-6 * equator[0]);
        }

        let (far, d_far) = result.farthest_vertex().unwrap();
        assert_eq!(far, VertexId::new(5));
        assert!((equator[0] / d_far - 0.5).abs() < 0.1);
    }

    #[test]
    fn test_multiple_sources() {
        let n = 4;
        let mesh = grid(n, 1.0);
        let last = (n + 1) * (n + 1) - 1;
        let sources = [VertexId::new(0), VertexId::new(last)];
        let result = heat_method_multiple(&mesh, &sources, &HeatMethodOptions::default())
            .unwrap()
            .shifted_to_min();

        let range = result.max() - result.min();
        assert!(result.distance(sources[0]) < 0.05 * range);
        assert!(result.distance(sources[1]) < 0.05 * range);

        // The off-diagonal corners are farthest from both sources.
        let (far, _) = result.farthest_vertex().unwrap();
        assert!(far == VertexId::new(n) || far == VertexId::new(n * (n + 1)));
    }

    #[test]
    fn test_vertex_lumped_scheme_runs() {
        let mesh = sphere(2);
        let options = HeatMethodOptions::default().with_gradient_scheme(GradientScheme::VertexLumped);
        let result = heat_method(&mesh, VertexId::new(0), &options).unwrap();
        assert_eq!(result.len(), mesh.num_vertices());
        assert!(result.distances().iter().all(|d| d.is_finite()));
    }

    #[test]
    fn test_vertex_lumped_field_is_not_offset() {
        // Lumped divergence does not sum to zero; the raw field must still be
        // centered instead of sitting near -mean(div) / eps.
        let mesh = grid(8, 1.0);
        let options = HeatMethodOptions::default().with_gradient_scheme(GradientScheme::VertexLumped);
        let result = heat_method(&mesh, VertexId::new(0), &options).unwrap();

        let spread = result.max() - result.min();
        assert!(spread > 0.0);
        assert!(result.max().abs() < 2.0 * spread && result.min().abs() < 2.0 * spread);
        let mean = result.distances().iter().sum::<f64>() / result.len() as f64;
        assert!(mean.abs() < 1e-6 * spread.max(1.0), "mean {}", mean);
    }

    #[test]
    fn test_verbose_matches_quiet() {
        let mesh = grid(3, 1.0);
        let u0 = initial_condition(mesh.num_vertices(), &[VertexId::<u32>::new(0)]).unwrap();
        let options = HeatMethodOptions::default();
        let quiet = heat_geodesic(&mesh, &u0, &options).unwrap();
        let loud = heat_geodesic_verbose(&mesh, &u0, &options).unwrap();
        assert_eq!(quiet, loud);
    }

    #[test]
    fn test_timestep_override() {
        let options = HeatMethodOptions::default().with_timestep_multiplier(4.0);
        assert!((options.timestep(0.5) - 1.0).abs() < 1e-15);
        let options = options.with_time_step(0.25);
        assert_eq!(options.timestep(0.5), 0.25);
    }

    #[test]
    fn test_wrong_initial_length() {
        let mesh = grid(2, 1.0);
        let u0 = DVector::zeros(mesh.num_vertices() + 1);
        let err = heat_geodesic(&mesh, &u0, &HeatMethodOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(matches!(
            err,
            GeodesicError::InitialConditionLength { expected: 9, actual: 10 }
        ));
    }

    #[test]
    fn test_source_out_of_range() {
        let mesh = grid(1, 1.0);
        let err = heat_method(&mesh, VertexId::new(4), &HeatMethodOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            GeodesicError::SourceOutOfRange { vertex: 4, num_vertices: 4 }
        ));
    }

    #[test]
    fn test_empty_sources_rejected() {
        let mesh = grid(1, 1.0);
        let err = heat_method_multiple(&mesh, &[], &HeatMethodOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_invalid_options() {
        let mesh = grid(1, 1.0);
        for options in [
            HeatMethodOptions::default().with_timestep_multiplier(0.0),
            HeatMethodOptions::default().with_time_step(f64::NAN),
            HeatMethodOptions::default().with_regularization(-1e-6),
        ] {
            let err = heat_method(&mesh, VertexId::new(0), &options).unwrap_err();
            assert!(matches!(err, GeodesicError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn test_regularized_poisson_factorizes() {
        let mesh = sphere(1);
        let laplacian = build_cotan_laplacian(&mesh, BoundaryPolicy::OneSided).unwrap();

        let bare = SpdSolver::factor(&laplacian, "bare").err().unwrap();
        assert_eq!(bare.kind(), ErrorKind::Numeric);

        let shift = DVector::from_element(mesh.num_vertices(), 1e-6);
        let regularized = diagonal_plus_scaled(&shift, -1.0, &laplacian);
        assert!(SpdSolver::factor(&regularized, "poisson").is_ok());
    }

    #[test]
    fn test_reject_policy_on_open_mesh() {
        let mesh = grid(2, 1.0);
        let options = HeatMethodOptions::default().with_boundary_policy(BoundaryPolicy::Reject);
        let err = heat_method(&mesh, VertexId::new(0), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Topology);
        assert!(matches!(err, GeodesicError::BoundaryEdge { .. }));

        let closed = sphere(1);
        assert!(heat_method(&closed, VertexId::new(0), &options).is_ok());
    }

    #[test]
    fn test_isolated_vertex_rejected() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let err = heat_method(&mesh, VertexId::new(0), &HeatMethodOptions::default()).unwrap_err();
        assert!(matches!(err, GeodesicError::IsolatedVertex { vertex: 3 }));
    }

    #[test]
    fn test_degenerate_triangle_is_numeric_error() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let err = heat_method(&mesh, VertexId::new(0), &HeatMethodOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Numeric);
    }
}
