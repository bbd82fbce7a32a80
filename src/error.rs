//! Error types for heatgeo.
//!
//! Every failure is reported through [`GeodesicError`]. The variants fall into a
//! small number of categories, exposed via [`GeodesicError::kind`], so callers can
//! tell a bad mesh from a bad argument from a failed solve without matching on
//! every variant.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`GeodesicError`].
pub type Result<T> = std::result::Result<T, GeodesicError>;

/// Broad classification of a [`GeodesicError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The mesh is not a closed, manifold, consistently oriented surface
    /// (or has a boundary the configured policy does not accept).
    Topology,
    /// A linear system was not positive definite, or an operator or field
    /// contained non-finite values.
    Numeric,
    /// The caller supplied arguments inconsistent with the mesh or with each other.
    Input,
    /// Reading or writing a mesh file failed.
    Io,
}

/// Errors that can occur while building meshes or computing distances.
#[derive(Error, Debug)]
pub enum GeodesicError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face repeats a vertex.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A directed edge appears in more than one face, so the edge is either
    /// shared by more than two faces or its faces are inconsistently oriented.
    #[error("edge ({v0}, {v1}) is non-manifold or inconsistently oriented")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A vertex's fan is not a single disk or half-disk (e.g. two cones touching
    /// at a point).
    #[error("vertex {vertex} is non-manifold")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// The mesh has a boundary edge and the boundary policy rejects it.
    #[error("mesh has a boundary edge ({v0}, {v1})")]
    BoundaryEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A vertex is not referenced by any face.
    #[error("vertex {vertex} has no incident faces")]
    IsolatedVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// Cholesky factorization of a stage's system matrix failed.
    #[error("{stage}: system matrix is not positive definite ({reason})")]
    NotPositiveDefinite {
        /// The pipeline stage that owns the system.
        stage: &'static str,
        /// Message from the factorization.
        reason: String,
    },

    /// An operator or field produced by a stage contains non-finite values.
    #[error("{stage}: {count} non-finite value(s), first at index {first}")]
    NonFinite {
        /// The pipeline stage that produced the values.
        stage: &'static str,
        /// Number of non-finite entries.
        count: usize,
        /// Index of the first non-finite entry.
        first: usize,
    },

    /// The initial condition does not have one entry per vertex.
    #[error("initial condition has {actual} entries but the mesh has {expected} vertices")]
    InitialConditionLength {
        /// The number of vertices in the mesh.
        expected: usize,
        /// The length of the supplied vector.
        actual: usize,
    },

    /// A source vertex is out of range.
    #[error("source vertex {vertex} is out of range for a mesh with {num_vertices} vertices")]
    SourceOutOfRange {
        /// The requested source index.
        vertex: usize,
        /// The number of vertices in the mesh.
        num_vertices: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl GeodesicError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        GeodesicError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeodesicError::NonManifoldEdge { .. }
            | GeodesicError::NonManifoldVertex { .. }
            | GeodesicError::BoundaryEdge { .. }
            | GeodesicError::IsolatedVertex { .. } => ErrorKind::Topology,
            GeodesicError::NotPositiveDefinite { .. } | GeodesicError::NonFinite { .. } => {
                ErrorKind::Numeric
            }
            GeodesicError::EmptyMesh
            | GeodesicError::InvalidVertexIndex { .. }
            | GeodesicError::DegenerateFace { .. }
            | GeodesicError::InitialConditionLength { .. }
            | GeodesicError::SourceOutOfRange { .. }
            | GeodesicError::InvalidParameter { .. } => ErrorKind::Input,
            GeodesicError::Io(_)
            | GeodesicError::LoadError { .. }
            | GeodesicError::UnsupportedFormat { .. } => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let e = GeodesicError::InitialConditionLength {
            expected: 4,
            actual: 3,
        };
        assert_eq!(e.kind(), ErrorKind::Input);

        let e = GeodesicError::NotPositiveDefinite {
            stage: "heat flow",
            reason: "NotPositiveDefinite".to_string(),
        };
        assert_eq!(e.kind(), ErrorKind::Numeric);

        let e = GeodesicError::BoundaryEdge { v0: 0, v1: 1 };
        assert_eq!(e.kind(), ErrorKind::Topology);
    }

    #[test]
    fn test_display_names_stage() {
        let e = GeodesicError::NonFinite {
            stage: "cotangent Laplacian",
            count: 2,
            first: 7,
        };
        let msg = e.to_string();
        assert!(msg.starts_with("cotangent Laplacian"));
        assert!(msg.contains("first at index 7"));
    }

    #[test]
    fn test_invalid_param() {
        let e = GeodesicError::invalid_param("regularization", -1.0, "must be positive");
        assert_eq!(
            e.to_string(),
            "invalid parameter: regularization = -1 (must be positive)"
        );
    }
}
