//! Sparse operator assembly and the SPD solver.
//!
//! Operators are stored as `nalgebra-sparse` CSC matrices. Both linear systems
//! of the heat method are symmetric positive definite and are solved with a
//! sparse Cholesky factorization that is built, used once, and dropped.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::error::{GeodesicError, Result};

/// A square sparse operator on per-vertex values.
pub type SparseOperator = CscMatrix<f64>;

/// Assemble an `n` x `n` operator from `(row, col, value)` triplets.
///
/// Duplicate entries are summed.
pub fn from_triplets(n: usize, triplets: impl IntoIterator<Item = (usize, usize, f64)>) -> SparseOperator {
    let mut coo = CooMatrix::new(n, n);
    for (row, col, value) in triplets {
        coo.push(row, col, value);
    }
    CscMatrix::from(&coo)
}

/// Build `diag(diagonal) + scale * op`.
pub fn diagonal_plus_scaled(
    diagonal: &DVector<f64>,
    scale: f64,
    op: &SparseOperator,
) -> SparseOperator {
    let n = op.nrows();
    let diag = diagonal.iter().enumerate().map(|(i, &d)| (i, i, d));
    let scaled = op
        .triplet_iter()
        .map(|(row, col, &value)| (row, col, scale * value));
    from_triplets(n, diag.chain(scaled))
}

/// Value stored at `(row, col)`, zero when the entry is not in the pattern.
pub fn entry(op: &SparseOperator, row: usize, col: usize) -> f64 {
    op.get_entry(row, col)
        .map(|e| e.into_value())
        .unwrap_or(0.0)
}

/// Sum of each row.
pub fn row_sums(op: &SparseOperator) -> DVector<f64> {
    let mut sums = DVector::zeros(op.nrows());
    for (row, _, &value) in op.triplet_iter() {
        sums[row] += value;
    }
    sums
}

/// Count of stored non-finite values and the row of the first one.
pub fn non_finite_entries(op: &SparseOperator) -> Option<(usize, usize)> {
    let mut bad = op
        .triplet_iter()
        .filter(|(_, _, value)| !value.is_finite())
        .map(|(row, _, _)| row);
    let first = bad.next()?;
    Some((bad.count() + 1, first))
}

/// Sparse Cholesky factorization of a symmetric positive definite operator.
pub struct SpdSolver {
    factor: CscCholesky<f64>,
    stage: &'static str,
}

impl SpdSolver {
    /// Factorize `op`.
    ///
    /// `stage` names the pipeline stage in the error returned when the matrix is
    /// not positive definite.
    pub fn factor(op: &SparseOperator, stage: &'static str) -> Result<Self> {
        if op.nrows() != op.ncols() {
            return Err(GeodesicError::invalid_param(
                "operator shape",
                format!("{}x{}", op.nrows(), op.ncols()),
                "must be square",
            ));
        }
        let factor = CscCholesky::factor(op).map_err(|err| GeodesicError::NotPositiveDefinite {
            stage,
            reason: format!("{err:?}"),
        })?;
        log::debug!("{}: factorized {}x{} system", stage, op.nrows(), op.ncols());
        Ok(Self { factor, stage })
    }

    /// Solve `A x = b` with the stored factor.
    ///
    /// Fails if `b` has the wrong length or the solution is not finite.
    pub fn solve(&self, b: &DVector<f64>) -> Result<DVector<f64>> {
        let n = self.factor.l().nrows();
        if b.len() != n {
            return Err(GeodesicError::invalid_param(
                "right-hand side length",
                b.len(),
                "must match the system size",
            ));
        }

        let rhs = DMatrix::from_column_slice(n, 1, b.as_slice());
        let x = self.factor.solve(&rhs);
        let x = DVector::from_column_slice(x.as_slice());

        ensure_finite(self.stage, x.as_slice())?;
        Ok(x)
    }
}

/// Fail with [`GeodesicError::NonFinite`] if any value is NaN or infinite.
pub fn ensure_finite(stage: &'static str, values: &[f64]) -> Result<()> {
    let mut bad = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_finite())
        .map(|(i, _)| i);
    match bad.next() {
        None => Ok(()),
        Some(first) => Err(GeodesicError::NonFinite {
            stage,
            count: bad.count() + 1,
            first,
        }),
    }
}
