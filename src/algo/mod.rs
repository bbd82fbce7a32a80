//! Mesh processing algorithms.
//!
//! - **Geodesics**: heat method distances and the discrete operators it is
//!   built from

pub mod geodesic;
