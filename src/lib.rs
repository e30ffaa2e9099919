//! # tessera
//!
//! Fixed-function 2D integer convolution for SPMD lane teams.
//!
//! Re-exports [`tessera_core`] (lanes, partitioners, images, filters) and
//! [`tessera_kernels`] (convolution variants, pattern utilities, `Team`).

pub use tessera_core;
pub use tessera_kernels;

pub use tessera_core::{Filter, Filter3x3, Image, Lane, TesseraError, GAUSSIAN_3X3};
pub use tessera_kernels::{ConvProblem, Mismatch, Team, TeamError, Variant};
