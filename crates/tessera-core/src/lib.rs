//! # tessera-core
//!
//! Shared building blocks for the tessera SPMD convolution kernels.
//!
//! Provides:
//! - `Lane` descriptors (lane id + lane count) supplied by the caller
//! - Strided and block partitioners that split output coordinates across lanes
//! - `Image`, a row-major `i32` grid that many lanes may write concurrently
//! - `Filter` / `Filter3x3` integer weight kernels

pub mod error;
pub mod filter;
pub mod image;
pub mod lane;

pub use error::TesseraError;
pub use filter::{Filter, Filter3x3, BOX_3X3, GAUSSIAN_3X3, IDENTITY_3X3};
pub use image::Image;
pub use lane::{clamp_range, Lane};

pub type Result<T> = std::result::Result<T, TesseraError>;
