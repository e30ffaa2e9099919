//! # tessera-kernels
//!
//! Fixed-function 2D integer convolution for SPMD lane teams.
//!
//! Every kernel is called by all lanes at once with the same arguments and a
//! different `Lane`. A kernel reads the shared input and filter, writes only
//! the output elements its lane owns, and never synchronizes. Border pixels
//! that the filter window does not fit are left untouched.
//!
//! Provides:
//! - Direct (centered) and shifted convolution for any odd kernel size
//! - Unrolled 3x3 convolution with block or strided partitioning
//! - Pattern init / zero / verify helpers for self-checks and benchmarks
//! - `Team`, a rayon-backed driver that runs lanes with an injected barrier

pub mod conv2d;
pub mod conv3x3;
pub mod dispatch;
pub mod pattern;
pub mod problem;
pub mod team;
pub mod weights;

pub use dispatch::Variant;
pub use pattern::Mismatch;
pub use problem::ConvProblem;
pub use team::{LaneBarrier, Team, TeamBarrier, TeamError};
