/// Errors raised when building tessera types or checking kernel preconditions.
///
/// The kernels never return these; they are produced by constructors and by
/// the up-front precondition check a driver runs before starting its lanes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TesseraError {
    #[error("invalid lane: id {id} with {num_lanes} lanes")]
    InvalidLane { id: usize, num_lanes: usize },

    #[error("buffer length mismatch: {width}x{height} needs {expected} elements, got {got}")]
    BufferLength {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },

    #[error("kernel dimensions must be odd, got {width}x{height}")]
    EvenKernel { width: usize, height: usize },

    #[error("kernel weights must sum to a positive value")]
    ZeroWeightSum,

    #[error("kernel {k_width}x{k_height} does not fit image {width}x{height}")]
    KernelTooLarge {
        k_width: usize,
        k_height: usize,
        width: usize,
        height: usize,
    },

    #[error("{variant} needs a {expected} kernel, got {width}x{height}")]
    KernelShape {
        variant: &'static str,
        expected: &'static str,
        width: usize,
        height: usize,
    },

    #[error("input and output images have different dimensions: {input:?} vs {output:?}")]
    DimMismatch {
        input: (usize, usize),
        output: (usize, usize),
    },

    #[error("input and output must be distinct buffers")]
    AliasedBuffers,
}
