//! Engine construction error types

use thiserror::Error;

/// Errors that can occur while constructing the engine
///
/// These are initialization-time only. The per-callback processing path
/// never fails: out-of-range speeds, output shortfalls and malformed
/// position reports are all absorbed by local policies (silence, zero-fill,
/// ignore) because the audio callback contract has no channel for
/// mid-stream errors.
#[derive(Error, Debug)]
pub enum RepitchError {
    /// Ring buffer capacity is zero or not a power of two
    #[error("Ring buffer capacity must be a non-zero power of two, got {0}")]
    InvalidRingCapacity(usize),

    /// Stretcher processing block size is zero
    #[error("Stretcher block size must be non-zero, got {0}")]
    InvalidBlockSize(usize),
}

/// Result type for engine construction
pub type RepitchResult<T> = Result<T, RepitchError>;
