//! Codec error types

use thiserror::Error;

/// Codec errors
///
/// Frame decoding itself never fails; only timestamp reconstruction has an
/// explicit unsupported-input case.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The 32-bit device counter wrapped inside one batch (~71 min period).
    /// Reconstruction cannot anchor such a batch; the input is rejected
    /// rather than silently corrected.
    #[error(
        "device counter wrapped within batch: first={first_micros}µs, last={last_micros}µs \
         over {sample_count} samples"
    )]
    CounterWrapped {
        first_micros: u32,
        last_micros: u32,
        sample_count: usize,
    },
}

/// Codec Result alias
pub type Result<T> = std::result::Result<T, CodecError>;
