//! # Codec
//!
//! Wire-frame codec and timestamp reconstruction.
//!
//! Responsibilities:
//! - Decode a decompressed device frame into `DecodedFrame` (pure, infallible)
//! - Encode frames for mock devices and round-trip tests
//! - Reconstruct absolute timestamps from device-local microsecond counters
//!
//! No I/O happens here; decompression lives with the callers.

mod error;
mod frame;
mod timestamp;

pub use contracts::{
    DecodedFrame, SampleRecord, CHANNEL_COUNT, DEVICE_ID_BYTES, HEADER_SIZE, IMPEDANCE_COUNT,
    RECORD_SIZE, UNKNOWN_DEVICE,
};
pub use error::{CodecError, Result};
pub use frame::{adc_to_volts, decode, encode};
pub use timestamp::{frame_time_range, reconstruct};
