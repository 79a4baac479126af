//! SampleRecord - wire-format sample tuple
//!
//! Mirrors the firmware-side `SensorData` struct. Field order, widths and
//! little-endian byte order are frozen; changing any of them breaks every
//! archived chunk.

use serde::{Deserialize, Serialize};

/// Number of biosignal channels per sample
pub const CHANNEL_COUNT: usize = 8;

/// Number of impedance slots per sample (one per channel)
pub const IMPEDANCE_COUNT: usize = 8;

/// Size of one encoded sample record in bytes:
/// 8×u16 + 3×f32 + 3×f32 + u8 + 8×i8 + u32
pub const RECORD_SIZE: usize = CHANNEL_COUNT * 2 + 12 + 12 + 1 + IMPEDANCE_COUNT + 4;

/// Size of the frame header (firmware-side `PacketHeader`)
pub const HEADER_SIZE: usize = 18;

/// Bytes of the header holding the NUL-padded device identifier
pub const DEVICE_ID_BYTES: usize = 17;

/// Sentinel identifier for frames whose header cannot be parsed
pub const UNKNOWN_DEVICE: &str = "unknown_device";

/// One fixed-width sample as emitted by the device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Raw ADC channel readings
    pub channels: [u16; CHANNEL_COUNT],

    /// Accelerometer triple (m/s²)
    pub accel: [f32; 3],

    /// Gyroscope triple (rad/s)
    pub gyro: [f32; 3],

    /// Trigger / event marker byte
    pub trigger: u8,

    /// Per-channel impedance readings
    pub impedance: [i8; IMPEDANCE_COUNT],

    /// Device-local monotonic microsecond counter.
    /// Arbitrary boot epoch; wraps after ~71 minutes.
    pub device_micros: u32,
}

impl Default for SampleRecord {
    fn default() -> Self {
        Self {
            channels: [0; CHANNEL_COUNT],
            accel: [0.0; 3],
            gyro: [0.0; 3],
            trigger: 0,
            impedance: [0; IMPEDANCE_COUNT],
            device_micros: 0,
        }
    }
}

/// Decoded frame: device identifier plus its ordered sample records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedFrame {
    /// Device identifier from the frame header ([`UNKNOWN_DEVICE`] when unparseable)
    pub device_id: String,

    /// Samples in wire order (ascending device counter, absent wraparound)
    pub samples: Vec<SampleRecord>,
}

impl DecodedFrame {
    /// Frame with a parsed device id but no payload
    pub fn empty(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            samples: Vec::new(),
        }
    }

    /// Frame for input too short to carry a header
    pub fn unknown() -> Self {
        Self::empty(UNKNOWN_DEVICE)
    }
}
