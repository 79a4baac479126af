//! Frame decode/encode
//!
//! Layout: [`HEADER_SIZE`] bytes of header (NUL-padded device id in the first
//! [`DEVICE_ID_BYTES`]) followed by fixed-width [`RECORD_SIZE`]-byte sample
//! records, all little-endian. A trailing partial record is discarded.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use contracts::{
    DecodedFrame, SampleRecord, CHANNEL_COUNT, DEVICE_ID_BYTES, HEADER_SIZE, IMPEDANCE_COUNT,
    RECORD_SIZE,
};

/// Decode a decompressed frame buffer
///
/// Pure and infallible: undersized or malformed input degrades to zero
/// samples (and the sentinel device id when no header is present) instead of
/// failing the caller.
pub fn decode(buffer: &[u8]) -> DecodedFrame {
    if buffer.len() < HEADER_SIZE {
        return DecodedFrame::unknown();
    }

    let device_id = parse_device_id(&buffer[..DEVICE_ID_BYTES]);

    let payload = &buffer[HEADER_SIZE..];
    let num_samples = payload.len() / RECORD_SIZE;
    if num_samples == 0 {
        return DecodedFrame::empty(device_id);
    }

    let mut samples = Vec::with_capacity(num_samples);
    let mut cursor = &payload[..num_samples * RECORD_SIZE];
    for _ in 0..num_samples {
        samples.push(read_record(&mut cursor));
    }

    trace!(device_id = %device_id, samples = samples.len(), "decoded frame");

    DecodedFrame { device_id, samples }
}

/// Encode a frame (inverse of [`decode`])
///
/// Used by mock device sources and round-trip tests. Device ids longer than
/// [`DEVICE_ID_BYTES`] are truncated.
pub fn encode(device_id: &str, samples: &[SampleRecord]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + samples.len() * RECORD_SIZE);

    let id_bytes = device_id.as_bytes();
    let id_len = id_bytes.len().min(DEVICE_ID_BYTES);
    buf.put_slice(&id_bytes[..id_len]);
    buf.put_bytes(0, HEADER_SIZE - id_len);

    for sample in samples {
        write_record(&mut buf, sample);
    }

    buf.freeze()
}

/// Convert a raw ADC reading to volts
///
/// 12-bit ADC centered on 2048 counts, 4.5 V reference, µV-scaled output.
pub fn adc_to_volts(adc: u16) -> f64 {
    (adc as f64 - 2048.0) * (4.5 / 4096.0) * 1e-6
}

/// Header device id: bytes up to the first NUL, lossy UTF-8.
/// Decoding failures must not abort the frame.
fn parse_device_id(header: &[u8]) -> String {
    let end = header
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(header.len());
    String::from_utf8_lossy(&header[..end]).into_owned()
}

fn read_record(cursor: &mut &[u8]) -> SampleRecord {
    let mut channels = [0u16; CHANNEL_COUNT];
    for ch in &mut channels {
        *ch = cursor.get_u16_le();
    }

    let mut accel = [0f32; 3];
    for axis in &mut accel {
        *axis = cursor.get_f32_le();
    }

    let mut gyro = [0f32; 3];
    for axis in &mut gyro {
        *axis = cursor.get_f32_le();
    }

    let trigger = cursor.get_u8();

    let mut impedance = [0i8; IMPEDANCE_COUNT];
    for imp in &mut impedance {
        *imp = cursor.get_i8();
    }

    let device_micros = cursor.get_u32_le();

    SampleRecord {
        channels,
        accel,
        gyro,
        trigger,
        impedance,
        device_micros,
    }
}

fn write_record(buf: &mut BytesMut, sample: &SampleRecord) {
    for ch in sample.channels {
        buf.put_u16_le(ch);
    }
    for axis in sample.accel {
        buf.put_f32_le(axis);
    }
    for axis in sample.gyro {
        buf.put_f32_le(axis);
    }
    buf.put_u8(sample.trigger);
    for imp in sample.impedance {
        buf.put_i8(imp);
    }
    buf.put_u32_le(sample.device_micros);
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::UNKNOWN_DEVICE;
    use rand::Rng;

    fn make_sample(micros: u32) -> SampleRecord {
        let mut rng = rand::rng();
        SampleRecord {
            channels: std::array::from_fn(|_| rng.random_range(0..4096)),
            accel: std::array::from_fn(|_| rng.random_range(-10.0..10.0)),
            gyro: std::array::from_fn(|_| rng.random_range(-3.0..3.0)),
            trigger: rng.random(),
            impedance: std::array::from_fn(|_| rng.random_range(-50..50)),
            device_micros: micros,
        }
    }

    #[test]
    fn test_decode_undersized_buffer() {
        for len in 0..HEADER_SIZE {
            let buffer = vec![0xAB; len];
            let frame = decode(&buffer);
            assert_eq!(frame.device_id, UNKNOWN_DEVICE, "len={len}");
            assert!(frame.samples.is_empty(), "len={len}");
        }
    }

    #[test]
    fn test_decode_header_only() {
        let frame = decode(&encode("aa:bb:cc:dd:ee:ff", &[]));
        assert_eq!(frame.device_id, "aa:bb:cc:dd:ee:ff");
        assert!(frame.samples.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let samples: Vec<SampleRecord> = (0..32).map(|i| make_sample(i * 3906)).collect();
        let frame = decode(&encode("headset-01", &samples));
        assert_eq!(frame.device_id, "headset-01");
        assert_eq!(frame.samples, samples);
    }

    #[test]
    fn test_partial_trailing_record_discarded() {
        let samples: Vec<SampleRecord> = (0..3).map(|i| make_sample(i * 1000)).collect();
        let mut buffer = encode("dev", &samples).to_vec();

        // Append a torn record - every prefix length must be ignored
        for extra in 1..RECORD_SIZE {
            let mut torn = buffer.clone();
            torn.extend(std::iter::repeat_n(0x5A, extra));
            let frame = decode(&torn);
            assert_eq!(frame.samples.len(), 3, "extra={extra}");
        }

        // A complete extra record is kept
        buffer.extend_from_slice(&encode("x", &[make_sample(9000)])[HEADER_SIZE..]);
        assert_eq!(decode(&buffer).samples.len(), 4);
    }

    #[test]
    fn test_device_id_nul_trimmed() {
        let mut buffer = vec![0u8; HEADER_SIZE];
        buffer[..5].copy_from_slice(b"esp32");
        let frame = decode(&buffer);
        assert_eq!(frame.device_id, "esp32");
    }

    #[test]
    fn test_invalid_utf8_device_id_is_lossy_not_fatal() {
        let mut buffer = vec![0u8; HEADER_SIZE + RECORD_SIZE];
        buffer[0] = 0xFF;
        buffer[1] = 0xFE;
        let frame = decode(&buffer);
        assert!(!frame.device_id.is_empty());
        assert_eq!(frame.samples.len(), 1);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut sample = SampleRecord::default();
        sample.channels[0] = 0x0201;
        sample.device_micros = 0x0403_0201;
        let encoded = encode("d", &[sample]);

        let payload = &encoded[HEADER_SIZE..];
        assert_eq!(&payload[..2], &[0x01, 0x02]);
        assert_eq!(&payload[RECORD_SIZE - 4..], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_adc_conversion_midscale_is_zero() {
        assert_eq!(adc_to_volts(2048), 0.0);
        assert!(adc_to_volts(4095) > 0.0);
        assert!(adc_to_volts(0) < 0.0);
    }
}
