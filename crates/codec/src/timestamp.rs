//! Absolute timestamp reconstruction
//!
//! Devices stamp samples with a monotonic microsecond counter whose epoch is
//! the device boot. The reference instant is when the whole batch reached the
//! ingesting side, which is closest in wall-clock terms to the *last* sample
//! (transport delay is incurred after capture), so the last sample anchors
//! the batch.

use chrono::{DateTime, Duration, Utc};

use contracts::SampleRecord;

use crate::error::{CodecError, Result};

/// Reconstruct one absolute timestamp per sample
///
/// `epoch = reference - last_counter`; each timestamp = `epoch + counter`.
/// Empty input yields an empty vector.
///
/// # Errors
/// [`CodecError::CounterWrapped`] when the batch spans a 32-bit counter
/// wraparound (last counter below the first). Callers must keep batches
/// well under the ~71 minute wrap period.
pub fn reconstruct(
    samples: &[SampleRecord],
    reference_instant: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Ok(Vec::new());
    };

    if last.device_micros < first.device_micros {
        return Err(CodecError::CounterWrapped {
            first_micros: first.device_micros,
            last_micros: last.device_micros,
            sample_count: samples.len(),
        });
    }

    let epoch_estimate = reference_instant - Duration::microseconds(last.device_micros as i64);

    Ok(samples
        .iter()
        .map(|s| epoch_estimate + Duration::microseconds(s.device_micros as i64))
        .collect())
}

/// First and last reconstructed instants of a batch
///
/// Convenience for the durable path, which keys chunks by their time range.
pub fn frame_time_range(
    samples: &[SampleRecord],
    reference_instant: DateTime<Utc>,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let timestamps = reconstruct(samples, reference_instant)?;
    Ok(match (timestamps.first(), timestamps.last()) {
        (Some(&start), Some(&end)) => Some((start, end)),
        _ => None,
    })
}
