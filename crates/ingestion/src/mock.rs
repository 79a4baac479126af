//! Mock device source
//!
//! Emits wire-realistic compressed frames for running the pipeline without
//! hardware: ADC noise around midscale, a microsecond counter advancing at
//! the configured rate, zstd on top, just like a real headset bridge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use contracts::{SampleRecord, UserId, CHANNEL_COUNT, IMPEDANCE_COUNT};

use crate::driver::compress_frame;
use crate::message::InboundMessage;

/// Mock device parameters
#[derive(Debug, Clone)]
pub struct MockDeviceConfig {
    /// Device identifier stamped into each frame header
    pub device_id: String,

    /// Subject the transport routes this device to
    pub user_id: UserId,

    /// Sampling rate (Hz)
    pub sample_rate: u32,

    /// Samples per emitted frame
    pub batch_size: usize,
}

impl Default for MockDeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "mock:00:01".to_string(),
            user_id: "mock-user".into(),
            sample_rate: 256,
            batch_size: 64,
        }
    }
}

/// Mock device source
pub struct MockDeviceSource {
    config: MockDeviceConfig,
    running: Arc<AtomicBool>,
}

impl MockDeviceSource {
    pub fn new(config: MockDeviceConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start emitting frames into the queue
    pub fn start(&self, tx: Sender<InboundMessage>) {
        let config = self.config.clone();
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let interval =
                Duration::from_secs_f64(config.batch_size as f64 / config.sample_rate as f64);
            let micros_per_sample = 1_000_000 / config.sample_rate;
            let mut counter: u32 = 0;
            let mut rng = rand::rngs::StdRng::from_os_rng();

            debug!(
                device_id = %config.device_id,
                user_id = %config.user_id,
                sample_rate = config.sample_rate,
                "mock device started"
            );

            while running.load(Ordering::Relaxed) {
                let samples: Vec<SampleRecord> = (0..config.batch_size)
                    .map(|i| {
                        let mut channels = [0u16; CHANNEL_COUNT];
                        for ch in channels.iter_mut() {
                            *ch = 2048u16.wrapping_add_signed(rng.random_range(-64i16..=64));
                        }
                        SampleRecord {
                            channels,
                            accel: [0.0, 0.0, 9.81],
                            gyro: [0.0; 3],
                            trigger: 0,
                            impedance: [5; IMPEDANCE_COUNT],
                            device_micros: counter
                                .wrapping_add(i as u32 * micros_per_sample),
                        }
                    })
                    .collect();
                counter = counter.wrapping_add(config.batch_size as u32 * micros_per_sample);

                let encoded = codec::encode(&config.device_id, &samples);
                let payload = match compress_frame(&encoded) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "mock frame compression failed");
                        continue;
                    }
                };

                let message = InboundMessage::new(Some(config.user_id.clone()), payload);
                if tx.send(message).await.is_err() {
                    debug!(device_id = %config.device_id, "mock device channel closed");
                    break;
                }
                trace!(device_id = %config.device_id, counter, "mock frame sent");

                tokio::time::sleep(interval).await;
            }

            debug!(device_id = %config.device_id, "mock device stopped");
        });
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
