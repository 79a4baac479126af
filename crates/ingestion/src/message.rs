//! Inbound message shape and handling outcome

use bytes::Bytes;
use chrono::{DateTime, Utc};

use contracts::UserId;

/// One queued device payload
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Owning subject, when the transport layer knows it
    pub user_id: Option<UserId>,

    /// zstd-compressed wire frame
    pub payload: Bytes,

    /// Broker receipt time; the reconstruction reference instant
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(user_id: Option<UserId>, payload: Bytes) -> Self {
        Self {
            user_id,
            payload,
            received_at: Utc::now(),
        }
    }
}

/// What the consumer should tell the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Done with this message (success, or unrecoverable payload)
    Ack,

    /// Transient storage failure; redeliver after backoff
    Retry,
}
