use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A compressed frame captured from the passthrough camera.
///
/// The payload is shared and immutable; cloning a `Frame` never copies bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Arc<[u8]>,
    sequence: u64,
    received_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(data: Arc<[u8]>, sequence: u64) -> Self {
        Self {
            data,
            sequence,
            received_at: Utc::now(),
        }
    }

    /// The encoded (JPEG) payload.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// A shared handle to the payload.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of this frame in the order frames were received, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

/// Diagnostics snapshot for a bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeDiagnostics {
    pub cycles_started: u64,
    pub frames_received: u64,
    pub frame_read_failures: u64,
    pub stale_frames_discarded: u64,
    pub last_frame_bytes: usize,
    pub camera_id: Option<String>,
    pub cycle_id: Option<Uuid>,
    pub state: String,
}

impl BridgeDiagnostics {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
