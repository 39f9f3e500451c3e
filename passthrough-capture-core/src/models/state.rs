use super::error::CaptureError;

/// Capture lifecycle state machine.
///
/// State transitions:
/// ```text
/// idle/stopped/failed → opening → configuring → capturing
///                          ↓           ↓            ↓
///                        failed      failed       failed
/// (any) → stopped   on stop()
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Opening { camera_id: String },
    Configuring { camera_id: String },
    Capturing { camera_id: String },
    Failed(CaptureError),
    Stopped,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }

    /// Whether an acquisition cycle is in flight or running.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Opening { .. } | Self::Configuring { .. } | Self::Capturing { .. }
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn camera_id(&self) -> Option<&str> {
        match self {
            Self::Opening { camera_id }
            | Self::Configuring { camera_id }
            | Self::Capturing { camera_id } => Some(camera_id),
            _ => None,
        }
    }

    /// Short lowercase name, for logs and host-side display.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening { .. } => "opening",
            Self::Configuring { .. } => "configuring",
            Self::Capturing { .. } => "capturing",
            Self::Failed(_) => "failed",
            Self::Stopped => "stopped",
        }
    }
}
