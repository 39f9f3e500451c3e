use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction a camera lens faces relative to the device operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LensFacing {
    Front,
    Back,
    External,
    Unknown,
}

impl LensFacing {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Front => "FRONT",
            Self::Back => "BACK",
            Self::External => "EXTERNAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Capability tier a camera device advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareLevel {
    #[serde(rename = "LEGACY")]
    Legacy,
    #[serde(rename = "LIMITED")]
    Limited,
    #[serde(rename = "FULL")]
    Full,
    #[serde(rename = "LEVEL_3")]
    Level3,
    #[serde(rename = "EXTERNAL")]
    External,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl HardwareLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Legacy => "LEGACY",
            Self::Limited => "LIMITED",
            Self::Full => "FULL",
            Self::Level3 => "LEVEL_3",
            Self::External => "EXTERNAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A camera device reported by the platform, with the characteristics
/// needed for selection and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub id: String,
    pub facing: LensFacing,
    pub hardware_level: HardwareLevel,
}

impl CameraInfo {
    pub fn new(id: impl Into<String>, facing: LensFacing, hardware_level: HardwareLevel) -> Self {
        Self {
            id: id.into(),
            facing,
            hardware_level,
        }
    }

    pub fn is_back_facing(&self) -> bool {
        self.facing == LensFacing::Back
    }
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Camera ID: {} | Facing: {} | Level: {}",
            self.id,
            self.facing.label(),
            self.hardware_level.label()
        )
    }
}
