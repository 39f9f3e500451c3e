//! Camera metadata tags and their value mappings.
//!
//! Tags and values are from `camera/NdkCameraMetadataTags.h`.

use passthrough_capture_core::models::camera_models::{HardwareLevel, LensFacing};
use passthrough_capture_core::models::config::ControlMode;

pub const ACAMERA_LENS_FACING: u32 = 0x0008_0005;
pub const ACAMERA_INFO_SUPPORTED_HARDWARE_LEVEL: u32 = 0x0015_0000;
pub const ACAMERA_CONTROL_MODE: u32 = 0x0001_000f;

const LENS_FACING_FRONT: u8 = 0;
const LENS_FACING_BACK: u8 = 1;
const LENS_FACING_EXTERNAL: u8 = 2;

const HARDWARE_LEVEL_LIMITED: u8 = 0;
const HARDWARE_LEVEL_FULL: u8 = 1;
const HARDWARE_LEVEL_LEGACY: u8 = 2;
const HARDWARE_LEVEL_3: u8 = 3;
const HARDWARE_LEVEL_EXTERNAL: u8 = 4;

const CONTROL_MODE_OFF: u8 = 0;
const CONTROL_MODE_AUTO: u8 = 1;

/// `ACAMERA_LENS_FACING` value, or `None` when the entry is missing.
pub fn lens_facing(value: Option<u8>) -> LensFacing {
    match value {
        Some(LENS_FACING_FRONT) => LensFacing::Front,
        Some(LENS_FACING_BACK) => LensFacing::Back,
        Some(LENS_FACING_EXTERNAL) => LensFacing::External,
        _ => LensFacing::Unknown,
    }
}

pub fn hardware_level(value: Option<u8>) -> HardwareLevel {
    match value {
        Some(HARDWARE_LEVEL_LEGACY) => HardwareLevel::Legacy,
        Some(HARDWARE_LEVEL_LIMITED) => HardwareLevel::Limited,
        Some(HARDWARE_LEVEL_FULL) => HardwareLevel::Full,
        Some(HARDWARE_LEVEL_3) => HardwareLevel::Level3,
        Some(HARDWARE_LEVEL_EXTERNAL) => HardwareLevel::External,
        _ => HardwareLevel::Unknown,
    }
}

pub fn control_mode_value(mode: ControlMode) -> u8 {
    match mode {
        ControlMode::Off => CONTROL_MODE_OFF,
        ControlMode::Auto => CONTROL_MODE_AUTO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_lens_facing() {
        assert_eq!(lens_facing(Some(1)), LensFacing::Back);
        assert_eq!(lens_facing(Some(0)), LensFacing::Front);
        assert_eq!(lens_facing(Some(2)), LensFacing::External);
        assert_eq!(lens_facing(Some(9)), LensFacing::Unknown);
        assert_eq!(lens_facing(None), LensFacing::Unknown);
    }

    #[test]
    fn maps_hardware_level() {
        assert_eq!(hardware_level(Some(2)), HardwareLevel::Legacy);
        assert_eq!(hardware_level(Some(0)), HardwareLevel::Limited);
        assert_eq!(hardware_level(Some(3)), HardwareLevel::Level3);
        assert_eq!(hardware_level(None), HardwareLevel::Unknown);
    }

    #[test]
    fn auto_control_mode_is_one() {
        assert_eq!(control_mode_value(ControlMode::Auto), 1);
        assert_eq!(control_mode_value(ControlMode::Off), 0);
    }
}
