//! Camera enumeration and passthrough device selection.

use crate::models::camera_models::CameraInfo;
use crate::models::error::CaptureError;
use crate::traits::camera_platform::CameraPlatform;

/// Enumerate every camera with its characteristics, logging each one.
///
/// Devices whose characteristics cannot be read are logged and left out.
/// Fails with `NoCameraDevices` when the platform reports no devices at all.
pub fn camera_inventory<P: CameraPlatform>(platform: &P) -> Result<Vec<CameraInfo>, CaptureError> {
    let ids = platform.camera_ids()?;
    log::info!("Detected cameras: {:?}", ids);
    if ids.is_empty() {
        return Err(CaptureError::NoCameraDevices);
    }

    let mut cameras = Vec::with_capacity(ids.len());
    for id in &ids {
        match platform.camera_info(id) {
            Ok(info) => {
                log::info!("{}", info);
                cameras.push(info);
            }
            Err(e) => log::error!("Failed to read camera characteristics for {}: {}", id, e),
        }
    }
    Ok(cameras)
}

/// The first back-facing camera in enumeration order.
pub fn select_back_camera(cameras: &[CameraInfo]) -> Option<&CameraInfo> {
    cameras.iter().find(|c| c.is_back_facing())
}

/// JSON array of the given cameras, for hosts that show an inventory.
pub fn camera_inventory_json(cameras: &[CameraInfo]) -> serde_json::Result<String> {
    serde_json::to_string(cameras)
}
