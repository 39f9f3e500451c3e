//! Numeric codes shared by the C ABI.

use std::os::raw::c_int;
use std::ptr;

use passthrough_capture_core::models::state::CaptureState;

pub const BUFFER_TOO_SMALL: c_int = -100;
pub const INVALID_HANDLE: c_int = -101;

/// `0` idle, `1` opening, `2` configuring, `3` capturing, `4` stopped, or
/// the negative error code of a failed cycle.
pub fn state_code(state: &CaptureState) -> c_int {
    match state {
        CaptureState::Idle => 0,
        CaptureState::Opening { .. } => 1,
        CaptureState::Configuring { .. } => 2,
        CaptureState::Capturing { .. } => 3,
        CaptureState::Stopped => 4,
        CaptureState::Failed(e) => e.code(),
    }
}

/// Copies `bytes` into `buf`, or returns `None` when it does not fit.
///
/// # Safety
///
/// `buf` must be null or valid for writes of `capacity` bytes.
pub unsafe fn copy_into(bytes: &[u8], buf: *mut u8, capacity: usize) -> Option<usize> {
    if buf.is_null() || bytes.len() > capacity {
        return None;
    }
    ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
    Some(bytes.len())
}
