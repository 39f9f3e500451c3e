pub mod device_selector;
pub mod latest_frame;
