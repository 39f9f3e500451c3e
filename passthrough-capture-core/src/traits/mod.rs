pub mod camera_platform;
pub mod capture_delegate;
pub mod host_context;
