/// Compressed output format of the frame sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
}

/// Template the repeating capture request is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestTemplate {
    Preview,
    Record,
}

/// 3A control mode applied to the repeating request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlMode {
    Off,
    Auto,
}

/// Configuration for one capture cycle.
///
/// Width and height are passed to the frame sink as-is; they are not
/// checked against the sizes the device actually supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfiguration {
    /// Requested output width in pixels (default: 1280).
    pub width: u32,

    /// Requested output height in pixels (default: 720).
    pub height: u32,

    /// Output format (default: JPEG).
    pub image_format: ImageFormat,

    /// Frame sink queue depth (default: 2). Bounds memory held by
    /// frames the callback has not consumed yet.
    pub max_images: u32,

    /// Request template (default: record).
    pub template: RequestTemplate,

    /// Control mode (default: auto).
    pub control_mode: ControlMode,
}

impl CaptureConfiguration {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "output size must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        if self.max_images == 0 {
            return Err("frame sink queue depth must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            image_format: ImageFormat::Jpeg,
            max_images: 2,
            template: RequestTemplate::Record,
            control_mode: ControlMode::Auto,
        }
    }
}
