/// Backend instance configuration and window/swapchain settings

use crate::render::ElementFormat;

/// Which validation messages get reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Where validation messages go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    /// Engine logger only
    Console,
    /// Append to a file
    File(String),
    /// Engine logger and a file
    Both(String),
}

/// Validation message categories to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Validation message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Backend configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable the validation layer (only honoured when it is installed)
    pub enable_validation: bool,
    /// Application name reported to the driver
    pub app_name: String,
    pub debug_severity: DebugSeverity,
    pub debug_output: DebugOutput,
    pub debug_message_filter: DebugMessageFilter,
    /// Abort the process on the first validation error
    pub break_on_validation_error: bool,
    /// Panic on the first validation error
    pub panic_on_error: bool,
    /// Count validation messages
    pub enable_validation_stats: bool,
    /// Device extensions a physical device must expose, on top of the swapchain
    pub required_device_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "VkForge Application".to_string(),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            debug_message_filter: DebugMessageFilter::default(),
            break_on_validation_error: false,
            panic_on_error: false,
            enable_validation_stats: false,
            required_device_extensions: Vec::new(),
        }
    }
}

/// Window and swapchain settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Requested back-buffer format
    pub color_fmt: ElementFormat,
    /// Depth-stencil buffer format
    pub depth_stencil_fmt: ElementFormat,
    /// 0 = no vsync
    pub sync_interval: u32,
    /// Frames recorded ahead of the GPU
    pub frames_in_flight: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            color_fmt: ElementFormat::ARGB8,
            depth_stencil_fmt: ElementFormat::D24S8,
            sync_interval: 1,
            frames_in_flight: 2,
        }
    }
}
