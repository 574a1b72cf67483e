//! Error types for the VkForge engine
//!
//! This module defines the error type shared by the engine layer and the
//! graphics backends, covering initialization, resource creation and the
//! explicit-API failure taxonomy (formats, queues, memory, device loss).

use std::fmt;

/// Result type for VkForge engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// VkForge engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan, DirectX, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, device, subsystems)
    InitializationFailed(String),

    /// The requested format is not supported for the requested tiling/usage
    UnsupportedFormat(String),

    /// No queue family exposes the requested capability
    NoSuitableQueueFamily(String),

    /// No memory type satisfies the type mask and property flags
    NoSuitableMemoryType {
        /// Memory type bitmask from the resource requirements
        type_bits: u32,
        /// Raw property flags that were requested
        properties: u32,
    },

    /// An underlying graphics API call returned a failure status
    ApiCallFailed {
        /// Name of the failing call
        call: &'static str,
        /// Raw status code returned by the API
        code: i32,
    },

    /// The resource has no hardware object yet
    ResourceNotReady(String),

    /// The entry point exists in the contract but has no implementation
    NotImplemented(&'static str),

    /// A bounded wait expired
    Timeout,

    /// The device was lost and must be recreated
    DeviceLost,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            Error::NoSuitableQueueFamily(msg) => write!(f, "No suitable queue family: {}", msg),
            Error::NoSuitableMemoryType { type_bits, properties } => write!(
                f,
                "No suitable memory type (type bits: {:#x}, properties: {:#x})",
                type_bits, properties
            ),
            Error::ApiCallFailed { call, code } => write!(f, "API call {} failed with code {}", call, code),
            Error::ResourceNotReady(msg) => write!(f, "Resource not ready: {}", msg),
            Error::NotImplemented(what) => write!(f, "Not implemented: {}", what),
            Error::Timeout => write!(f, "Wait timed out"),
            Error::DeviceLost => write!(f, "Device lost"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
