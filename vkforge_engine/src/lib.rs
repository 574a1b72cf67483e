/*!
# VkForge Engine

API-agnostic layer of the VkForge rendering engine.

This crate holds everything a graphics backend needs to agree on with the engine,
without knowing anything about the graphics API itself. Backends (see
`vkforge_engine_renderer_vulkan`) implement the traits defined here.

## Architecture

- **RenderEngine**: frame-level backend interface (begin/end frame, capabilities)
- **RenderFactory**: creates textures, buffers, views, frame buffers and shaders
- **ShaderEffect**: effect parameters and constant buffers a backend binds to
- **ShaderCompiler**: shading-language to bytecode cross-compiler seam
- **Engine**: process-wide registry of render engines plus the global logger
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod render;

// Main vkforge namespace module
pub mod vkforge {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module with all rendering types
    pub mod render {
        pub use crate::render::*;
    }
}

// Re-export math library at crate root
pub use glam;
