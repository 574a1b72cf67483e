#![allow(dead_code)]
//! GPU test utilities - one hidden window, one factory, one render engine per test process
//!
//! ash-window refuses to create a second surface for the same window on some
//! platforms, so every GPU test goes through the objects created here.

use std::sync::{Mutex, MutexGuard, OnceLock};
use vkforge_engine::vkforge::render::{Config, RenderFactory, RenderSettings};
use vkforge_engine_renderer_vulkan::{make_render_factory, VulkanRenderEngine, VulkanRenderFactory};
use winit::event_loop::{EventLoop, EventLoopBuilder};
use winit::window::Window;

#[cfg(target_os = "windows")]
use winit::platform::windows::EventLoopBuilderExtWindows;

static GPU_FACTORY: OnceLock<Mutex<VulkanRenderFactory>> = OnceLock::new();

static GPU_ENGINE: OnceLock<Mutex<VulkanRenderEngine>> = OnceLock::new();

/// Kept alive for the surface. The event loop is leaked for the same reason.
static GPU_WINDOW: OnceLock<Window> = OnceLock::new();

pub fn test_config() -> Config {
    Config {
        app_name: "vkforge GPU tests".to_string(),
        enable_validation: cfg!(feature = "vulkan-validation"),
        ..Default::default()
    }
}

/// Shared factory; its device is created on first use
pub fn test_factory() -> MutexGuard<'static, VulkanRenderFactory> {
    GPU_FACTORY
        .get_or_init(|| Mutex::new(make_render_factory(test_config())))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn test_window() -> &'static Window {
    GPU_WINDOW.get_or_init(|| {
        let (window, event_loop) = create_test_window();
        std::mem::forget(event_loop);
        window
    })
}

/// Shared render engine on the hidden window, sharing the factory's device
pub fn test_engine() -> MutexGuard<'static, VulkanRenderEngine> {
    GPU_ENGINE
        .get_or_init(|| {
            let window = test_window();
            let settings = RenderSettings {
                width: 320,
                height: 240,
                ..Default::default()
            };
            let engine = test_factory()
                .make_render_engine(window, settings)
                .expect("Failed to create VulkanRenderEngine for tests");
            Mutex::new(engine)
        })
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Hidden window on an event loop that may live outside the main thread
#[allow(deprecated)]
pub fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = {
        #[cfg(target_os = "windows")]
        {
            EventLoopBuilder::new()
                .with_any_thread(true)
                .build()
                .unwrap()
        }
        #[cfg(not(target_os = "windows"))]
        {
            EventLoopBuilder::new().build().unwrap()
        }
    };

    let window_attrs = Window::default_attributes()
        .with_title("vkforge GPU test")
        .with_inner_size(winit::dpi::LogicalSize::new(320, 240))
        .with_visible(false);

    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}
