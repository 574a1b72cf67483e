//! Integration tests for the logging macros and the render engine registry
//!
//! Drives the public API the way a backend crate does: error macros through
//! a custom logger, and a backend registered and driven as a trait object.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use serial_test::serial;
use std::sync::{Arc, Mutex};
use vkforge_engine::vkforge::{Engine, Error, Result};
use vkforge_engine::vkforge::log::{LogEntry, LogSeverity, Logger};
use vkforge_engine::vkforge::render::{
    Capability, CapabilityValue, Rect, RenderDeviceCaps, RenderEngine, ShaderStage,
};
use vkforge_engine::{engine_bail, engine_err, engine_fail, engine_warn_err};

// ============================================================================
// HELPERS
// ============================================================================

/// Logger that keeps every entry for inspection
struct CapturingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

fn capture_logs() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CapturingLogger { entries: Arc::clone(&entries) });
    entries
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Backend stand-in recording the calls it receives
struct RecordingBackend {
    caps: RenderDeviceCaps,
    platform: String,
    calls: Vec<&'static str>,
}

impl RenderEngine for RecordingBackend {
    fn name(&self) -> &str {
        "Recording Backend"
    }

    fn device_caps(&self) -> &RenderDeviceCaps {
        &self.caps
    }

    fn shader_profile(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => "vs_5_0",
            _ => "",
        }
    }

    fn capability(&self, capability: Capability) -> Option<CapabilityValue> {
        match capability {
            Capability::Platform => Some(CapabilityValue::Platform(self.platform.clone())),
            _ => None,
        }
    }

    fn set_capability(&mut self, value: CapabilityValue) {
        if let CapabilityValue::Platform(name) = value {
            self.platform = name;
        }
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.calls.push("begin_frame");
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.calls.push("end_frame");
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            engine_bail!("test::backend", "Cannot resize to {}x{}", width, height);
        }
        self.calls.push("resize");
        Ok(())
    }

    fn scissor_rect(&mut self, _rect: Rect) -> Result<()> {
        Err(engine_fail!("test::backend", Error::NotImplemented("scissor")))
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// MACROS THROUGH A CUSTOM LOGGER
// ============================================================================

#[test]
#[serial]
fn test_integration_error_macros_reach_logger() {
    let entries = capture_logs();

    let backend_error = engine_err!("test::macros", "queue {} lost", 3);
    let warning = engine_warn_err!("test::macros", "slow path");
    let typed = engine_fail!("test::macros", Error::Timeout);

    assert!(matches!(backend_error, Error::BackendError(ref msg) if msg == "queue 3 lost"));
    assert!(matches!(warning, Error::BackendError(_)));
    assert!(matches!(typed, Error::Timeout));

    let captured = entries.lock().unwrap();
    let severities: Vec<LogSeverity> = captured.iter().map(|e| e.severity).collect();
    assert_eq!(severities, vec![LogSeverity::Error, LogSeverity::Warn, LogSeverity::Error]);
    assert!(captured.iter().all(|e| e.source == "test::macros"));
    // Detailed entries carry the call site
    assert!(captured[0].file.is_some() && captured[0].line.is_some());
    drop(captured);

    Engine::reset_logger();
}

// ============================================================================
// REGISTRY
// ============================================================================

#[test]
#[serial]
fn test_integration_backend_driven_as_trait_object() {
    Engine::shutdown();
    Engine::initialize().unwrap();
    let entries = capture_logs();

    let backend = RecordingBackend {
        caps: RenderDeviceCaps::default(),
        platform: "vulkan_1_0".to_string(),
        calls: Vec::new(),
    };
    Engine::create_render_engine("main", backend).unwrap();

    let handle = Engine::render_engine("main").unwrap();
    {
        let mut engine = handle.lock().unwrap();
        engine.begin_frame().unwrap();
        engine.end_frame().unwrap();
        assert!(engine.resize(0, 600).is_err());
        assert!(matches!(engine.scissor_rect(Rect::default()), Err(Error::NotImplemented(_))));

        engine.set_capability(CapabilityValue::Platform("d3d_12_0".to_string()));
        assert_eq!(
            engine.capability(Capability::Platform),
            Some(CapabilityValue::Platform("d3d_12_0".to_string()))
        );
        assert_eq!(engine.shader_profile(ShaderStage::Vertex), "vs_5_0");
        assert_eq!(engine.capability(Capability::MajorVersion), None);
    }

    // The failed resize and the scissor both logged an error
    let errors = entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.severity == LogSeverity::Error && e.source == "test::backend")
        .count();
    assert_eq!(errors, 2);

    Engine::destroy_render_engine("main").unwrap();
    assert!(Engine::render_engine("main").is_err());

    Engine::reset_logger();
    Engine::shutdown();
}
