/// VkForge Engine - Singleton manager for render engines and logging
///
/// Render engines are registered under a name so that several backends (or
/// several windows) can coexist. Storage is a process-wide `OnceLock` guarded
/// by `RwLock`s.

use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use rustc_hash::FxHashMap;
use crate::render::RenderEngine;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Render engines by name
struct EngineState {
    render_engines: RwLock<FxHashMap<String, Arc<Mutex<dyn RenderEngine>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            render_engines: RwLock::new(FxHashMap::default()),
        }
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use vkforge_engine::vkforge::{Engine, render::RenderFactory};
/// use vkforge_engine_renderer_vulkan::make_render_factory;
///
/// # fn run(window: &winit::window::Window) -> vkforge_engine::vkforge::Result<()> {
/// Engine::initialize()?;
///
/// let mut factory = make_render_factory(Default::default());
/// let render_engine = factory.make_render_engine(window, Default::default())?;
/// Engine::create_render_engine("main", render_engine)?;
///
/// let main = Engine::render_engine("main")?;
///
/// Engine::shutdown();
/// # Ok(())
/// # }
/// ```
pub struct Engine;

impl Engine {
    /// Log an engine error before handing it back to the caller
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("vkforge::Engine", "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!("vkforge::Engine", "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!("vkforge::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))
    }

    /// Initialize the engine
    ///
    /// Idempotent. Must run before any render engine is registered.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Drop every registered render engine
    ///
    /// Outstanding `Arc`s held by callers stay valid until they are dropped.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut engines) = state.render_engines.write() {
                engines.clear();
            }
        }
    }

    /// Register a render engine under `name`
    ///
    /// # Arguments
    ///
    /// * `name` - Unique registry key
    /// * `render_engine` - Any type implementing `RenderEngine`
    ///
    /// # Errors
    ///
    /// Fails if the engine is not initialized or `name` is already taken.
    pub fn create_render_engine<R: RenderEngine + 'static>(name: &str, render_engine: R) -> Result<Arc<Mutex<dyn RenderEngine>>> {
        let state = Self::state()?;

        let mut engines = state.render_engines.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Render engine registry lock poisoned".to_string())
            ))?;

        if engines.contains_key(name) {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed(format!(
                    "Render engine '{}' already exists. Call Engine::destroy_render_engine() first.", name
                ))
            ));
        }

        let shared: Arc<Mutex<dyn RenderEngine>> = Arc::new(Mutex::new(render_engine));
        engines.insert(name.to_string(), shared.clone());

        crate::engine_info!("vkforge::Engine", "Render engine '{}' created", name);

        Ok(shared)
    }

    /// Look up a registered render engine
    pub fn render_engine(name: &str) -> Result<Arc<Mutex<dyn RenderEngine>>> {
        let state = Self::state()?;

        let engines = state.render_engines.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Render engine registry lock poisoned".to_string())
            ))?;

        engines.get(name)
            .cloned()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed(format!("Render engine '{}' not found", name))
            ))
    }

    /// Unregister a render engine. Unknown names are ignored.
    pub fn destroy_render_engine(name: &str) -> Result<()> {
        let state = Self::state()?;

        let mut engines = state.render_engines.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Render engine registry lock poisoned".to_string())
            ))?;

        if engines.remove(name).is_some() {
            crate::engine_info!("vkforge::Engine", "Render engine '{}' destroyed", name);
        }

        Ok(())
    }

    /// Names of all registered render engines
    pub fn render_engine_names() -> Vec<String> {
        ENGINE_STATE.get()
            .and_then(|state| state.render_engines.read().ok().map(|engines| engines.keys().cloned().collect()))
            .unwrap_or_default()
    }

    /// Number of registered render engines
    pub fn render_engine_count() -> usize {
        ENGINE_STATE.get()
            .and_then(|state| state.render_engines.read().ok().map(|engines| engines.len()))
            .unwrap_or(0)
    }

    /// Clear all registrations (test builds only)
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
    }

    // ===== LOGGING API =====

    /// Replace the global logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use vkforge_engine::vkforge::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to `DefaultLogger`
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Log without source location (used by engine_info!, engine_warn!, ...)
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level
    /// * `source` - Source module (e.g., "vkforge::vulkan")
    /// * `message` - Log message
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line information (used by engine_error! and engine_err!)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
