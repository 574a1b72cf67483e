//! Unit tests for log.rs
//!
//! Tests LogSeverity, LogEntry, DefaultLogger and the error-building macros.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::vkforge::{Engine, Error, Result};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "vkforge::vulkan".to_string(),
        message: "vkCreateBuffer failed".to_string(),
        file,
        line,
    }
}

/// Captures every entry routed through the global logger
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_format_plain_without_location() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(text.contains("[INFO ]"));
    assert!(text.contains("[vkforge::vulkan]"));
    assert!(text.ends_with("vkCreateBuffer failed"));
}

#[test]
fn test_format_plain_with_location() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("vulkan_buffer.rs"), Some(88)));
    assert!(text.contains("[ERROR]"));
    assert!(text.ends_with("(vulkan_buffer.rs:88)"));
}

#[test]
fn test_format_plain_timestamp_shape() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Debug, None, None));
    // [YYYY-MM-DD HH:MM:SS.mmm]
    let close = text.find(']').unwrap();
    assert_eq!(close, 24);
}

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("test.rs"), Some(42)));
    }
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

// ============================================================================
// ERROR MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = install_capture();

    let err = crate::engine_err!("vkforge::vulkan", "Failed to create fence: {}", -3);

    assert_eq!(err, Error::BackendError("Failed to create fence: -3".to_string()));
    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let entries = install_capture();

    fn fails(flag: bool) -> Result<u32> {
        if flag {
            crate::engine_bail!("vkforge::vulkan", "bail with {}", "flag");
        }
        Ok(7)
    }

    assert_eq!(fails(false), Ok(7));
    assert!(matches!(fails(true), Err(Error::BackendError(msg)) if msg == "bail with flag"));
    assert_eq!(entries.lock().unwrap().len(), 1);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_warn_err_uses_warn_severity() {
    let entries = install_capture();

    let _ = crate::engine_warn_err!("vkforge::vulkan", "staging free failed");

    assert_eq!(entries.lock().unwrap()[0].severity, LogSeverity::Warn);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_fail_keeps_error_kind() {
    let entries = install_capture();

    let err = crate::engine_fail!("vkforge::vulkan", Error::NotImplemented("texture map"));

    assert_eq!(err, Error::NotImplemented("texture map"));
    assert!(entries.lock().unwrap()[0].message.contains("texture map"));
    Engine::reset_logger();
}
