//! Bridge from the `log` facade to an embedder-provided [`Logger`].
//!
//! Keyring code logs through `tracing`, whose `log` feature re-emits every
//! event as a `log` record while no `tracing` subscriber is installed. Hosts
//! that cannot install a subscriber call [`set_logger`] once at startup to
//! receive those records. Debug and trace records from other crates are
//! dropped.

use std::sync::{Arc, OnceLock};

/// Receiver for log messages emitted by the keyring.
///
/// The keyring logs through `tracing`; when no `tracing` subscriber is
/// installed those events reach the `log` facade, which this module forwards
/// to the embedder's `Logger`.
///
/// # Examples
///
/// ```rust
/// use keyring_core::logger::{Logger, LogLevel};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{:?}] {}", level, message);
///     }
/// }
/// ```
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a forwarded log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Very low priority, often extremely detailed messages.
    Trace,
    /// Lower priority debugging information.
    Debug,
    /// Progress of keyring operations.
    Info,
    /// Potentially harmful situations.
    Warn,
    /// Failures.
    Error,
}

/// `log::Log` implementation forwarding to the embedder's `Logger`.
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let is_record_from_keyring = record
            .module_path()
            .is_some_and(|module_path| module_path.starts_with("keyring"));
        let is_debug_or_trace_level =
            record.level() == log::Level::Debug || record.level() == log::Level::Trace;

        // Debug and trace noise from dependencies is dropped.
        if is_debug_or_trace_level && !is_record_from_keyring {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Sets the global logger. Only the first call has an effect.
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use log::Log as _;

    use super::*;

    #[derive(Default)]
    struct CapturingLogger {
        records: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for CapturingLogger {
        fn log(&self, level: LogLevel, message: String) {
            self.records.lock().unwrap().push((level, message));
        }
    }

    fn forward(level: log::Level, module: &str, message: &str) {
        ForeignLogger.log(
            &log::Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .module_path(Some(module))
                .build(),
        );
    }

    #[test]
    fn test_forwards_keyring_records_and_filters_dependency_noise() {
        let capture = Arc::new(CapturingLogger::default());
        set_logger(capture.clone());

        forward(log::Level::Debug, "keyring_core::keyring", "queued r1");
        forward(log::Level::Debug, "hyper::client", "connection pooled");
        forward(log::Level::Trace, "tokio::runtime", "parked");
        forward(log::Level::Warn, "hyper::client", "connection reset");

        let records = capture.records.lock().unwrap().clone();
        assert!(records.contains(&(LogLevel::Debug, "queued r1".to_string())));
        assert!(records.contains(&(LogLevel::Warn, "connection reset".to_string())));
        assert!(!records.iter().any(|(_, m)| m == "connection pooled" || m == "parked"));
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(log_level(log::Level::Warn), LogLevel::Warn);
        assert_eq!(log_level(log::Level::Trace), LogLevel::Trace);
    }
}
