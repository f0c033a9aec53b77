//! Bridge from the `log` facade to a host-provided sink.
//!
//! Hosts without a Rust logging stack (a mobile shell, a plugin runtime)
//! implement [`Logger`] and hand it to [`set_logger`] once at startup. Binaries
//! that already install a `log`-compatible subscriber do not need this module.

use std::sync::{Arc, OnceLock};

use crate::error::{TripKitError, TripKitResult};

/// A sink receiving formatted log lines.
///
/// # Examples
///
/// ```rust
/// use tripkit_core::logger::{LogLevel, Logger};
///
/// struct Stderr;
///
/// impl Logger for Stderr {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
pub trait Logger: Sync + Send {
    /// Records `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a forwarded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of normal operations.
    Info,
    /// Something degraded but recoverable, such as a retried relay call.
    Warn,
    /// An operation failed.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

static SINK: OnceLock<Arc<dyn Logger>> = OnceLock::new();

struct Forwarder;

impl log::Log for Forwarder {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }
        if let Some(sink) = SINK.get() {
            sink.log(record.level().into(), record.args().to_string());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records are only forwarded from our own modules, so a
/// chatty dependency cannot flood the host.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let verbose = matches!(level, log::Level::Debug | log::Level::Trace);
    !verbose || module_path.is_some_and(|path| path.starts_with("tripkit"))
}

/// Installs `logger` as the destination of every `log` record.
///
/// # Errors
///
/// Returns [`TripKitError::Environment`] if a sink or another `log` backend
/// was already installed in this process. A failed call leaves no sink
/// behind.
pub fn set_logger(logger: Arc<dyn Logger>) -> TripKitResult<()> {
    static FORWARDER: Forwarder = Forwarder;

    install(&SINK, logger, || {
        log::set_logger(&FORWARDER)
            .map_err(|err| TripKitError::Environment(format!("failed to set logger: {err}")))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    })
}

/// The `log` backend goes in first so a foreign backend leaves `sink` empty.
fn install(
    sink: &OnceLock<Arc<dyn Logger>>,
    logger: Arc<dyn Logger>,
    install_backend: impl FnOnce() -> TripKitResult<()>,
) -> TripKitResult<()> {
    if sink.get().is_some() {
        return Err(TripKitError::Environment("logger already set".to_string()));
    }
    install_backend()?;
    sink.set(logger)
        .map_err(|_| TripKitError::Environment("logger already set".to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use test_case::test_case;

    use super::*;

    #[test_case(log::Level::Error, Some("hyper::client"), true)]
    #[test_case(log::Level::Warn, None, true)]
    #[test_case(log::Level::Info, Some("rustls"), true)]
    #[test_case(log::Level::Debug, Some("tripkit_core::vault"), true)]
    #[test_case(log::Level::Debug, Some("hyper::client"), false)]
    #[test_case(log::Level::Trace, None, false)]
    fn test_forwarding_filter(level: log::Level, module: Option<&str>, expected: bool) {
        assert_eq!(should_forward(level, module), expected);
    }

    #[derive(Default)]
    struct Collector(Mutex<Vec<(LogLevel, String)>>);

    impl Logger for Collector {
        fn log(&self, level: LogLevel, message: String) {
            self.0.lock().expect("lock").push((level, message));
        }
    }

    #[test]
    fn test_foreign_backend_leaves_no_sink_behind() {
        let sink = OnceLock::new();
        let result = install(&sink, Arc::new(Collector::default()), || {
            Err(TripKitError::Environment("failed to set logger: taken".to_string()))
        });
        match result {
            Err(TripKitError::Environment(message)) => assert!(message.contains("taken")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(sink.get().is_none());

        install(&sink, Arc::new(Collector::default()), || Ok(())).expect("retry");
        assert!(sink.get().is_some());
    }

    #[test]
    fn test_records_reach_the_sink_once_installed() {
        let collector = Arc::new(Collector::default());
        set_logger(collector.clone()).expect("first install");
        assert!(set_logger(Arc::new(Collector::default())).is_err());

        log::warn!("relay retry scheduled");
        let seen = collector.0.lock().expect("lock");
        assert!(seen
            .iter()
            .any(|(level, message)| *level == LogLevel::Warn && message == "relay retry scheduled"));
    }
}
