//! Host log sink capability.
//!
//! The host hands the tuner a logging callback at init time. Inside the crate
//! that callback is just a [`LogSink`]; the plugin crate adapts the C function
//! pointer, tests substitute a [`RecordingSink`], and [`TracingSink`] forwards
//! to `tracing` for embedders without a host logger.
//!
//! Logging is fire-and-forget: sinks never report failure back to the caller.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::PLUGIN_NAME;
use crate::types::{LogLevel, Subsys};

/// Destination for tuner log lines.
pub trait LogSink: Send + Sync {
    /// Deliver one fully formatted line.
    fn log(&self, level: LogLevel, subsys: Subsys, file: &str, line: u32, msg: &str);
}

/// Shared, nullable-at-the-edges reference to a sink.
pub type SharedSink = Arc<dyn LogSink>;

/// Format a line with the plugin prefix and hand it to `sink`, or to `tracing`
/// when no sink was supplied.
pub fn emit(
    sink: Option<&dyn LogSink>,
    level: LogLevel,
    subsys: Subsys,
    file: &str,
    line: u32,
    args: fmt::Arguments<'_>,
) {
    let msg = format!("[{PLUGIN_NAME}] {args}");
    match sink {
        Some(s) => s.log(level, subsys, file, line, &msg),
        None => forward_to_tracing(level, subsys, file, line, &msg),
    }
}

/// Log through an optional sink, capturing the call site.
///
/// ```ignore
/// plugin_log!(ctx.sink(), LogLevel::Info, Subsys::INIT, "Initialized.");
/// ```
#[macro_export]
macro_rules! plugin_log {
    ($sink:expr, $level:expr, $subsys:expr, $($arg:tt)+) => {
        $crate::log::emit(
            $sink,
            $level,
            $subsys,
            file!(),
            line!(),
            format_args!($($arg)+),
        )
    };
}

fn forward_to_tracing(level: LogLevel, subsys: Subsys, file: &str, line: u32, msg: &str) {
    let subsys = subsys.bits();
    match level {
        LogLevel::None => {}
        LogLevel::Abort => tracing::error!(subsys, file, line, "{msg}"),
        LogLevel::Warn => tracing::warn!(subsys, file, line, "{msg}"),
        LogLevel::Version | LogLevel::Info => tracing::info!(subsys, file, line, "{msg}"),
        LogLevel::Trace => tracing::trace!(subsys, file, line, "{msg}"),
    }
}

/// Sink that forwards every line to the active `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, subsys: Subsys, file: &str, line: u32, msg: &str) {
        forward_to_tracing(level, subsys, file, line, msg);
    }
}

/// One captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub subsys: Subsys,
    pub file: String,
    pub line: u32,
    pub msg: String,
}

/// Sink that keeps every line in memory. Useful for asserting on log output.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages only, in order.
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.msg).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.records.lock() {
            guard.clear();
        }
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: LogLevel, subsys: Subsys, file: &str, line: u32, msg: &str) {
        // A poisoned recorder drops the line rather than failing the caller.
        if let Ok(mut guard) = self.records.lock() {
            guard.push(LogRecord {
                level,
                subsys,
                file: file.to_owned(),
                line,
                msg: msg.to_owned(),
            });
        }
    }
}
