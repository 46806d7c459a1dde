use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Number of entries kept in the diagnostics buffer
const LOG_CAPACITY: usize = 1000;

/// Log level enum for type-safe logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Log entry with optional structured context
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component that produced the entry ("timeline", "history", "offline_cache", ...)
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<HashMap<String, serde_json::Value>>,
}

/// Commands for the logger thread
enum LogCommand {
    Log(LogEntry),
    GetLogs(Sender<Vec<LogEntry>>),
    Clear,
}

/// Buffered diagnostics logger.
///
/// Entries are pushed over a bounded channel to a background thread that
/// owns a fixed-size ring; the oldest entry is dropped once it is full.
/// Logging never blocks the caller: a full channel drops the entry.
pub struct Logger {
    sender: Sender<LogCommand>,
    min_level: Arc<AtomicU8>,
}

impl Logger {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    /// Logger whose ring keeps at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = bounded(LOG_CAPACITY.max(capacity));
        let min_level = Arc::new(AtomicU8::new(LogLevel::Debug as u8));

        std::thread::spawn(move || {
            Self::logger_thread(receiver, capacity);
        });

        Self { sender, min_level }
    }

    fn logger_thread(receiver: Receiver<LogCommand>, capacity: usize) {
        let mut buffer: VecDeque<LogEntry> = VecDeque::with_capacity(capacity);

        for cmd in receiver {
            match cmd {
                LogCommand::Log(entry) => {
                    if buffer.len() == capacity {
                        buffer.pop_front();
                    }
                    buffer.push_back(entry);
                }
                LogCommand::GetLogs(response_tx) => {
                    let _ = response_tx.send(buffer.iter().cloned().collect());
                }
                LogCommand::Clear => buffer.clear(),
            }
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        (level as u8) >= self.min_level.load(Ordering::Relaxed)
    }

    /// Log with enum level (non-blocking)
    pub fn log(&self, level: LogLevel, message: &str, source: &'static str) {
        if !self.enabled(level) {
            return;
        }

        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            source,
            context: None,
        };

        let _ = self.sender.try_send(LogCommand::Log(entry));
    }

    /// Log with structured context
    pub fn log_with_context(
        &self,
        level: LogLevel,
        message: &str,
        source: &'static str,
        context: HashMap<String, serde_json::Value>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            source,
            context: Some(context),
        };

        let _ = self.sender.try_send(LogCommand::Log(entry));
    }

    /// Set minimum log level (runtime filtering)
    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_min_level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Relaxed))
    }

    /// Snapshot of buffered entries in chronological order
    pub fn get_logs(&self) -> Vec<LogEntry> {
        let (response_tx, response_rx) = bounded(1);
        if self.sender.send(LogCommand::GetLogs(response_tx)).is_ok() {
            response_rx.recv().unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    /// Buffered entries produced by one component
    pub fn get_logs_for(&self, source: &str) -> Vec<LogEntry> {
        self.get_logs()
            .into_iter()
            .filter(|entry| entry.source == source)
            .collect()
    }

    pub fn clear_logs(&self) {
        let _ = self.sender.send(LogCommand::Clear);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

// Global logger instance
lazy_static::lazy_static! {
    pub static ref LOGGER: Logger = Logger::new();
}

/// Log to the diagnostics buffer and the `log` facade.
///
/// `app_log!(LogLevel::Info, "timeline", "Loaded {}s of media", duration)`
#[macro_export]
macro_rules! app_log {
    ($level:expr, $source:expr, $($arg:tt)*) => {
        {
            use $crate::logger::LogLevel;
            let message = format!($($arg)*);
            $crate::logger::LOGGER.log($level, &message, $source);
            match $level {
                LogLevel::Error => log::error!(target: $source, "{}", message),
                LogLevel::Warn => log::warn!(target: $source, "{}", message),
                LogLevel::Info => log::info!(target: $source, "{}", message),
                LogLevel::Debug => log::debug!(target: $source, "{}", message),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_round_trip() {
        for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            assert_eq!(LogLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_ring_drops_oldest() {
        let logger = Logger::with_capacity(3);
        for i in 0..5 {
            logger.log(LogLevel::Info, &format!("entry {}", i), "test");
        }

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "entry 2");
        assert_eq!(logs[2].message, "entry 4");
    }

    #[test]
    fn test_min_level_filters() {
        let logger = Logger::with_capacity(10);
        logger.set_min_level(LogLevel::Warn);
        assert_eq!(logger.get_min_level(), LogLevel::Warn);

        logger.log(LogLevel::Info, "ignored", "test");
        logger.log(LogLevel::Error, "kept", "test");

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "kept");
    }

    #[test]
    fn test_filter_by_source_and_clear() {
        let logger = Logger::with_capacity(10);
        logger.log(LogLevel::Info, "a", "timeline");
        logger.log(LogLevel::Info, "b", "history");

        let timeline_logs = logger.get_logs_for("timeline");
        assert_eq!(timeline_logs.len(), 1);
        assert_eq!(timeline_logs[0].message, "a");

        logger.clear_logs();
        assert!(logger.get_logs().is_empty());
    }
}
