use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Bounded in-memory log buffer for UI display. Appending at capacity
/// evicts the oldest entry; draining returns and clears everything.
///
/// Owned by the serving layer and shared explicitly, not global state.
#[derive(Debug)]
pub struct LogBuffer {
    entries: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn append(&self, entry: String) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn drain(&self) -> Vec<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

/// `log` facade adapter that formats records as `HH:MM:SS - LEVEL - message`
/// into a shared [`LogBuffer`].
pub struct BufferLogger {
    buffer: Arc<LogBuffer>,
    level: LevelFilter,
}

impl BufferLogger {
    pub fn new(buffer: Arc<LogBuffer>, level: LevelFilter) -> Self {
        Self { buffer, level }
    }

    /// Install as the global logger. Fails if one is already set.
    pub fn install(buffer: Arc<LogBuffer>, level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(buffer, level)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn format(level: Level, message: &std::fmt::Arguments) -> String {
        format!("{} - {} - {}", Local::now().format("%H:%M:%S"), level, message)
    }
}

impl Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.buffer.append(Self::format(record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}
