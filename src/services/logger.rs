use crate::constants::env;
use crate::utils::feature_flags::is_debug_enabled;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn from_env() -> Self {
        match std::env::var(env::LOG_LEVEL)
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    fn rank(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    error: u64,
    warn: u64,
    info: u64,
    debug: u64,
}

/// Where formatted lines go. Stdout carries the MCP protocol, so the server
/// only ever writes to stderr.
#[derive(Debug, Clone)]
enum Sink {
    Stderr,
    Memory(Arc<Mutex<Vec<String>>>),
}

#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
    level: LogLevel,
    sink: Sink,
    counters: Arc<Mutex<Counters>>,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            level: LogLevel::from_env(),
            sink: Sink::Stderr,
            counters: Arc::new(Mutex::new(Counters::default())),
        }
    }

    /// Logger that keeps every line in memory; read them back with `lines`.
    pub fn in_memory(context: &str) -> Self {
        Self {
            context: context.to_string(),
            level: LogLevel::from_env(),
            sink: Sink::Memory(Arc::new(Mutex::new(Vec::new()))),
            counters: Arc::new(Mutex::new(Counters::default())),
        }
    }

    pub fn child(&self, suffix: &str) -> Self {
        let context = if suffix.is_empty() {
            self.context.clone()
        } else {
            format!("{}:{}", self.context, suffix)
        };
        Self {
            context,
            level: self.level,
            sink: self.sink.clone(),
            counters: self.counters.clone(),
        }
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    /// Debug output is on when the level allows it or the
    /// `QUICKFILE_DEBUG` toggle is set.
    pub fn debug_enabled(&self) -> bool {
        self.level.rank() >= LogLevel::Debug.rank() || is_debug_enabled()
    }

    fn allows(&self, level: LogLevel) -> bool {
        if level == LogLevel::Debug {
            return self.debug_enabled();
        }
        level.rank() <= self.level.rank()
    }

    fn log(&self, level: LogLevel, message: &str, meta: Option<&serde_json::Value>) {
        if !self.allows(level) {
            return;
        }
        if let Ok(mut counters) = self.counters.lock() {
            match level {
                LogLevel::Error => counters.error += 1,
                LogLevel::Warn => counters.warn += 1,
                LogLevel::Info => counters.info += 1,
                LogLevel::Debug => counters.debug += 1,
            }
        }
        let meta_suffix = meta
            .filter(|m| !m.is_null())
            .map(|m| format!(" {}", m))
            .unwrap_or_default();
        let line = format!(
            "[{}] {} [{}] {}{}",
            chrono::Utc::now().to_rfc3339(),
            level.label(),
            self.context,
            message,
            meta_suffix
        );
        match &self.sink {
            Sink::Stderr => eprintln!("{}", line),
            Sink::Memory(lines) => {
                if let Ok(mut guard) = lines.lock() {
                    guard.push(line);
                }
            }
        }
    }

    pub fn error(&self, message: &str, meta: Option<&serde_json::Value>) {
        self.log(LogLevel::Error, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Option<&serde_json::Value>) {
        self.log(LogLevel::Warn, message, meta);
    }

    pub fn info(&self, message: &str, meta: Option<&serde_json::Value>) {
        self.log(LogLevel::Info, message, meta);
    }

    pub fn debug(&self, message: &str, meta: Option<&serde_json::Value>) {
        self.log(LogLevel::Debug, message, meta);
    }

    /// Lines captured by an `in_memory` logger (and its children). Empty for
    /// stderr loggers.
    pub fn lines(&self) -> Vec<String> {
        match &self.sink {
            Sink::Stderr => Vec::new(),
            Sink::Memory(lines) => lines
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default(),
        }
    }

    pub fn stats(&self) -> serde_json::Value {
        let counters = self.counters.lock().unwrap_or_else(|err| err.into_inner());
        serde_json::json!({
            "level": format!("{:?}", self.level).to_lowercase(),
            "context": self.context,
            "error": counters.error,
            "warn": counters.warn,
            "info": counters.info,
            "debug": counters.debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_logger_shares_lines_with_children() {
        let mut logger = Logger::in_memory("quickfile");
        logger.set_level(LogLevel::Info);
        let child = logger.child("client");
        child.info("hello", Some(&serde_json::json!({"n": 1})));
        child.debug("hidden unless debug toggle is on", None);

        let lines = logger.lines();
        assert!(lines
            .iter()
            .any(|line| line.contains("INFO [quickfile:client] hello {\"n\":1}")));
        assert_eq!(logger.stats()["info"], 1);
    }

    #[test]
    fn warn_level_filters_info() {
        let mut logger = Logger::in_memory("quickfile");
        logger.set_level(LogLevel::Warn);
        logger.info("dropped", None);
        logger.warn("kept", None);
        let lines = logger.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("WARN"));
    }
}
