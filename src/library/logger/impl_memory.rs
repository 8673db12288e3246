use crate::library::logger::interface::{join_namespace, Level, LogResult, Logger};
use std::sync::{Arc, Mutex};

/// Keeps every line in memory so tests can assert on what was logged.
#[derive(Debug, Clone, Default)]
pub struct LoggerMemory {
    namespace: Option<String>,
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl LoggerMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn contains(&self, level: Level, fragment: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, line)| *l == level && line.contains(fragment))
    }
}

impl Logger for LoggerMemory {
    fn log(&self, level: Level, message: &str) -> LogResult {
        let line = match &self.namespace {
            Some(namespace) => format!("{}: {}", namespace, message),
            None => message.to_string(),
        };
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, line));
        Ok(())
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync> {
        Arc::new(LoggerMemory {
            namespace: Some(join_namespace(self.namespace.as_deref(), namespace)),
            lines: self.lines.clone(),
        })
    }
}
