//! Log entries and the status rule derived from them.

use serde::{Deserialize, Serialize};

/// Severity of a single auditor log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One human-readable observation made by an auditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }
}

/// Overall verdict of one audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Pass,
    Warn,
    Fail,
}

impl AuditStatus {
    /// Any ERROR => FAIL, else any WARNING => WARN, else PASS.
    pub fn from_logs(logs: &[LogEntry]) -> Self {
        if logs.iter().any(|l| l.level == LogLevel::Error) {
            AuditStatus::Fail
        } else if logs.iter().any(|l| l.level == LogLevel::Warning) {
            AuditStatus::Warn
        } else {
            AuditStatus::Pass
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Pass => "PASS",
            AuditStatus::Warn => "WARN",
            AuditStatus::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only log collector used while an auditor runs.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<LogEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push(LogEntry::new(level, message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn status(&self) -> AuditStatus {
        AuditStatus::from_logs(&self.entries)
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_pass_when_only_info() {
        let logs = vec![LogEntry::info("ok"), LogEntry::info("fine")];
        assert_eq!(AuditStatus::from_logs(&logs), AuditStatus::Pass);
        assert_eq!(AuditStatus::from_logs(&[]), AuditStatus::Pass);
    }

    #[test]
    fn test_status_warn_when_warning_without_error() {
        let logs = vec![LogEntry::info("ok"), LogEntry::warning("slow")];
        assert_eq!(AuditStatus::from_logs(&logs), AuditStatus::Warn);
    }

    #[test]
    fn test_status_fail_dominates() {
        let logs = vec![
            LogEntry::warning("slow"),
            LogEntry::error("broken"),
            LogEntry::info("ok"),
        ];
        assert_eq!(AuditStatus::from_logs(&logs), AuditStatus::Fail);
    }

    #[test]
    fn test_audit_log_collects_in_order() {
        let mut log = AuditLog::new();
        log.info("first");
        log.warn("second");
        log.error("third");
        let levels: Vec<LogLevel> = log.entries().iter().map(|e| e.level).collect();
        assert_eq!(
            levels,
            vec![LogLevel::Info, LogLevel::Warning, LogLevel::Error]
        );
        assert_eq!(log.status(), AuditStatus::Fail);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(LogLevel::Warning).unwrap(),
            serde_json::json!("WARNING")
        );
        assert_eq!(
            serde_json::to_value(AuditStatus::Warn).unwrap(),
            serde_json::json!("WARN")
        );
    }
}
