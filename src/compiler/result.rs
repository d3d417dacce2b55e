//! Compilation Results and Logs
//!
//! [`CompilerResult`] is what one `compile` call returns: the module
//! label, the ordered log, the bytecode (ready or pending), and the
//! used-parameter snapshot the compiled program depends on. The result is
//! immutable once returned.
//!
//! An all-empty result means "nothing to compile", not "success with an
//! empty program" — result fields are only populated when there is
//! something to report.

use std::fmt;

use crate::compiler::backend::CompiledBytecode;
use crate::params::ParameterSet;

/// Severity of one log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
    /// Configuration errors that aborted the compilation.
    Fatal,
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogSeverity::Info => "info",
            LogSeverity::Warning => "warning",
            LogSeverity::Error => "error",
            LogSeverity::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// One ordered log entry with an optional source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub message: String,
    /// Fragment name or other source location, when known.
    pub location: Option<String>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {} ({})", self.severity, self.message, location),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Ordered compilation log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectLog {
    entries: Vec<LogEntry>,
}

impl EffectLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogEntry {
            severity: LogSeverity::Info,
            message: message.into(),
            location: None,
        });
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogEntry {
            severity: LogSeverity::Warning,
            message: message.into(),
            location: None,
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogEntry {
            severity: LogSeverity::Error,
            message: message.into(),
            location: None,
        });
    }

    pub fn error_at(&mut self, message: impl Into<String>, location: impl Into<String>) {
        self.push(LogEntry {
            severity: LogSeverity::Error,
            message: message.into(),
            location: Some(location.into()),
        });
    }

    pub fn fatal(&mut self, message: impl Into<String>) {
        self.push(LogEntry {
            severity: LogSeverity::Fatal,
            message: message.into(),
            location: None,
        });
    }

    /// Appends all of `other`'s entries.
    pub fn merge(&mut self, other: &EffectLog) {
        self.entries.extend(other.entries.iter().cloned());
    }

    /// Whether any entry is `Error` or `Fatal`.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.severity >= LogSeverity::Error)
    }

    /// Entries in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The outcome of one `compile` call.
#[derive(Debug, Clone, Default)]
pub struct CompilerResult {
    module_name: String,
    log: EffectLog,
    bytecode: Option<CompiledBytecode>,
    used_parameters: ParameterSet,
}

impl CompilerResult {
    pub(crate) fn named(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn set_log(&mut self, log: EffectLog) {
        self.log = log;
    }

    pub(crate) fn log_mut(&mut self) -> &mut EffectLog {
        &mut self.log
    }

    pub(crate) fn set_bytecode(&mut self, bytecode: CompiledBytecode) {
        self.bytecode = Some(bytecode);
    }

    pub(crate) fn set_used_parameters(&mut self, used: ParameterSet) {
        self.used_parameters = used;
    }

    /// Human-readable module label, derived from the mixin tree's name.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// The ordered compilation log.
    #[must_use]
    pub fn log(&self) -> &EffectLog {
        &self.log
    }

    /// The compiled bytecode, ready or pending. `None` when compilation
    /// failed or there was nothing to compile.
    #[must_use]
    pub fn bytecode(&self) -> Option<&CompiledBytecode> {
        self.bytecode.as_ref()
    }

    /// The parameter subset the compiled program actually depends on.
    #[must_use]
    pub fn used_parameters(&self) -> &ParameterSet {
        &self.used_parameters
    }

    /// Whether the result carries neither bytecode nor log entries —
    /// "nothing to compile".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytecode.is_none() && self.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_severity_ordering() {
        assert!(LogSeverity::Fatal > LogSeverity::Error);
        assert!(LogSeverity::Error > LogSeverity::Warning);
    }

    #[test]
    fn test_has_errors() {
        let mut log = EffectLog::new();
        log.info("composed 3 fragments");
        assert!(!log.has_errors());

        log.error_at("fragment failed to parse", "SurfaceBase");
        assert!(log.has_errors());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_entry_display_includes_location() {
        let entry = LogEntry {
            severity: LogSeverity::Error,
            message: "undefined symbol".to_string(),
            location: Some("LightPoint".to_string()),
        };
        assert_eq!(entry.to_string(), "error: undefined symbol (LightPoint)");
    }

    #[test]
    fn test_empty_result_means_nothing_to_compile() {
        let result = CompilerResult::named("Effect");
        assert!(result.is_empty());
        assert_eq!(result.module_name(), "Effect");
    }
}
