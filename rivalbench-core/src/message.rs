//! Competition Messages
//!
//! Severity-tagged records written during a competition session. Messages are
//! immutable once created and ordered by their position in the log.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Component that produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSource {
    /// Origin not known
    Unknown,
    /// The run loop itself
    Runner,
    /// Summary validation
    Validator,
    /// Limit analysis
    Analyser,
    /// Diagnostics collection
    Diagnoser,
    /// Report export
    Exporter,
}

impl std::fmt::Display for MessageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageSource::Unknown => "Unknown",
            MessageSource::Runner => "Runner",
            MessageSource::Validator => "Validator",
            MessageSource::Analyser => "Analyser",
            MessageSource::Diagnoser => "Diagnoser",
            MessageSource::Exporter => "Exporter",
        };
        f.write_str(name)
    }
}

/// Message severity, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MessageSeverity {
    /// Progress information
    #[default]
    Informational,
    /// Worth a look, does not fail the competition
    Warning,
    /// The competition result is wrong (limits failed, run limit exceeded)
    TestError,
    /// The competition was configured incorrectly
    SetupError,
    /// Execution itself failed
    ExecutionError,
}

impl MessageSeverity {
    /// Errors that make further runs pointless
    pub fn is_critical_error(self) -> bool {
        self >= MessageSeverity::SetupError
    }

    /// Any error, including test failures
    pub fn is_test_error_or_higher(self) -> bool {
        self >= MessageSeverity::TestError
    }
}

impl std::fmt::Display for MessageSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageSeverity::Informational => "Informational",
            MessageSeverity::Warning => "Warning",
            MessageSeverity::TestError => "TestError",
            MessageSeverity::SetupError => "SetupError",
            MessageSeverity::ExecutionError => "ExecutionError",
        };
        f.write_str(name)
    }
}

/// A single log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    run_number: u32,
    run_message_number: u32,
    elapsed: Duration,
    source: MessageSource,
    severity: MessageSeverity,
    text: String,
    hint: Option<String>,
}

impl Message {
    /// Create a message
    pub fn new(
        run_number: u32,
        run_message_number: u32,
        elapsed: Duration,
        source: MessageSource,
        severity: MessageSeverity,
        text: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            run_number,
            run_message_number,
            elapsed,
            source,
            severity,
            text: text.into(),
            hint,
        }
    }

    /// Run the message was written in (0 = before the first run)
    pub fn run_number(&self) -> u32 {
        self.run_number
    }

    /// Sequence number within the run, starting at 1
    pub fn run_message_number(&self) -> u32 {
        self.run_message_number
    }

    /// Time since the session was initialised
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Producing component
    pub fn source(&self) -> MessageSource {
        self.source
    }

    /// Severity
    pub fn severity(&self) -> MessageSeverity {
        self.severity
    }

    /// Message text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Optional hint on how to resolve the problem
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{}.{} [{:.3}s] {} {}: {}",
            self.run_number,
            self.run_message_number,
            self.elapsed.as_secs_f64(),
            self.source,
            self.severity,
            self.text
        )?;
        if let Some(hint) = &self.hint {
            write!(f, "\n    Hint: {}", hint)?;
        }
        Ok(())
    }
}
