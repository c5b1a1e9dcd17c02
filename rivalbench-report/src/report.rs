//! Report Data Structures

use chrono::{DateTime, Utc};
use rivalbench_core::{CompetitionTarget, Message, MessageSeverity, MessageSource};
use serde::{Deserialize, Serialize};

/// Current report schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Complete competition report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionReport {
    /// Report metadata
    pub meta: ReportMeta,
    /// Runs performed
    pub runs: u32,
    /// Reruns still requested when the competition stopped
    pub runs_left: u32,
    /// Whether reruns were still requested after the last allowed run
    pub run_limit_exceeded: bool,
    /// Highest severity logged during the session
    pub highest_severity: MessageSeverity,
    /// Session log in write order
    pub messages: Vec<ReportMessage>,
    /// Targets whose limits were widened
    pub adjusted_targets: Vec<AdjustedTargetEntry>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Report schema version
    pub schema_version: u32,
    /// rivalbench version that wrote the report
    pub version: String,
    /// When the report was built
    pub timestamp: DateTime<Utc>,
    /// Benchmark (suite) name the competition ran
    pub benchmark: String,
}

impl ReportMeta {
    /// Metadata stamped with the current time
    pub fn new(benchmark: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            benchmark: benchmark.into(),
        }
    }
}

/// Flattened log message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMessage {
    /// Run the message belongs to
    pub run: u32,
    /// Message number within its run
    pub sequence: u32,
    /// Seconds since the session started
    pub elapsed_secs: f64,
    /// Component that wrote the message
    pub source: MessageSource,
    /// Message severity
    pub severity: MessageSeverity,
    /// Message text
    pub text: String,
    /// Suggested remedy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&Message> for ReportMessage {
    fn from(message: &Message) -> Self {
        Self {
            run: message.run_number(),
            sequence: message.run_message_number(),
            elapsed_secs: message.elapsed().as_secs_f64(),
            source: message.source(),
            severity: message.severity(),
            text: message.text().to_string(),
            hint: message.hint().map(str::to_string),
        }
    }
}

/// Limit of a target after adjustment. `None` bounds are unset or ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedTargetEntry {
    /// Target name
    pub target: String,
    /// Numeric lower bound
    pub min: Option<f64>,
    /// Numeric upper bound
    pub max: Option<f64>,
    /// Display form, e.g. `[0.95..1.20]`
    pub limit: String,
}

impl From<&CompetitionTarget> for AdjustedTargetEntry {
    fn from(target: &CompetitionTarget) -> Self {
        let limit = target.limit();
        Self {
            target: target.target().to_string(),
            min: limit.min().value(),
            max: limit.max().value(),
            limit: limit.to_string(),
        }
    }
}

impl CompetitionReport {
    /// Number of messages at `severity` or above
    pub fn count_at_least(&self, severity: MessageSeverity) -> usize {
        self.messages.iter().filter(|m| m.severity >= severity).count()
    }

    /// Whether the competition passed (nothing at TestError or above)
    pub fn passed(&self) -> bool {
        !self.highest_severity.is_test_error_or_higher()
    }
}
