//! Competition State
//!
//! Run counters and the message log of one competition session.
//!
//! ```text
//! NotStarted ──first_time_init──▶ Running ──complete──▶ Completed
//!                                   │  ▲
//!                      prepare_for_run  request_reruns
//! ```
//!
//! Invariants:
//! - `run_number` only increases
//! - `runs_left` never goes below zero
//! - `last_run() ⇔ run_number >= max_runs_allowed`
//! - `looks_like_last_run() ⇔ runs_left == 0`

use crate::message::{Message, MessageSeverity, MessageSource};
use crate::summary::Summary;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// `first_time_init` called twice
    #[error("Competition state is already initialized")]
    AlreadyInitialized,

    /// Run requested before `first_time_init`
    #[error("Competition state is not initialized")]
    NotInitialized,

    /// Run requested after `complete`
    #[error("Competition is already completed")]
    AlreadyCompleted,

    /// Run cap of zero
    #[error("max_runs_allowed must be at least 1")]
    InvalidMaxRuns,

    /// Rerun request without a reason
    #[error("Rerun reason must not be empty")]
    EmptyReason,
}

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompetitionPhase {
    /// Created, not initialised
    #[default]
    NotStarted,
    /// Initialised, runs in progress
    Running,
    /// Run loop finished
    Completed,
}

/// Competition state shared through the run registry
pub type SharedCompetitionState = Arc<Mutex<CompetitionState>>;

/// Run counters and message log of a competition session
#[derive(Debug, Clone, Default)]
pub struct CompetitionState {
    phase: CompetitionPhase,
    run_number: u32,
    runs_left: u32,
    max_runs_allowed: u32,
    run_message_number: u32,
    started: Option<Instant>,
    messages: Vec<Message>,
    last_run_summary: Option<Summary>,
}

impl CompetitionState {
    /// Fresh state in the `NotStarted` phase
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the session: one run pending, no runs done
    pub fn first_time_init(&mut self, max_runs_allowed: u32) -> Result<(), StateError> {
        if self.phase != CompetitionPhase::NotStarted {
            return Err(StateError::AlreadyInitialized);
        }
        if max_runs_allowed == 0 {
            return Err(StateError::InvalidMaxRuns);
        }

        self.phase = CompetitionPhase::Running;
        self.max_runs_allowed = max_runs_allowed;
        self.runs_left = 1;
        self.run_number = 0;
        self.run_message_number = 0;
        self.started = Some(Instant::now());
        Ok(())
    }

    /// Consume one pending run and start the next one
    pub fn prepare_for_run(&mut self) -> Result<(), StateError> {
        self.ensure_running()?;
        self.runs_left = self.runs_left.saturating_sub(1);
        self.run_number += 1;
        self.run_message_number = 0;
        Ok(())
    }

    /// Store the summary of the finished run
    pub fn run_completed(&mut self, summary: Summary) {
        self.last_run_summary = Some(summary);
    }

    /// Ask for `count` more runs. Pending reruns never decrease.
    pub fn request_reruns(&mut self, count: u32, reason: &str) -> Result<(), StateError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(StateError::EmptyReason);
        }
        self.ensure_running()?;

        if count == 0 {
            self.write_message(
                MessageSource::Runner,
                MessageSeverity::Informational,
                format!("No additional runs requested. Reason: {}", reason),
            );
        } else {
            self.runs_left = self.runs_left.max(count);
            self.write_message(
                MessageSource::Runner,
                MessageSeverity::Informational,
                format!("Requesting {} run(s): {}", count, reason),
            );
        }
        Ok(())
    }

    /// Mark the run loop as finished
    pub fn complete(&mut self) {
        self.phase = CompetitionPhase::Completed;
    }

    /// Append a message to the log
    pub fn write_message(
        &mut self,
        source: MessageSource,
        severity: MessageSeverity,
        text: impl Into<String>,
    ) {
        self.push_message(source, severity, text.into(), None);
    }

    /// Append a message with a resolution hint
    pub fn write_message_with_hint(
        &mut self,
        source: MessageSource,
        severity: MessageSeverity,
        text: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.push_message(source, severity, text.into(), Some(hint.into()));
    }

    fn push_message(
        &mut self,
        source: MessageSource,
        severity: MessageSeverity,
        text: String,
        hint: Option<String>,
    ) {
        self.run_message_number += 1;
        let run = self.run_number;
        let seq = self.run_message_number;

        match severity {
            MessageSeverity::Informational => {
                tracing::info!(run, seq, source = %source, "{}", text)
            }
            MessageSeverity::Warning => tracing::warn!(run, seq, source = %source, "{}", text),
            _ => tracing::error!(run, seq, source = %source, severity = %severity, "{}", text),
        }

        let message = Message::new(run, seq, self.elapsed(), source, severity, text, hint);
        self.messages.push(message);
    }

    fn ensure_running(&self) -> Result<(), StateError> {
        match self.phase {
            CompetitionPhase::NotStarted => Err(StateError::NotInitialized),
            CompetitionPhase::Running => Ok(()),
            CompetitionPhase::Completed => Err(StateError::AlreadyCompleted),
        }
    }

    /// Current phase
    pub fn phase(&self) -> CompetitionPhase {
        self.phase
    }

    /// Number of the current run (0 before the first run)
    pub fn run_number(&self) -> u32 {
        self.run_number
    }

    /// Runs still pending
    pub fn runs_left(&self) -> u32 {
        self.runs_left
    }

    /// Run cap for the session
    pub fn max_runs_allowed(&self) -> u32 {
        self.max_runs_allowed
    }

    /// Whether the current run is the first one
    pub fn first_run(&self) -> bool {
        self.run_number == 1
    }

    /// The run cap has been reached
    pub fn last_run(&self) -> bool {
        self.run_number >= self.max_runs_allowed
    }

    /// No further runs are pending
    pub fn looks_like_last_run(&self) -> bool {
        self.runs_left == 0
    }

    /// Reruns were still requested when the run cap was reached
    pub fn run_limit_exceeded(&self) -> bool {
        self.last_run() && self.runs_left > 0
    }

    /// Time since [`first_time_init`](Self::first_time_init)
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Summary of the last completed run
    pub fn last_run_summary(&self) -> Option<&Summary> {
        self.last_run_summary.as_ref()
    }

    /// All messages in the order they were written
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages written during `run`
    pub fn messages_in_run(&self, run: u32) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.run_number() == run)
    }

    /// Highest severity in the log, `Informational` when empty
    pub fn highest_message_severity(&self) -> MessageSeverity {
        self.messages
            .iter()
            .map(Message::severity)
            .max()
            .unwrap_or_default()
    }

    /// Highest severity written during `run`
    pub fn highest_severity_in_run(&self, run: u32) -> MessageSeverity {
        self.messages_in_run(run)
            .map(Message::severity)
            .max()
            .unwrap_or_default()
    }

    /// The current run logged a setup or execution error
    pub fn has_critical_errors_in_run(&self) -> bool {
        self.highest_severity_in_run(self.run_number)
            .is_critical_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(max_runs: u32) -> CompetitionState {
        let mut state = CompetitionState::new();
        state.first_time_init(max_runs).unwrap();
        state
    }

    #[test]
    fn test_first_time_init() {
        let state = started(5);
        assert_eq!(state.phase(), CompetitionPhase::Running);
        assert_eq!(state.run_number(), 0);
        assert_eq!(state.runs_left(), 1);
        assert_eq!(state.max_runs_allowed(), 5);
    }

    #[test]
    fn test_first_time_init_twice_fails() {
        let mut state = started(5);
        assert_eq!(state.first_time_init(5), Err(StateError::AlreadyInitialized));
    }

    #[test]
    fn test_zero_max_runs_rejected() {
        let mut state = CompetitionState::new();
        assert_eq!(state.first_time_init(0), Err(StateError::InvalidMaxRuns));
        assert_eq!(state.phase(), CompetitionPhase::NotStarted);
    }

    #[test]
    fn test_prepare_requires_init() {
        let mut state = CompetitionState::new();
        assert_eq!(state.prepare_for_run(), Err(StateError::NotInitialized));
    }

    #[test]
    fn test_counters_are_monotonic() {
        let mut state = started(3);
        let mut last_run = state.run_number();
        for _ in 0..10 {
            state.prepare_for_run().unwrap();
            assert!(state.run_number() > last_run);
            last_run = state.run_number();
            assert_eq!(state.runs_left(), 0);
        }
    }

    #[test]
    fn test_last_run_flags() {
        let mut state = started(2);
        state.prepare_for_run().unwrap();
        assert!(state.first_run());
        assert!(!state.last_run());
        assert!(state.looks_like_last_run());

        state.request_reruns(1, "again").unwrap();
        assert!(!state.looks_like_last_run());

        state.prepare_for_run().unwrap();
        assert!(state.last_run());
        assert!(!state.run_limit_exceeded());

        state.request_reruns(1, "once more").unwrap();
        assert!(state.run_limit_exceeded());
    }

    #[test]
    fn test_request_reruns_never_decreases() {
        let mut state = started(10);
        state.prepare_for_run().unwrap();
        state.request_reruns(3, "first").unwrap();
        assert_eq!(state.runs_left(), 3);
        state.request_reruns(1, "second").unwrap();
        assert_eq!(state.runs_left(), 3);
        state.request_reruns(0, "nothing changed").unwrap();
        assert_eq!(state.runs_left(), 3);
        state.request_reruns(5, "more").unwrap();
        assert_eq!(state.runs_left(), 5);
    }

    #[test]
    fn test_request_reruns_logs() {
        let mut state = started(10);
        state.prepare_for_run().unwrap();
        state.request_reruns(0, "all limits satisfied").unwrap();
        state.request_reruns(2, "Annotations updated").unwrap();

        let texts: Vec<_> = state.messages().iter().map(|m| m.text()).collect();
        assert_eq!(
            texts,
            vec![
                "No additional runs requested. Reason: all limits satisfied",
                "Requesting 2 run(s): Annotations updated",
            ]
        );
        assert!(
            state
                .messages()
                .iter()
                .all(|m| m.severity() == MessageSeverity::Informational)
        );
    }

    #[test]
    fn test_request_reruns_requires_reason() {
        let mut state = started(10);
        assert_eq!(state.request_reruns(1, "  "), Err(StateError::EmptyReason));
        assert_eq!(state.runs_left(), 1);
    }

    #[test]
    fn test_message_numbers_restart_per_run() {
        let mut state = started(10);
        state.write_message(MessageSource::Runner, MessageSeverity::Informational, "setup");
        state.prepare_for_run().unwrap();
        state.write_message(MessageSource::Runner, MessageSeverity::Informational, "a");
        state.write_message(MessageSource::Analyser, MessageSeverity::Warning, "b");
        state.request_reruns(1, "again").unwrap();
        state.prepare_for_run().unwrap();
        state.write_message(MessageSource::Runner, MessageSeverity::Informational, "c");

        let numbered: Vec<_> = state
            .messages()
            .iter()
            .map(|m| (m.run_number(), m.run_message_number(), m.text()))
            .collect();
        assert_eq!(
            numbered,
            vec![
                (0, 1, "setup"),
                (1, 1, "a"),
                (1, 2, "b"),
                (1, 3, "Requesting 1 run(s): again"),
                (2, 1, "c"),
            ]
        );
    }

    #[test]
    fn test_highest_severity() {
        let mut state = started(10);
        assert_eq!(state.highest_message_severity(), MessageSeverity::Informational);

        state.prepare_for_run().unwrap();
        state.write_message(MessageSource::Validator, MessageSeverity::TestError, "bad");
        assert!(!state.has_critical_errors_in_run());

        state.write_message_with_hint(
            MessageSource::Runner,
            MessageSeverity::ExecutionError,
            "crashed",
            "check the engine log",
        );
        assert!(state.has_critical_errors_in_run());
        assert_eq!(state.highest_message_severity(), MessageSeverity::ExecutionError);
        assert_eq!(state.highest_severity_in_run(0), MessageSeverity::Informational);
        assert_eq!(state.messages()[1].hint(), Some("check the engine log"));
    }

    #[test]
    fn test_complete_blocks_reruns() {
        let mut state = started(10);
        state.prepare_for_run().unwrap();
        state.complete();
        assert_eq!(state.phase(), CompetitionPhase::Completed);
        assert_eq!(state.request_reruns(1, "late"), Err(StateError::AlreadyCompleted));
        assert_eq!(state.prepare_for_run(), Err(StateError::AlreadyCompleted));
    }

    #[test]
    fn test_run_completed_stores_summary() {
        let mut state = started(10);
        state.prepare_for_run().unwrap();
        state.run_completed(Summary::new("first", Vec::new()));
        assert_eq!(state.last_run_summary().map(|s| s.title.as_str()), Some("first"));
        assert_eq!(state.run_number(), 1);
        assert_eq!(state.runs_left(), 0);
    }
}
