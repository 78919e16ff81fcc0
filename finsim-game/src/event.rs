//! Structured events emitted by the engine and the bounded history log.
//!
//! Events are the only channel through which the engine describes what
//! happened; a presentation layer renders them (or their `Display` form)
//! instead of formatting state changes itself.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::instrument::Instrument;

/// Stable identifier for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Round counter when the event occurred (0 before the first round).
    pub round: u32,
    /// Sequence number across the whole session, starting at 0.
    pub seq: u32,
}

impl EventId {
    #[must_use]
    pub const fn new(round: u32, seq: u32) -> Self {
        Self { round, seq }
    }
}

/// Mechanical event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GameStarted,
    Invested,
    Borrowed,
    Repaid,
    RoundStarted,
    MarketReturn,
    StartupWin,
    StartupFailed,
    StartupIdle,
    DebtInterest,
    NoDebtInterest,
    BankInterest,
    FinalRound,
    GameEvaluated,
}

/// Severity tier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Gain,
    Loss,
}

impl EventSeverity {
    /// Classify a dollar delta.
    #[must_use]
    pub fn of_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Gain
        } else if delta < 0.0 {
            Self::Loss
        } else {
            Self::Info
        }
    }
}

/// Structured event appended to the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    pub severity: EventSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    /// Human-readable line, without the round prefix.
    pub message: String,
    /// Numeric figures behind the message (amounts, rates, balances).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Event {
    #[must_use]
    pub fn new(id: EventId, kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            severity: EventSeverity::Info,
            instrument: None,
            message: message.into(),
            payload: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: EventSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub const fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instrument = Some(instrument);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub const fn round(&self) -> u32 {
        self.id.round
    }

    /// Read a numeric field from the payload.
    #[must_use]
    pub fn figure(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(serde_json::Value::as_f64)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[R{}] {}", self.id.round, self.message)
    }
}

/// Bounded, newest-first event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    capacity: usize,
    next_seq: u32,
    entries: VecDeque<Event>,
}

impl EventLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_seq: 0,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Allocate the id for the next event in `round`.
    pub fn next_id(&mut self, round: u32) -> EventId {
        let id = EventId::new(round, self.next_seq);
        self.next_seq = self.next_seq.saturating_add(1);
        id
    }

    /// Insert at the front, dropping the oldest entry when full.
    pub fn push(&mut self, event: Event) {
        self.entries.push_front(event);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_seq = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent event, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Event> {
        self.entries.front()
    }

    /// Events newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    /// Rendered `[R{round}] message` lines, newest-first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(crate::constants::LOG_CAPACITY)
    }
}
