use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::{Event, EventKind, EventLog};
use crate::instrument::Holdings;

/// Coarse session phase, derived from the state.
///
/// Purely informational: operations are not gated on it beyond the round
/// limit enforced by `advance_round`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Fresh or reset; `start` has not been called.
    Idle,
    /// Started and rounds remain.
    Trading,
    /// Every round has been played.
    Final,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Trading => "trading",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single mutable record of one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub cash: f64,
    pub debt: f64,
    pub round: u32,
    pub assets: Holdings,
    pub log: EventLog,
    #[serde(default)]
    pub started: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::zeroed(crate::constants::LOG_CAPACITY)
    }
}

impl GameState {
    /// All-zero state with an empty log of the given capacity.
    #[must_use]
    pub fn zeroed(log_capacity: usize) -> Self {
        Self {
            cash: 0.0,
            debt: 0.0,
            round: 0,
            assets: Holdings::default(),
            log: EventLog::with_capacity(log_capacity),
            started: false,
        }
    }

    /// Cash plus holdings minus debt.
    #[must_use]
    pub fn net_worth(&self) -> f64 {
        self.cash + self.assets.total() - self.debt
    }

    #[must_use]
    pub const fn phase(&self, total_rounds: u32) -> GamePhase {
        if !self.started {
            GamePhase::Idle
        } else if self.round >= total_rounds {
            GamePhase::Final
        } else {
            GamePhase::Trading
        }
    }

    /// Build an event stamped with the current round, append it to the log
    /// and hand back a copy.
    pub(crate) fn record(
        &mut self,
        kind: EventKind,
        message: impl Into<String>,
        decorate: impl FnOnce(Event) -> Event,
    ) -> Event {
        let id = self.log.next_id(self.round);
        let event = decorate(Event::new(id, kind, message));
        self.log.push(event.clone());
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;

    #[test]
    fn zeroed_state_is_idle_and_worthless() {
        let state = GameState::default();
        assert_eq!(state.phase(6), GamePhase::Idle);
        assert!(state.net_worth().abs() < f64::EPSILON);
        assert!(state.log.is_empty());
        assert_eq!(state.log.capacity(), 200);
    }

    #[test]
    fn phase_tracks_round_progress() {
        let mut state = GameState {
            started: true,
            ..GameState::default()
        };
        assert_eq!(state.phase(6), GamePhase::Trading);
        state.round = 6;
        assert_eq!(state.phase(6), GamePhase::Final);
        assert_eq!(GamePhase::Final.to_string(), "final");
    }

    #[test]
    fn net_worth_subtracts_debt() {
        let mut state = GameState::default();
        state.cash = 50.0;
        state.debt = 80.0;
        *state.assets.get_mut(Instrument::Bonds) += 20.0;
        assert!((state.net_worth() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn record_stamps_round_and_appends() {
        let mut state = GameState {
            round: 2,
            ..GameState::default()
        };
        let event = state.record(EventKind::NoDebtInterest, "No debt", |e| e);
        assert_eq!(event.round(), 2);
        assert_eq!(state.log.latest(), Some(&event));
    }
}
