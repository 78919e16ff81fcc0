//! The engine: one owned game state plus the operations that move it.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{ConfigError, EngineConfig};
use crate::constants::LOG_TARGET;
use crate::error::{EngineError, ensure_positive};
use crate::evaluation::Evaluation;
use crate::event::{Event, EventKind, EventSeverity};
use crate::instrument::Instrument;
use crate::numbers::format_money;
use crate::resolver::{RoundReport, resolve_round};
use crate::rng::{MarketRng, UniformSource};
use crate::state::{GamePhase, GameState};

/// Which cash operation produced a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Invest,
    Borrow,
    Repay,
}

/// Receipt for an accepted invest, borrow or repay call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    pub requested: f64,
    /// Amount that actually moved; smaller than `requested` only for repayments
    /// that exceed the outstanding debt.
    pub applied: f64,
    pub cash_after: f64,
    pub debt_after: f64,
    pub event: Event,
}

/// Round simulation engine owning a single game session.
///
/// Every operation takes `&mut self`, so calls are serialized by construction;
/// share an engine across threads by wrapping it in a lock.
#[derive(Debug, Clone)]
pub struct Engine<R = MarketRng> {
    cfg: EngineConfig,
    state: GameState,
    rng: R,
}

impl Engine<MarketRng> {
    /// Engine drawing market moves from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid.
    pub fn new(cfg: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_rng(cfg, MarketRng::from_entropy())
    }

    /// Engine whose market moves are reproducible from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid.
    pub fn seeded(cfg: EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(cfg, MarketRng::from_user_seed(seed))
    }
}

impl Default for Engine<MarketRng> {
    fn default() -> Self {
        let cfg = EngineConfig::default();
        Self {
            state: GameState::zeroed(cfg.log_capacity),
            cfg,
            rng: MarketRng::from_entropy(),
        }
    }
}

impl<R: UniformSource> Engine<R> {
    /// Engine drawing from a caller-supplied random source.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid.
    pub fn with_rng(cfg: EngineConfig, rng: R) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            state: GameState::zeroed(cfg.log_capacity),
            cfg,
            rng,
        })
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    #[must_use]
    pub const fn rng(&self) -> &R {
        &self.rng
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.state.phase(self.cfg.total_rounds)
    }

    /// Rounds left before `advance_round` starts refusing.
    #[must_use]
    pub const fn rounds_remaining(&self) -> u32 {
        self.cfg.total_rounds.saturating_sub(self.state.round)
    }

    /// Consume the engine, returning the underlying game state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Begin a new game with the starting allowance, replacing any prior state.
    pub fn start(&mut self) -> Event {
        self.state = GameState::zeroed(self.cfg.log_capacity);
        self.state.cash = self.cfg.starting_cash;
        self.state.started = true;
        let cash = self.state.cash;
        let event = self.state.record(
            EventKind::GameStarted,
            format!("Game started. You have ${}", format_money(cash)),
            |e| e.with_payload(json!({ "cash": cash })),
        );
        log::info!(target: LOG_TARGET, "game started with {cash:.2} cash");
        event
    }

    /// Return to the pre-game state: everything zeroed and the log cleared.
    pub fn reset(&mut self) {
        self.state = GameState::zeroed(self.cfg.log_capacity);
        log::info!(target: LOG_TARGET, "game reset");
    }

    /// Move cash into an instrument.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidAmount`] for a non-positive amount,
    /// [`EngineError::InsufficientFunds`] when `amount` exceeds cash.
    pub fn invest(
        &mut self,
        instrument: Instrument,
        amount: f64,
    ) -> Result<Transaction, EngineError> {
        let amount = ensure_positive(amount).map_err(|err| rejected("invest", err))?;
        self.ensure_cash(amount).map_err(|err| rejected("invest", err))?;

        self.state.cash -= amount;
        *self.state.assets.get_mut(instrument) += amount;
        let holding = self.state.assets.get(instrument);
        let event = self.state.record(
            EventKind::Invested,
            format!("Invested ${} in {instrument}", format_money(amount)),
            |e| {
                e.with_instrument(instrument)
                    .with_payload(json!({ "amount": amount, "holding": holding }))
            },
        );
        log::debug!(target: LOG_TARGET, "invested {amount:.2} in {instrument}");
        Ok(self.receipt(
            TransactionKind::Invest,
            Some(instrument),
            amount,
            amount,
            event,
        ))
    }

    /// Take on debt, receiving the amount as cash.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidAmount`] for a non-positive amount,
    /// [`EngineError::CreditLimitExceeded`] when total debt would pass the ceiling.
    pub fn borrow(&mut self, amount: f64) -> Result<Transaction, EngineError> {
        let amount = ensure_positive(amount).map_err(|err| rejected("borrow", err))?;
        if self.state.debt + amount > self.cfg.credit_ceiling {
            return Err(rejected(
                "borrow",
                EngineError::CreditLimitExceeded {
                    requested: amount,
                    debt: self.state.debt,
                    ceiling: self.cfg.credit_ceiling,
                },
            ));
        }

        self.state.cash += amount;
        self.state.debt += amount;
        let debt = self.state.debt;
        let event = self.state.record(
            EventKind::Borrowed,
            format!(
                "Took credit ${}. Debt now ${}",
                format_money(amount),
                format_money(debt)
            ),
            |e| {
                e.with_severity(EventSeverity::Loss)
                    .with_payload(json!({ "amount": amount, "debt": debt }))
            },
        );
        log::debug!(target: LOG_TARGET, "borrowed {amount:.2}, debt now {debt:.2}");
        Ok(self.receipt(TransactionKind::Borrow, None, amount, amount, event))
    }

    /// Pay down debt. Only `min(amount, debt)` leaves the cash balance, and
    /// that applied figure is what must be covered by cash; with no debt
    /// outstanding the call succeeds and applies nothing.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidAmount`] for a non-positive amount,
    /// [`EngineError::InsufficientFunds`] when the applied amount exceeds cash.
    pub fn repay(&mut self, amount: f64) -> Result<Transaction, EngineError> {
        let amount = ensure_positive(amount).map_err(|err| rejected("repay", err))?;
        let applied = amount.min(self.state.debt).max(0.0);
        self.ensure_cash(applied).map_err(|err| rejected("repay", err))?;

        self.state.cash -= applied;
        self.state.debt -= applied;
        let debt = self.state.debt;
        let event = self.state.record(
            EventKind::Repaid,
            format!(
                "Repaid ${} of debt. Remaining debt ${}",
                format_money(applied),
                format_money(debt)
            ),
            |e| {
                e.with_severity(EventSeverity::of_delta(applied))
                    .with_payload(json!({
                        "requested": amount,
                        "applied": applied,
                        "debt": debt,
                    }))
            },
        );
        log::debug!(
            target: LOG_TARGET,
            "repaid {applied:.2} of {amount:.2} requested, debt now {debt:.2}"
        );
        Ok(self.receipt(TransactionKind::Repay, None, amount, applied, event))
    }

    /// Resolve the next round.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoMoreRounds`] once every round has been played.
    pub fn advance_round(&mut self) -> Result<RoundReport, EngineError> {
        resolve_round(&mut self.state, &self.cfg, &mut self.rng)
            .map_err(|err| rejected("advance_round", err))
    }

    /// Score the session. Allowed at any point as a progress check; only the
    /// result event is recorded, balances are untouched.
    pub fn evaluate(&mut self) -> Evaluation {
        let evaluation = Evaluation::of(&self.state);
        let severity = if evaluation.net_worth < 0.0 {
            EventSeverity::Loss
        } else {
            EventSeverity::Info
        };
        let payload = json!({
            "cash": evaluation.cash,
            "asset_sum": evaluation.asset_sum,
            "debt": evaluation.debt,
            "net_worth": evaluation.net_worth,
            "band": evaluation.band,
        });
        self.state
            .record(EventKind::GameEvaluated, evaluation.summary(), |e| {
                e.with_severity(severity).with_payload(payload)
            });
        log::info!(
            target: LOG_TARGET,
            "evaluated at round {}: net worth {:.2} ({})",
            evaluation.round,
            evaluation.net_worth,
            evaluation.band
        );
        evaluation
    }

    fn ensure_cash(&self, amount: f64) -> Result<(), EngineError> {
        if amount > self.state.cash {
            return Err(EngineError::InsufficientFunds {
                requested: amount,
                available: self.state.cash,
            });
        }
        Ok(())
    }

    fn receipt(
        &self,
        kind: TransactionKind,
        instrument: Option<Instrument>,
        requested: f64,
        applied: f64,
        event: Event,
    ) -> Transaction {
        Transaction {
            kind,
            instrument,
            requested,
            applied,
            cash_after: self.state.cash,
            debt_after: self.state.debt,
            event,
        }
    }
}

fn rejected(operation: &str, err: EngineError) -> EngineError {
    log::debug!(target: LOG_TARGET, "{operation} rejected: {err}");
    err
}
