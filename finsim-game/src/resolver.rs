//! Round resolution: market returns, the startup lottery, debt interest and
//! bank interest, applied in that order.

use serde::{Deserialize, Serialize};
use serde_json::json;
use smallvec::SmallVec;

use crate::config::EngineConfig;
use crate::constants::ROUND_LOG_TARGET;
use crate::error::EngineError;
use crate::event::{Event, EventKind, EventSeverity};
use crate::instrument::Instrument;
use crate::numbers::{format_money, format_signed_money, format_signed_pct};
use crate::rng::UniformSource;
use crate::state::GameState;

/// Value change of one market instrument during a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketMove {
    pub instrument: Instrument,
    /// Drawn fractional return, e.g. `-0.12` for -12%.
    pub rate: f64,
    pub before: f64,
    pub delta: f64,
    pub after: f64,
}

/// Result of the all-or-nothing startup draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartupOutcome {
    /// Nothing was invested, so no draw happened.
    NoInvestment,
    Win { stake: f64, gain: f64 },
    Failed { loss: f64 },
}

impl StartupOutcome {
    /// Signed change applied to the startup holding.
    #[must_use]
    pub const fn delta(&self) -> f64 {
        match *self {
            Self::NoInvestment => 0.0,
            Self::Win { gain, .. } => gain,
            Self::Failed { loss } => -loss,
        }
    }
}

/// Everything that happened during one call to `advance_round`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    pub moves: SmallVec<[MarketMove; 3]>,
    pub startup: StartupOutcome,
    /// Interest added to the debt; 0 when there was no debt.
    pub debt_interest: f64,
    /// Interest paid on idle cash; 0 when cash was at or below the threshold.
    pub bank_interest: f64,
    pub final_round: bool,
    /// Events emitted this round, oldest first.
    pub events: Vec<Event>,
}

impl RoundReport {
    /// Market move for a given instrument, if it is a market instrument.
    #[must_use]
    pub fn move_for(&self, instrument: Instrument) -> Option<&MarketMove> {
        self.moves.iter().find(|m| m.instrument == instrument)
    }

    /// Net change in holdings value across all instruments this round.
    #[must_use]
    pub fn holdings_delta(&self) -> f64 {
        self.moves.iter().map(|m| m.delta).sum::<f64>() + self.startup.delta()
    }
}

/// Resolve the next round against `state`.
///
/// # Errors
///
/// Returns [`EngineError::NoMoreRounds`] once every round has been played;
/// the state is left untouched in that case.
pub fn resolve_round<R>(
    state: &mut GameState,
    cfg: &EngineConfig,
    rng: &mut R,
) -> Result<RoundReport, EngineError>
where
    R: UniformSource + ?Sized,
{
    if state.round >= cfg.total_rounds {
        return Err(EngineError::NoMoreRounds {
            total_rounds: cfg.total_rounds,
        });
    }

    state.round += 1;
    let round = state.round;
    let mut events = Vec::with_capacity(8);
    events.push(state.record(EventKind::RoundStarted, format!("=== TURN {round} ==="), |e| e));

    let mut moves = SmallVec::new();
    for instrument in Instrument::MARKET {
        let Some(range) = cfg.market.range(instrument) else {
            continue;
        };
        let rate = range.sample(rng.next_unit());
        let (market_move, event) = apply_market_return(state, instrument, rate);
        moves.push(market_move);
        events.push(event);
    }

    let (startup, event) = resolve_startup(state, cfg, rng);
    events.push(event);

    let (debt_interest, event) = accrue_debt_interest(state, cfg);
    events.push(event);

    let (bank_interest, event) = pay_bank_interest(state, cfg);
    events.extend(event);

    let final_round = round >= cfg.total_rounds;
    if final_round {
        events.push(state.record(
            EventKind::FinalRound,
            "Reached final round. Evaluate to see your result.",
            |e| e,
        ));
    }

    log::debug!(
        target: ROUND_LOG_TARGET,
        "round {round} resolved: cash {:.2} debt {:.2} holdings {:.2}",
        state.cash,
        state.debt,
        state.assets.total()
    );

    Ok(RoundReport {
        round,
        moves,
        startup,
        debt_interest,
        bank_interest,
        final_round,
        events,
    })
}

fn apply_market_return(
    state: &mut GameState,
    instrument: Instrument,
    rate: f64,
) -> (MarketMove, Event) {
    let holding = state.assets.get_mut(instrument);
    let before = *holding;
    let delta = before * rate;
    // Guard against float drift below zero at a -100% floor.
    *holding = (before + delta).max(0.0);
    let after = *holding;

    let decimals = if instrument == Instrument::Bonds { 2 } else { 1 };
    let message = format!(
        "{}: {} -> {}",
        instrument.label(),
        format_signed_pct(rate, decimals),
        format_signed_money(delta)
    );
    let event = state.record(EventKind::MarketReturn, message, |e| {
        e.with_instrument(instrument)
            .with_severity(EventSeverity::of_delta(delta))
            .with_payload(json!({
                "rate": rate,
                "before": before,
                "delta": delta,
                "after": after,
            }))
    });

    (
        MarketMove {
            instrument,
            rate,
            before,
            delta,
            after,
        },
        event,
    )
}

fn resolve_startup<R>(
    state: &mut GameState,
    cfg: &EngineConfig,
    rng: &mut R,
) -> (StartupOutcome, Event)
where
    R: UniformSource + ?Sized,
{
    let stake = state.assets.startup;
    if stake <= 0.0 {
        let event = state.record(EventKind::StartupIdle, "Startup: no investment", |e| {
            e.with_instrument(Instrument::Startup)
        });
        return (StartupOutcome::NoInvestment, event);
    }

    let chance = rng.next_unit();
    if chance < cfg.startup.win_probability {
        let gain = stake * (cfg.startup.win_multiplier - 1.0);
        state.assets.startup = stake + gain;
        let pct = (cfg.startup.win_multiplier - 1.0) * 100.0;
        let message = format!(
            "Startup: BIG WIN! +{pct:.0}% -> {}",
            format_signed_money(gain)
        );
        let event = state.record(EventKind::StartupWin, message, |e| {
            e.with_instrument(Instrument::Startup)
                .with_severity(EventSeverity::Gain)
                .with_payload(json!({ "roll": chance, "stake": stake, "gain": gain }))
        });
        (StartupOutcome::Win { stake, gain }, event)
    } else {
        state.assets.startup = 0.0;
        let message = format!("Startup: failed -> {}", format_signed_money(-stake));
        let event = state.record(EventKind::StartupFailed, message, |e| {
            e.with_instrument(Instrument::Startup)
                .with_severity(EventSeverity::Loss)
                .with_payload(json!({ "roll": chance, "loss": stake }))
        });
        (StartupOutcome::Failed { loss: stake }, event)
    }
}

fn accrue_debt_interest(state: &mut GameState, cfg: &EngineConfig) -> (f64, Event) {
    if state.debt <= 0.0 {
        let event = state.record(
            EventKind::NoDebtInterest,
            "No debt -> no interest this turn",
            |e| e,
        );
        return (0.0, event);
    }

    let interest = state.debt * cfg.credit_interest_rate;
    state.debt += interest;
    let message = format!(
        "Interest charged: ${} ({:.0}%) -> Debt ${}",
        format_money(interest),
        cfg.credit_interest_rate * 100.0,
        format_money(state.debt)
    );
    let debt = state.debt;
    let event = state.record(EventKind::DebtInterest, message, |e| {
        e.with_severity(EventSeverity::Loss).with_payload(json!({
            "rate": cfg.credit_interest_rate,
            "interest": interest,
            "debt": debt,
        }))
    });
    (interest, event)
}

fn pay_bank_interest(state: &mut GameState, cfg: &EngineConfig) -> (f64, Option<Event>) {
    if state.cash <= cfg.bank_interest_threshold {
        return (0.0, None);
    }

    let passive = state.cash * cfg.bank_interest_rate;
    state.cash += passive;
    let message = format!("Bank interest on cash: +${}", format_money(passive));
    let cash = state.cash;
    let event = state.record(EventKind::BankInterest, message, |e| {
        e.with_severity(EventSeverity::Gain).with_payload(json!({
            "rate": cfg.bank_interest_rate,
            "interest": passive,
            "cash": cash,
        }))
    });
    (passive, Some(event))
}
