use anyhow::{Context, Result};
use serde::Serialize;

use finsim_game::{
    Band, Engine, EngineConfig, EngineError, GameState, MarketRng, RoundReport, Transaction,
};

use super::policy::{Action, PlayerPolicy, PlayerStrategy};

/// Salt mixed into the run seed so the policy stream differs from the market stream.
const POLICY_SEED_SALT: u64 = 0x5EED_F1A5_C0FF_EE00;

/// Outcome of one automated game.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub strategy: PlayerStrategy,
    pub seed: u64,
    pub rounds_played: u32,
    pub cash: f64,
    pub asset_sum: f64,
    pub debt: f64,
    pub net_worth: f64,
    pub band: Band,
    pub accepted_actions: usize,
    pub rejected_actions: usize,
    pub violations: Vec<String>,
    /// Newest-first rendered event log.
    #[serde(skip)]
    pub transcript: Vec<String>,
}

impl RunRecord {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Drives one engine through a full game with a given strategy.
pub struct GameRunner {
    cfg: EngineConfig,
    verbose: bool,
}

impl GameRunner {
    #[must_use]
    pub const fn new(cfg: EngineConfig, verbose: bool) -> Self {
        Self { cfg, verbose }
    }

    /// Play one game: start, act and advance every round, settle, evaluate.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is rejected or the engine refuses to
    /// advance before the configured round count is reached.
    pub fn play(&self, strategy: PlayerStrategy, seed: u64) -> Result<RunRecord> {
        let mut engine = Engine::seeded(self.cfg.clone(), seed)
            .context("engine configuration rejected")?;
        let mut policy = strategy.create_policy(seed ^ POLICY_SEED_SALT);
        let mut tally = ActionTally::default();
        let mut violations = Vec::new();

        engine.start();
        while engine.rounds_remaining() > 0 {
            let actions = policy.plan_round(engine.state(), engine.config());
            self.apply_all(&mut engine, policy.as_ref(), &actions, &mut tally, &mut violations);

            let report = engine
                .advance_round()
                .with_context(|| format!("{strategy} seed {seed}: advance refused"))?;
            check_round(&report, engine.state(), &self.cfg, &mut violations);
        }

        let actions = policy.settle(engine.state());
        self.apply_all(&mut engine, policy.as_ref(), &actions, &mut tally, &mut violations);

        let evaluation = engine.evaluate();
        log::debug!(
            "{strategy} seed {seed}: net worth {:.2} ({}), {} rejected",
            evaluation.net_worth,
            evaluation.band,
            tally.rejected
        );

        Ok(RunRecord {
            strategy,
            seed,
            rounds_played: engine.state().round,
            cash: evaluation.cash,
            asset_sum: evaluation.asset_sum,
            debt: evaluation.debt,
            net_worth: evaluation.net_worth,
            band: evaluation.band,
            accepted_actions: tally.accepted,
            rejected_actions: tally.rejected,
            violations,
            transcript: engine.state().log.lines(),
        })
    }

    fn apply_all(
        &self,
        engine: &mut Engine<MarketRng>,
        policy: &(dyn PlayerPolicy + Send),
        actions: &[Action],
        tally: &mut ActionTally,
        violations: &mut Vec<String>,
    ) {
        for action in actions {
            let before = engine.state().clone();
            match apply_action(engine, *action) {
                Ok(tx) => {
                    tally.accepted += 1;
                    let after = engine.state();
                    check_transaction(*action, &tx, &before, after, &self.cfg, violations);
                }
                Err(err) => {
                    tally.rejected += 1;
                    if engine.state() != &before {
                        violations.push(format!("rejected {action} still changed state"));
                    }
                    if self.verbose {
                        println!("   {} rejected {action}: {err}", policy.name());
                    }
                }
            }
            check_state(engine.state(), violations);
        }
    }
}

#[derive(Debug, Default)]
struct ActionTally {
    accepted: usize,
    rejected: usize,
}

fn apply_action(
    engine: &mut Engine<MarketRng>,
    action: Action,
) -> Result<Transaction, EngineError> {
    match action {
        Action::Invest { instrument, amount } => engine.invest(instrument, amount),
        Action::Borrow { amount } => engine.borrow(amount),
        Action::Repay { amount } => engine.repay(amount),
    }
}

fn check_state(state: &GameState, violations: &mut Vec<String>) {
    if state.cash < 0.0 {
        violations.push(format!("cash went negative: {:.2}", state.cash));
    }
    if state.debt < 0.0 {
        violations.push(format!("debt went negative: {:.2}", state.debt));
    }
    for (instrument, value) in state.assets.iter() {
        if value < 0.0 {
            violations.push(format!("{instrument} holding went negative: {value:.2}"));
        }
    }
}

fn check_transaction(
    action: Action,
    tx: &Transaction,
    before: &GameState,
    after: &GameState,
    cfg: &EngineConfig,
    violations: &mut Vec<String>,
) {
    match action {
        Action::Borrow { .. } if tx.debt_after > cfg.credit_ceiling + 1e-9 => {
            violations.push(format!(
                "debt {:.2} above ceiling {:.2} after borrowing",
                tx.debt_after, cfg.credit_ceiling
            ));
        }
        Action::Repay { amount } => {
            let expected = amount.min(before.debt);
            if (tx.applied - expected).abs() > 1e-9 {
                violations.push(format!(
                    "repay applied {:.2}, expected {expected:.2}",
                    tx.applied
                ));
            }
        }
        Action::Invest { instrument, .. } => {
            let held_before = before.cash + before.assets.get(instrument);
            let held_after = after.cash + after.assets.get(instrument);
            if (held_after - held_before).abs() > 1e-6 {
                violations.push(format!("invest in {instrument} did not conserve value"));
            }
        }
        Action::Borrow { .. } => {}
    }
}

fn check_round(
    report: &RoundReport,
    state: &GameState,
    cfg: &EngineConfig,
    violations: &mut Vec<String>,
) {
    if report.round == 0 || report.round > cfg.total_rounds {
        violations.push(format!("round {} out of range", report.round));
    }
    for market_move in &report.moves {
        let in_range = cfg
            .market
            .range(market_move.instrument)
            .is_some_and(|range| range.contains(market_move.rate));
        if !in_range {
            violations.push(format!(
                "{} return {:.4} outside configured range",
                market_move.instrument, market_move.rate
            ));
        }
    }
    check_state(state, violations);
}
