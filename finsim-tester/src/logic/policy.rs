use std::fmt;
use std::str::FromStr;

use finsim_game::{EngineConfig, GameState, Instrument};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Smallest amount a policy bothers to move.
const MIN_TICKET: f64 = 1.0;

/// One request a policy wants sent to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Invest { instrument: Instrument, amount: f64 },
    Borrow { amount: f64 },
    Repay { amount: f64 },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invest { instrument, amount } => write!(f, "invest {amount:.2} in {instrument}"),
            Self::Borrow { amount } => write!(f, "borrow {amount:.2}"),
            Self::Repay { amount } => write!(f, "repay {amount:.2}"),
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Actions to issue before the next round resolves.
    fn plan_round(&mut self, state: &GameState, cfg: &EngineConfig) -> Vec<Action>;

    /// Actions to issue after the last round, before scoring. Defaults to
    /// paying off as much debt as cash allows.
    fn settle(&mut self, state: &GameState) -> Vec<Action> {
        pay_down(state, state.cash).into_iter().collect()
    }
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStrategy {
    Cautious,
    Balanced,
    Reckless,
    Random,
}

impl PlayerStrategy {
    pub const ALL: [Self; 4] = [Self::Cautious, Self::Balanced, Self::Reckless, Self::Random];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cautious => "cautious",
            Self::Balanced => "balanced",
            Self::Reckless => "reckless",
            Self::Random => "random",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Balanced => "Balanced",
            Self::Reckless => "Reckless",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Cautious => "bonds first, never borrows, clears debt early",
            Self::Balanced => "spreads cash over stocks, bonds and crypto",
            Self::Reckless => "maxes out credit and chases crypto and startups",
            Self::Random => "seeded random actions, including ones the engine rejects",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Reckless => Box::new(RecklessPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for PlayerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlayerStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown strategy: {wanted}"))
    }
}

struct CautiousPolicy;
struct BalancedPolicy;
struct RecklessPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn plan_round(&mut self, state: &GameState, _cfg: &EngineConfig) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut cash = state.cash;
        if let Some(repay) = pay_down(state, cash) {
            cash -= state.debt.min(cash);
            actions.push(repay);
        }
        let bonds = cents(cash * 0.75);
        if bonds >= MIN_TICKET {
            actions.push(Action::Invest {
                instrument: Instrument::Bonds,
                amount: bonds,
            });
        }
        if state.round == 0 {
            let stocks = cents(cash * 0.1);
            if stocks >= MIN_TICKET {
                actions.push(Action::Invest {
                    instrument: Instrument::Stocks,
                    amount: stocks,
                });
            }
        }
        actions
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn plan_round(&mut self, state: &GameState, _cfg: &EngineConfig) -> Vec<Action> {
        let spendable = state.cash * 0.9;
        let share = cents(spendable / 3.0);
        if share < MIN_TICKET {
            return Vec::new();
        }
        Instrument::MARKET
            .into_iter()
            .map(|instrument| Action::Invest {
                instrument,
                amount: share,
            })
            .collect()
    }
}

impl PlayerPolicy for RecklessPolicy {
    fn name(&self) -> &'static str {
        "Reckless"
    }

    fn plan_round(&mut self, state: &GameState, cfg: &EngineConfig) -> Vec<Action> {
        let mut actions = Vec::new();
        let headroom = cents(cfg.credit_ceiling - state.debt);
        let mut cash = state.cash;
        if headroom >= MIN_TICKET {
            actions.push(Action::Borrow { amount: headroom });
            cash += headroom;
        }
        let crypto = cents(cash * 0.6);
        let startup = cents(cash * 0.3);
        for (instrument, amount) in [(Instrument::Crypto, crypto), (Instrument::Startup, startup)] {
            if amount >= MIN_TICKET {
                actions.push(Action::Invest { instrument, amount });
            }
        }
        actions
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn plan_round(&mut self, state: &GameState, cfg: &EngineConfig) -> Vec<Action> {
        let count = self.rng.gen_range(0..=3);
        let mut actions = Vec::with_capacity(count);
        for _ in 0..count {
            // Amounts deliberately overshoot so some requests bounce.
            let action = match self.rng.gen_range(0..3) {
                0 => {
                    let instrument = Instrument::ALL[self.rng.gen_range(0..Instrument::ALL.len())];
                    let amount = cents(state.cash * self.rng.gen_range(0.0..1.2));
                    Action::Invest { instrument, amount }
                }
                1 => Action::Borrow {
                    amount: cents(cfg.credit_ceiling * self.rng.gen_range(0.0..0.6)),
                },
                _ => Action::Repay {
                    amount: cents(state.debt.max(MIN_TICKET) * self.rng.gen_range(0.0..1.5)),
                },
            };
            actions.push(action);
        }
        actions
    }
}

/// Repay as much debt as `budget` covers, if there is any debt.
fn pay_down(state: &GameState, budget: f64) -> Option<Action> {
    let amount = cents(state.debt.min(budget));
    (state.debt > 0.0 && amount > 0.0).then_some(Action::Repay { amount })
}

/// Round down to whole cents.
fn cents(value: f64) -> f64 {
    (value.max(0.0) * 100.0).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_state(cash: f64) -> GameState {
        GameState {
            cash,
            started: true,
            ..GameState::default()
        }
    }

    #[test]
    fn strategies_parse_from_keys() {
        for strategy in PlayerStrategy::ALL {
            assert_eq!(strategy.key().parse::<PlayerStrategy>(), Ok(strategy));
        }
        assert_eq!(
            " RECKLESS ".parse::<PlayerStrategy>(),
            Ok(PlayerStrategy::Reckless)
        );
        assert!("yolo".parse::<PlayerStrategy>().is_err());
    }

    #[test]
    fn cautious_buys_bonds_and_repays_first() {
        let mut state = started_state(100.0);
        state.debt = 20.0;
        let mut policy = PlayerStrategy::Cautious.create_policy(1);
        let actions = policy.plan_round(&state, &EngineConfig::default());
        assert_eq!(actions[0], Action::Repay { amount: 20.0 });
        assert_eq!(
            actions[1],
            Action::Invest {
                instrument: Instrument::Bonds,
                amount: 60.0
            }
        );
        assert!(
            actions
                .iter()
                .all(|a| !matches!(a, Action::Borrow { .. }))
        );
    }

    #[test]
    fn balanced_splits_across_market_instruments() {
        let state = started_state(100.0);
        let mut policy = PlayerStrategy::Balanced.create_policy(1);
        let actions = policy.plan_round(&state, &EngineConfig::default());
        assert_eq!(actions.len(), 3);
        let total: f64 = actions
            .iter()
            .map(|a| match a {
                Action::Invest { amount, .. } => *amount,
                _ => 0.0,
            })
            .sum();
        assert!(total <= 90.0 + 1e-9);
    }

    #[test]
    fn reckless_borrows_to_the_ceiling() {
        let state = started_state(100.0);
        let mut policy = PlayerStrategy::Reckless.create_policy(1);
        let actions = policy.plan_round(&state, &EngineConfig::default());
        assert_eq!(actions[0], Action::Borrow { amount: 500.0 });
        assert!(actions.iter().any(|a| matches!(
            a,
            Action::Invest {
                instrument: Instrument::Startup,
                ..
            }
        )));
    }

    #[test]
    fn random_policy_is_reproducible_per_seed() {
        let state = started_state(100.0);
        let cfg = EngineConfig::default();
        let mut left = PlayerStrategy::Random.create_policy(42);
        let mut right = PlayerStrategy::Random.create_policy(42);
        for _ in 0..6 {
            assert_eq!(
                left.plan_round(&state, &cfg),
                right.plan_round(&state, &cfg)
            );
        }
    }

    #[test]
    fn default_settle_repays_what_cash_covers() {
        let mut state = started_state(30.0);
        state.debt = 45.5;
        let mut policy = PlayerStrategy::Balanced.create_policy(1);
        assert_eq!(policy.settle(&state), vec![Action::Repay { amount: 30.0 }]);
        state.debt = 0.0;
        assert!(policy.settle(&state).is_empty());
    }

    #[test]
    fn cents_rounds_down() {
        assert!((cents(12.349) - 12.34).abs() < 1e-9);
        assert!(cents(-3.0).abs() < f64::EPSILON);
    }
}
