//! End game scoring: net worth and wealth band.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{COMFORTABLE_THRESHOLD, RICH_THRESHOLD};
use crate::numbers::format_money;
use crate::state::GameState;

/// Wealth band, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// Net worth of at least 1000
    Rich,
    /// Net worth in [200, 1000)
    Comfortable,
    /// Net worth in [0, 200)
    BrokeButAfloat,
    /// Negative net worth
    HeavyDebt,
}

impl Band {
    pub const ALL: [Self; 4] = [
        Self::Rich,
        Self::Comfortable,
        Self::BrokeButAfloat,
        Self::HeavyDebt,
    ];

    /// Classify a net worth figure; bands are checked top-down.
    #[must_use]
    pub fn classify(net_worth: f64) -> Self {
        if net_worth >= RICH_THRESHOLD {
            Self::Rich
        } else if net_worth >= COMFORTABLE_THRESHOLD {
            Self::Comfortable
        } else if net_worth >= 0.0 {
            Self::BrokeButAfloat
        } else {
            Self::HeavyDebt
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rich => "rich",
            Self::Comfortable => "comfortable",
            Self::BrokeButAfloat => "broke but afloat",
            Self::HeavyDebt => "heavy debt",
        }
    }

    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Rich => "You became rich!",
            Self::Comfortable => "Comfortable. Good job!",
            Self::BrokeButAfloat => "Broke but afloat.",
            Self::HeavyDebt => "Big trouble: you are in heavy debt!",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scored snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub round: u32,
    pub cash: f64,
    pub asset_sum: f64,
    pub debt: f64,
    pub net_worth: f64,
    pub band: Band,
    /// Breakdown line, e.g. `Final net worth: $150.00 (cash $50.00 + assets $100.00 - debt $0.00)`.
    pub message: String,
}

impl Evaluation {
    /// Score the given state without modifying it.
    #[must_use]
    pub fn of(state: &GameState) -> Self {
        let asset_sum = state.assets.total();
        let net_worth = state.cash + asset_sum - state.debt;
        let band = Band::classify(net_worth);
        let message = format!(
            "Final net worth: ${} (cash ${} + assets ${} - debt ${})",
            format_money(net_worth),
            format_money(state.cash),
            format_money(asset_sum),
            format_money(state.debt)
        );
        Self {
            round: state.round,
            cash: state.cash,
            asset_sum,
            debt: state.debt,
            net_worth,
            band,
            message,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.band.label()
    }

    /// Log line recorded for the result, e.g. `RESULT: Broke but afloat. Final net worth: ...`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("RESULT: {} {}", self.band.headline(), self.message)
    }
}
