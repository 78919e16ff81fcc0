//! Engine tuning knobs with validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::instrument::Instrument;

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number (got {value})")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{instrument} return range inverted (min {min:.2} > max {max:.2})")]
    InvertedRange {
        instrument: Instrument,
        min: f64,
        max: f64,
    },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Uniform per-round return range for a market instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnRange {
    pub min: f64,
    pub max: f64,
}

impl ReturnRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    const fn from_pair(pair: (f64, f64)) -> Self {
        Self::new(pair.0, pair.1)
    }

    /// Map a unit draw in `[0, 1)` onto the range.
    #[must_use]
    pub fn sample(&self, unit: f64) -> f64 {
        unit.mul_add(self.max - self.min, self.min)
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Per-instrument return ranges for the market instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "MarketConfig::default_stocks")]
    pub stocks: ReturnRange,
    #[serde(default = "MarketConfig::default_bonds")]
    pub bonds: ReturnRange,
    #[serde(default = "MarketConfig::default_crypto")]
    pub crypto: ReturnRange,
}

impl MarketConfig {
    const fn default_stocks() -> ReturnRange {
        ReturnRange::from_pair(constants::STOCKS_RETURN)
    }

    const fn default_bonds() -> ReturnRange {
        ReturnRange::from_pair(constants::BONDS_RETURN)
    }

    const fn default_crypto() -> ReturnRange {
        ReturnRange::from_pair(constants::CRYPTO_RETURN)
    }

    /// Return range for a market instrument; `None` for the startup lottery.
    #[must_use]
    pub const fn range(&self, instrument: Instrument) -> Option<ReturnRange> {
        match instrument {
            Instrument::Stocks => Some(self.stocks),
            Instrument::Bonds => Some(self.bonds),
            Instrument::Crypto => Some(self.crypto),
            Instrument::Startup => None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for instrument in Instrument::MARKET {
            let Some(range) = self.range(instrument) else {
                continue;
            };
            finite(instrument_field(instrument, true), range.min)?;
            finite(instrument_field(instrument, false), range.max)?;
            if range.min > range.max {
                return Err(ConfigError::InvertedRange {
                    instrument,
                    min: range.min,
                    max: range.max,
                });
            }
            // A return below -100% would drive a holding negative.
            if range.min < -1.0 {
                return Err(ConfigError::MinViolation {
                    field: instrument_field(instrument, true),
                    min: -1.0,
                    value: range.min,
                });
            }
        }
        Ok(())
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            stocks: Self::default_stocks(),
            bonds: Self::default_bonds(),
            crypto: Self::default_crypto(),
        }
    }
}

const fn instrument_field(instrument: Instrument, min: bool) -> &'static str {
    match (instrument, min) {
        (Instrument::Stocks, true) => "market.stocks.min",
        (Instrument::Stocks, false) => "market.stocks.max",
        (Instrument::Bonds, true) => "market.bonds.min",
        (Instrument::Bonds, false) => "market.bonds.max",
        (Instrument::Crypto, true) => "market.crypto.min",
        (Instrument::Crypto, false) => "market.crypto.max",
        (Instrument::Startup, _) => "startup",
    }
}

/// Odds of the all-or-nothing startup investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupConfig {
    #[serde(default = "StartupConfig::default_win_probability")]
    pub win_probability: f64,
    #[serde(default = "StartupConfig::default_win_multiplier")]
    pub win_multiplier: f64,
}

impl StartupConfig {
    const fn default_win_probability() -> f64 {
        constants::STARTUP_WIN_PROBABILITY
    }

    const fn default_win_multiplier() -> f64 {
        constants::STARTUP_WIN_MULTIPLIER
    }

    fn validate(&self) -> Result<(), ConfigError> {
        range_check("startup.win_probability", 0.0, 1.0, self.win_probability)?;
        min_check("startup.win_multiplier", 1.0, self.win_multiplier)
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            win_probability: Self::default_win_probability(),
            win_multiplier: Self::default_win_multiplier(),
        }
    }
}

/// Complete engine configuration; defaults mirror [`crate::constants`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_starting_cash")]
    pub starting_cash: f64,
    #[serde(default = "EngineConfig::default_total_rounds")]
    pub total_rounds: u32,
    #[serde(default = "EngineConfig::default_credit_ceiling")]
    pub credit_ceiling: f64,
    #[serde(default = "EngineConfig::default_credit_interest_rate")]
    pub credit_interest_rate: f64,
    #[serde(default = "EngineConfig::default_bank_interest_threshold")]
    pub bank_interest_threshold: f64,
    #[serde(default = "EngineConfig::default_bank_interest_rate")]
    pub bank_interest_rate: f64,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub startup: StartupConfig,
    #[serde(default = "EngineConfig::default_log_capacity")]
    pub log_capacity: usize,
}

impl EngineConfig {
    const fn default_starting_cash() -> f64 {
        constants::STARTING_CASH
    }

    const fn default_total_rounds() -> u32 {
        constants::TOTAL_ROUNDS
    }

    const fn default_credit_ceiling() -> f64 {
        constants::CREDIT_CEILING
    }

    const fn default_credit_interest_rate() -> f64 {
        constants::CREDIT_INTEREST_RATE
    }

    const fn default_bank_interest_threshold() -> f64 {
        constants::BANK_INTEREST_THRESHOLD
    }

    const fn default_bank_interest_rate() -> f64 {
        constants::BANK_INTEREST_RATE
    }

    const fn default_log_capacity() -> usize {
        constants::LOG_CAPACITY
    }

    /// Parse a configuration from JSON, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check every invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        min_check("starting_cash", 0.0, self.starting_cash)?;
        if self.total_rounds == 0 {
            return Err(ConfigError::Zero {
                field: "total_rounds",
            });
        }
        min_check("credit_ceiling", 0.0, self.credit_ceiling)?;
        min_check("credit_interest_rate", 0.0, self.credit_interest_rate)?;
        min_check("bank_interest_threshold", 0.0, self.bank_interest_threshold)?;
        min_check("bank_interest_rate", 0.0, self.bank_interest_rate)?;
        self.market.validate()?;
        self.startup.validate()?;
        if self.log_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "log_capacity",
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_cash: Self::default_starting_cash(),
            total_rounds: Self::default_total_rounds(),
            credit_ceiling: Self::default_credit_ceiling(),
            credit_interest_rate: Self::default_credit_interest_rate(),
            bank_interest_threshold: Self::default_bank_interest_threshold(),
            bank_interest_rate: Self::default_bank_interest_rate(),
            market: MarketConfig::default(),
            startup: StartupConfig::default(),
            log_capacity: Self::default_log_capacity(),
        }
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn min_check(field: &'static str, min: f64, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < min {
        return Err(ConfigError::MinViolation { field, min, value });
    }
    Ok(())
}

fn range_check(field: &'static str, min: f64, max: f64, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if !(min..=max).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants_and_validate() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.total_rounds, constants::TOTAL_ROUNDS);
        assert!((cfg.credit_ceiling - 500.0).abs() < f64::EPSILON);
        assert_eq!(cfg.market.range(Instrument::Startup), None);
        assert_eq!(
            cfg.market.range(Instrument::Crypto),
            Some(ReturnRange::new(-0.80, 2.00))
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg =
            EngineConfig::from_json(r#"{"starting_cash": 250, "market": {"bonds": {"min": 0.0, "max": 0.1}}}"#)
                .expect("parse");
        assert!((cfg.starting_cash - 250.0).abs() < f64::EPSILON);
        assert_eq!(cfg.market.bonds, ReturnRange::new(0.0, 0.1));
        assert_eq!(cfg.market.stocks, ReturnRange::new(-0.40, 0.60));
        assert_eq!(cfg.total_rounds, 6);
        assert_eq!(cfg.log_capacity, 200);
    }

    #[test]
    fn rejects_inverted_and_negative_ranges() {
        let mut cfg = EngineConfig::default();
        cfg.market.crypto = ReturnRange::new(1.0, 0.5);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvertedRange {
                instrument: Instrument::Crypto,
                min: 1.0,
                max: 0.5,
            })
        );

        let mut cfg = EngineConfig::default();
        cfg.market.stocks = ReturnRange::new(-1.5, 0.5);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "market.stocks.min",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_scalars() {
        let mut cfg = EngineConfig::default();
        cfg.total_rounds = 0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Zero {
                field: "total_rounds"
            })
        );

        let mut cfg = EngineConfig::default();
        cfg.startup.win_probability = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RangeViolation { .. })
        ));

        let mut cfg = EngineConfig::default();
        cfg.credit_interest_rate = f64::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::NotFinite { .. })));
    }

    #[test]
    fn sample_maps_unit_interval_onto_range() {
        let range = ReturnRange::new(-0.4, 0.6);
        assert!((range.sample(0.0) + 0.4).abs() < 1e-12);
        assert!((range.sample(0.5) - 0.1).abs() < 1e-12);
        assert!(range.contains(range.sample(0.999_999)));
    }
}
