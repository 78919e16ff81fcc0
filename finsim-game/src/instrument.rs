//! The four investable instruments and the per-instrument holdings record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// An investable instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Stocks,
    Bonds,
    Crypto,
    Startup,
}

impl Instrument {
    /// All instruments in resolution order.
    pub const ALL: [Self; 4] = [Self::Stocks, Self::Bonds, Self::Crypto, Self::Startup];

    /// Instruments whose value moves by a uniformly drawn return each round.
    pub const MARKET: [Self; 3] = [Self::Stocks, Self::Bonds, Self::Crypto];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Stocks => "stocks",
            Self::Bonds => "bonds",
            Self::Crypto => "crypto",
            Self::Startup => "startup",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stocks => "Stocks",
            Self::Bonds => "Bonds",
            Self::Crypto => "Crypto",
            Self::Startup => "Startup",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Instrument {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|instrument| instrument.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| EngineError::UnknownInstrument(needle.to_string()))
    }
}

/// Dollar value currently held in each instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    #[serde(default)]
    pub stocks: f64,
    #[serde(default)]
    pub bonds: f64,
    #[serde(default)]
    pub crypto: f64,
    #[serde(default)]
    pub startup: f64,
}

impl Holdings {
    #[must_use]
    pub const fn get(&self, instrument: Instrument) -> f64 {
        match instrument {
            Instrument::Stocks => self.stocks,
            Instrument::Bonds => self.bonds,
            Instrument::Crypto => self.crypto,
            Instrument::Startup => self.startup,
        }
    }

    pub const fn get_mut(&mut self, instrument: Instrument) -> &mut f64 {
        match instrument {
            Instrument::Stocks => &mut self.stocks,
            Instrument::Bonds => &mut self.bonds,
            Instrument::Crypto => &mut self.crypto,
            Instrument::Startup => &mut self.startup,
        }
    }

    /// Sum of all holdings.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.stocks + self.bonds + self.crypto + self.startup
    }

    /// Iterate `(instrument, value)` pairs in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (Instrument, f64)> + '_ {
        Instrument::ALL
            .into_iter()
            .map(move |instrument| (instrument, self.get(instrument)))
    }
}
