//! Centralized balance and tuning constants for Finsim game logic.
//!
//! These values define the default math for the round simulation. Keeping
//! them together means gameplay is adjusted through reviewed code changes or
//! an explicit [`EngineConfig`](crate::config::EngineConfig), never through
//! scattered literals.

// Session ------------------------------------------------------------------
pub const STARTING_CASH: f64 = 100.0;
pub const TOTAL_ROUNDS: u32 = 6;
pub const LOG_CAPACITY: usize = 200;

// Credit -------------------------------------------------------------------
pub const CREDIT_CEILING: f64 = 500.0;
pub const CREDIT_INTEREST_RATE: f64 = 0.08;

// Bank interest on idle cash -----------------------------------------------
pub const BANK_INTEREST_THRESHOLD: f64 = 200.0;
pub const BANK_INTEREST_RATE: f64 = 0.01;

// Per-round return ranges (inclusive min, exclusive max) --------------------
pub const STOCKS_RETURN: (f64, f64) = (-0.40, 0.60);
pub const BONDS_RETURN: (f64, f64) = (0.02, 0.06);
pub const CRYPTO_RETURN: (f64, f64) = (-0.80, 2.00);

// Startup lottery ----------------------------------------------------------
pub const STARTUP_WIN_PROBABILITY: f64 = 0.10;
/// Holding is multiplied by this factor on a win (+500%).
pub const STARTUP_WIN_MULTIPLIER: f64 = 6.0;

// Evaluation bands ---------------------------------------------------------
pub const RICH_THRESHOLD: f64 = 1_000.0;
pub const COMFORTABLE_THRESHOLD: f64 = 200.0;

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_TARGET: &str = "finsim::engine";
pub(crate) const ROUND_LOG_TARGET: &str = "finsim::resolver";
