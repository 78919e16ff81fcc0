//! Finsim Game Engine
//!
//! Platform-agnostic round simulation for a turn-based personal-finance game:
//! invest cash across four instruments, borrow against a credit line, and
//! watch holdings move for a fixed number of rounds before being scored.
//! This crate provides all game mechanics without UI or platform-specific
//! dependencies; presentation layers drive an [`Engine`] and render the
//! returned [`Event`]s and [`GameState`] snapshots.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod event;
pub mod instrument;
pub mod numbers;
pub mod resolver;
pub mod rng;
pub mod state;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig, MarketConfig, ReturnRange, StartupConfig};
pub use engine::{Engine, Transaction, TransactionKind};
pub use error::{EngineError, parse_amount};
pub use evaluation::{Band, Evaluation};
pub use event::{Event, EventId, EventKind, EventLog, EventSeverity};
pub use instrument::{Holdings, Instrument};
pub use resolver::{MarketMove, RoundReport, StartupOutcome, resolve_round};
pub use rng::{CountingRng, MarketRng, SequenceSource, UniformSource};
pub use state::{GamePhase, GameState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_engines_replay_identically() {
        let mut left = Engine::seeded(EngineConfig::default(), 0xABCD).expect("valid config");
        let mut right = Engine::seeded(EngineConfig::default(), 0xABCD).expect("valid config");
        for engine in [&mut left, &mut right] {
            engine.start();
            engine.invest(Instrument::Stocks, 40.0).expect("invest stocks");
            engine.invest(Instrument::Crypto, 40.0).expect("invest crypto");
        }
        for _ in 0..EngineConfig::default().total_rounds {
            let a = left.advance_round().expect("round");
            let b = right.advance_round().expect("round");
            assert_eq!(a, b);
        }
        assert_eq!(left.state(), right.state());
        assert_eq!(left.rng().draws(), right.rng().draws());
    }

    #[test]
    fn engines_are_independent_sessions() {
        let mut first = Engine::seeded(EngineConfig::default(), 1).expect("valid config");
        let mut second = Engine::seeded(EngineConfig::default(), 1).expect("valid config");
        first.start();
        first.borrow(250.0).expect("borrow");
        second.start();
        assert!((second.state().debt).abs() < f64::EPSILON);
        assert!((first.state().debt - 250.0).abs() < f64::EPSILON);
    }
}
