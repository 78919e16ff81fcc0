pub mod aggregate;
pub mod policy;
pub mod reports;
pub mod runner;
pub mod seeds;

pub use aggregate::{StrategyAggregate, aggregate_runs};
pub use policy::PlayerStrategy;
pub use runner::{GameRunner, RunRecord};
pub use seeds::{expand_iterations, resolve_seed_inputs};
