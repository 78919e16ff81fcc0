use serde::Serialize;
use std::collections::BTreeMap;

use finsim_game::Band;
use finsim_game::numbers::usize_to_f64;

use super::policy::PlayerStrategy;
use super::runner::RunRecord;

/// Runs landing in one wealth band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandCount {
    pub band: Band,
    pub runs: usize,
}

/// Summary of every run played by one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAggregate {
    pub strategy: PlayerStrategy,
    pub runs: usize,
    pub mean_net_worth: f64,
    pub std_net_worth: f64,
    pub min_net_worth: f64,
    pub max_net_worth: f64,
    pub mean_rejected: f64,
    pub bands: Vec<BandCount>,
    pub failed_runs: usize,
}

impl StrategyAggregate {
    /// Share of runs that ended in `band`, in `[0, 1]`.
    #[must_use]
    pub fn band_share(&self, band: Band) -> f64 {
        let runs = self
            .bands
            .iter()
            .find(|count| count.band == band)
            .map_or(0, |count| count.runs);
        ratio(runs, self.runs)
    }
}

/// Group run records by strategy, in strategy order.
#[must_use]
pub fn aggregate_runs(records: &[RunRecord]) -> Vec<StrategyAggregate> {
    let mut builders: BTreeMap<PlayerStrategy, AggregateBuilder> = BTreeMap::new();
    for record in records {
        builders
            .entry(record.strategy)
            .or_insert_with(|| AggregateBuilder::new(record.strategy))
            .ingest(record);
    }
    builders
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

struct AggregateBuilder {
    strategy: PlayerStrategy,
    net_worth: RunningStats,
    min_net_worth: f64,
    max_net_worth: f64,
    rejected_sum: usize,
    bands: BTreeMap<Band, usize>,
    failed_runs: usize,
}

impl AggregateBuilder {
    fn new(strategy: PlayerStrategy) -> Self {
        Self {
            strategy,
            net_worth: RunningStats::default(),
            min_net_worth: f64::INFINITY,
            max_net_worth: f64::NEG_INFINITY,
            rejected_sum: 0,
            bands: BTreeMap::new(),
            failed_runs: 0,
        }
    }

    fn ingest(&mut self, record: &RunRecord) {
        self.net_worth.add(record.net_worth);
        self.min_net_worth = self.min_net_worth.min(record.net_worth);
        self.max_net_worth = self.max_net_worth.max(record.net_worth);
        self.rejected_sum = self.rejected_sum.saturating_add(record.rejected_actions);
        *self.bands.entry(record.band).or_insert(0) += 1;
        if !record.passed() {
            self.failed_runs += 1;
        }
    }

    fn finish(self) -> StrategyAggregate {
        let runs = usize::try_from(self.net_worth.count).unwrap_or(usize::MAX);
        StrategyAggregate {
            strategy: self.strategy,
            runs,
            mean_net_worth: self.net_worth.mean(),
            std_net_worth: self.net_worth.std_dev(),
            min_net_worth: finite_or_zero(self.min_net_worth),
            max_net_worth: finite_or_zero(self.max_net_worth),
            mean_rejected: ratio(self.rejected_sum, runs),
            bands: Band::ALL
                .into_iter()
                .map(|band| BandCount {
                    band,
                    runs: self.bands.get(&band).copied().unwrap_or(0),
                })
                .collect(),
            failed_runs: self.failed_runs,
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    usize_to_f64(numerator) / usize_to_f64(denominator)
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(strategy: PlayerStrategy, net_worth: f64, rejected: usize) -> RunRecord {
        RunRecord {
            strategy,
            seed: 1,
            rounds_played: 6,
            cash: net_worth.max(0.0),
            asset_sum: 0.0,
            debt: (-net_worth).max(0.0),
            net_worth,
            band: Band::classify(net_worth),
            accepted_actions: 3,
            rejected_actions: rejected,
            violations: Vec::new(),
            transcript: Vec::new(),
        }
    }

    #[test]
    fn groups_by_strategy_in_order() {
        let records = vec![
            record(PlayerStrategy::Reckless, -50.0, 2),
            record(PlayerStrategy::Cautious, 120.0, 0),
            record(PlayerStrategy::Reckless, 1500.0, 0),
        ];
        let aggregates = aggregate_runs(&records);
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].strategy, PlayerStrategy::Cautious);

        let reckless = &aggregates[1];
        assert_eq!(reckless.runs, 2);
        assert!((reckless.mean_net_worth - 725.0).abs() < 1e-9);
        assert!((reckless.min_net_worth + 50.0).abs() < 1e-9);
        assert!((reckless.max_net_worth - 1500.0).abs() < 1e-9);
        assert!((reckless.mean_rejected - 1.0).abs() < 1e-9);
        assert!((reckless.band_share(Band::Rich) - 0.5).abs() < 1e-9);
        assert!((reckless.band_share(Band::HeavyDebt) - 0.5).abs() < 1e-9);
        assert!(reckless.band_share(Band::Comfortable).abs() < f64::EPSILON);
        assert_eq!(reckless.bands.len(), Band::ALL.len());
    }

    #[test]
    fn failed_runs_are_counted() {
        let mut bad = record(PlayerStrategy::Random, 10.0, 0);
        bad.violations.push("cash went negative: -1.00".to_string());
        let aggregates = aggregate_runs(&[bad, record(PlayerStrategy::Random, 10.0, 0)]);
        assert_eq!(aggregates[0].failed_runs, 1);
        assert!(aggregates[0].std_net_worth.abs() < 1e-9);
    }

    #[test]
    fn empty_input_yields_no_aggregates() {
        assert!(aggregate_runs(&[]).is_empty());
    }
}
