use finsim_game::{
    CountingRng, EngineConfig, GameState, Instrument, MarketRng, StartupOutcome, resolve_round,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_chacha::ChaCha20Rng;
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.025;

fn staked_state() -> GameState {
    let mut state = GameState::default();
    state.assets.stocks = 100.0;
    state.assets.bonds = 100.0;
    state.assets.crypto = 100.0;
    state.assets.startup = 10.0;
    state
}

fn sample_total() -> f64 {
    f64::from(u32::try_from(SAMPLE_SIZE).expect("sample size fits u32"))
}

#[test]
fn startup_win_rate_tracks_configured_probability() {
    let cfg = EngineConfig::default();
    let mut rng = CountingRng::wrap(SmallRng::seed_from_u64(0xACED));

    let mut wins = 0usize;
    for _ in 0..SAMPLE_SIZE {
        let mut state = staked_state();
        let report = resolve_round(&mut state, &cfg, &mut rng).expect("round resolves");
        if matches!(report.startup, StartupOutcome::Win { .. }) {
            wins += 1;
        }
    }
    let observed = f64::from(u32::try_from(wins).expect("count fits")) / sample_total();
    assert!(
        (observed - cfg.startup.win_probability).abs() <= TOLERANCE,
        "startup win rate drifted: observed {observed:.4}"
    );
    assert_eq!(rng.draws(), 4 * u64::try_from(SAMPLE_SIZE).expect("fits"));
}

#[test]
fn mean_market_returns_sit_mid_range() {
    let cfg = EngineConfig::default();
    let mut rng = CountingRng::wrap(ChaCha20Rng::seed_from_u64(2024));

    let mut sums = [0.0_f64; 3];
    for _ in 0..SAMPLE_SIZE {
        let mut state = staked_state();
        let report = resolve_round(&mut state, &cfg, &mut rng).expect("round resolves");
        for (slot, instrument) in Instrument::MARKET.iter().enumerate() {
            let market_move = report.move_for(*instrument).expect("market move");
            sums[slot] += market_move.rate;
        }
    }

    let total = sample_total();
    let stocks = sums[0] / total;
    let bonds = sums[1] / total;
    let crypto = sums[2] / total;
    assert!((stocks - 0.10).abs() <= TOLERANCE, "stocks mean {stocks:.4}");
    assert!((bonds - 0.04).abs() <= 0.005, "bonds mean {bonds:.4}");
    assert!((crypto - 0.60).abs() <= 2.0 * TOLERANCE, "crypto mean {crypto:.4}");
}

#[test]
fn seeded_market_streams_differ_between_seeds() {
    let cfg = EngineConfig::default();
    let mut first = MarketRng::from_user_seed(1);
    let mut second = MarketRng::from_user_seed(2);

    let mut left = staked_state();
    let mut right = staked_state();
    let a = resolve_round(&mut left, &cfg, &mut first).expect("round resolves");
    let b = resolve_round(&mut right, &cfg, &mut second).expect("round resolves");
    assert_ne!(a.moves, b.moves);
}
