use anyhow::{Result, bail};
use std::collections::HashSet;

/// Seed used when none is given on the command line.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into numeric seeds, keeping first-seen order.
///
/// Negative integers are folded to their magnitude.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::with_capacity(tokens.len());

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let seed = if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            value
        } else {
            bail!("Unrecognized seed token: {token}");
        };
        if seen.insert(seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

/// Seeds for every iteration of every base seed: `seed + i` for `i` in `0..iterations`.
#[must_use]
pub fn expand_iterations(seeds: &[u64], iterations: usize) -> Vec<u64> {
    let iterations = u64::try_from(iterations.max(1)).unwrap_or(u64::MAX);
    seeds
        .iter()
        .flat_map(|&seed| (0..iterations).map(move |i| seed.wrapping_add(i)))
        .collect()
}
