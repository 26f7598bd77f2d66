use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::sampler;
use crate::error::SampleError;

/// Largest product that has a single-digit operand (9 × 12). Decoys for
/// products up to this value never go above it.
const SINGLE_DIGIT_OPERAND_CEILING: u32 = 108;
const SPREAD: u32 = 12;
/// Two-digit products below this look nothing like the answer.
const TWO_DIGIT_FLOOR: u32 = 6;

/// Range of values that look numerically plausible next to `solution`.
///
/// Three-digit products stay three-digit with a spread of 12. The 108 ceiling
/// caps two-digit windows and three-digit products up to 108 (so 9 × 12 gets
/// `[100, 108]`); larger products keep the full `s + 12` upper bound.
pub fn plausibility_window(solution: u32) -> RangeInclusive<u32> {
    if solution < 10 {
        2..=9
    } else if solution < 100 {
        let low = solution.saturating_sub(SPREAD).max(TWO_DIGIT_FLOOR);
        let high = (solution + SPREAD).min(SINGLE_DIGIT_OPERAND_CEILING);
        low..=high
    } else {
        let low = solution.saturating_sub(SPREAD).max(100);
        let high = if solution <= SINGLE_DIGIT_OPERAND_CEILING {
            SINGLE_DIGIT_OPERAND_CEILING
        } else {
            solution + SPREAD
        };
        low..=high
    }
}

/// Build `count` unique multiple-choice values containing `solution` exactly
/// once, in random order.
pub fn build_proposals<R: Rng + ?Sized>(
    rng: &mut R,
    solution: u32,
    count: usize,
) -> Result<Vec<u32>, SampleError> {
    let window = plausibility_window(solution);
    let mut proposals = Vec::with_capacity(count);
    proposals.push(solution);
    while proposals.len() < count {
        let value = sampler::sample(rng, *window.start(), *window.end(), &proposals)?;
        proposals.push(value);
    }
    proposals.shuffle(rng);
    Ok(proposals)
}
