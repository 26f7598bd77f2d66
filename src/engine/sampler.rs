use rand::Rng;

use crate::error::SampleError;

/// Draw a uniform random integer in `[min, max]` that is not in `used`.
///
/// The draw is uniform over the values still available, not over the whole
/// range, so heavily used ranges never need a rejection loop.
pub fn sample<R: Rng + ?Sized>(
    rng: &mut R,
    min: u32,
    max: u32,
    used: &[u32],
) -> Result<u32, SampleError> {
    if min > max {
        return Err(SampleError::InvalidRange { min, max });
    }
    if min == 0 || max == 0 {
        return Err(SampleError::NonPositiveBound { min, max });
    }

    if min == max {
        if used.contains(&min) {
            return Err(SampleError::SingleValueUsed { value: min });
        }
        return Ok(min);
    }

    let available: Vec<u32> = (min..=max).filter(|v| !used.contains(v)).collect();
    if available.is_empty() {
        return Err(SampleError::Exhausted { min, max });
    }

    Ok(available[rng.gen_range(0..available.len())])
}
