use std::time::Duration;

/// Share of the answer window already used, capped at 1.
pub fn elapsed_fraction(elapsed: Duration, timeout: Duration) -> f64 {
    if timeout.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / timeout.as_secs_f64()).clamp(0.0, 1.0)
}

/// Points for a correct answer: the full base plus a speed bonus that decays
/// linearly to zero at the timeout.
pub fn correct_answer_points(base: u32, elapsed_fraction: f64) -> u32 {
    let speed = 1.0 - elapsed_fraction.clamp(0.0, 1.0);
    base + (base as f64 * speed).round() as u32
}
