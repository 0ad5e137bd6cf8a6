//! Retry backoff schedule for location fetches
//!
//! Deterministic exponential schedule with no jitter. The first attempt
//! fires immediately; later attempts double from `RETRY_SCALE` until the
//! schedule hits `MAX_DELAY`.

use std::time::Duration;

/// Base delay unit for the exponential schedule
pub const RETRY_SCALE: Duration = Duration::from_millis(50);

/// Ceiling for the schedule (30 minutes)
pub const MAX_DELAY: Duration = Duration::from_secs(30 * 60);

/// Attempt number at which the schedule reaches `MAX_DELAY`
pub const MAX_RETRIES: u32 = 17;

/// Delay before the given retry attempt.
///
/// Attempt 0 waits nothing; attempt `n` in `1..17` waits
/// `2^(n-1) * 50ms`; attempt 17 and beyond wait the 30 minute cap.
pub fn delay(attempt: u32) -> Duration {
    if attempt == 0 {
        Duration::ZERO
    } else if attempt < MAX_RETRIES {
        RETRY_SCALE * 2u32.pow(attempt - 1)
    } else {
        MAX_DELAY
    }
}
