//! Bounded retry with a fixed delay between attempts.

use std::thread;
use std::time::Duration;

use tracing::warn;

/// Runs `op` up to `attempts` times, sleeping `delay` between failures, and
/// returns the last error once attempts are exhausted.
pub fn with_retries<T, E, F>(
    what: &str,
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(error) if attempt < attempts => {
                warn!("{what} failed (attempt {attempt}/{attempts}): {error}; retrying");
                thread::sleep(delay);
            }
            Err(error) => {
                warn!("{what} failed after {attempts} attempts: {error}");
                return Err(error);
            }
        }
    }
}
