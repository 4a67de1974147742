use std::time::Duration;

use tracing::debug;

use crate::{
    cancel::Cancellation,
    result::{Error, Result},
};

/// Draw a delay uniformly from `[min_secs, max_secs]`.
///
/// `0, 0` disables the wait entirely.
pub fn next_delay(min_secs: f64, max_secs: f64) -> Result<Duration> {
    let invalid = || Error::InvalidRange {
        min: min_secs,
        max: max_secs,
    };

    // Both bounds must be representable, not only the drawn value
    let valid = min_secs <= max_secs
        && Duration::try_from_secs_f64(min_secs).is_ok()
        && Duration::try_from_secs_f64(max_secs).is_ok();
    if !valid {
        return Err(invalid());
    }

    if max_secs == 0.0 {
        return Ok(Duration::ZERO);
    }

    let secs = min_secs + fastrand::f64() * (max_secs - min_secs);
    Duration::try_from_secs_f64(secs.clamp(min_secs, max_secs)).map_err(|_| invalid())
}

/// Randomized pause between two consecutive requests to the platform
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    min_secs: f64,
    max_secs: f64,
}

impl RateLimiter {
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self> {
        // Validate the range once here so that `wait` cannot fail later
        next_delay(min_secs, max_secs)?;
        Ok(Self { min_secs, max_secs })
    }

    /// Block for a random delay, returning early if cancelled.
    ///
    /// Return `false` if the wait was interrupted.
    pub fn wait(&self, cancel: &Cancellation) -> Result<bool> {
        let delay = next_delay(self.min_secs, self.max_secs)?;
        debug!("Waiting {:.2}s before the next download", delay.as_secs_f64());

        Ok(!cancel.sleep(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_stay_in_bounds() {
        for _ in 0..1000 {
            let delay = next_delay(1.0, 2.0).unwrap();
            assert!(delay >= Duration::from_secs(1), "{delay:?}");
            assert!(delay <= Duration::from_secs(2), "{delay:?}");
        }
    }

    #[test]
    fn zero_range_means_no_wait() {
        assert_eq!(next_delay(0.0, 0.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn equal_bounds_give_exact_delay() {
        assert_eq!(next_delay(1.5, 1.5).unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn inverted_or_invalid_range_is_rejected() {
        assert!(matches!(
            next_delay(3.0, 2.0),
            Err(Error::InvalidRange { .. })
        ));
        assert!(next_delay(-1.0, 2.0).is_err());
        assert!(next_delay(0.0, f64::NAN).is_err());
        assert!(RateLimiter::new(5.0, 1.0).is_err());
    }

    #[test]
    fn huge_bounds_are_rejected() {
        assert!(matches!(
            RateLimiter::new(0.0, 1e20),
            Err(Error::InvalidRange { .. })
        ));
        assert!(next_delay(1e20, 1e21).is_err());
        assert!(next_delay(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn wait_is_interrupted_by_cancel() {
        let limiter = RateLimiter::new(30.0, 60.0).unwrap();
        let cancel = Cancellation::new();
        cancel.cancel();
        assert!(!limiter.wait(&cancel).unwrap());
    }

    #[test]
    fn zero_wait_completes() {
        let limiter = RateLimiter::new(0.0, 0.0).unwrap();
        assert!(limiter.wait(&Cancellation::new()).unwrap());
    }
}
