//! Retry pacing for OpenSky requests.
//!
//! The public API rate-limits aggressively, so transient failures back
//! off exponentially with jitter instead of retrying in a tight loop.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    current: Duration,
    max: Duration,
    jitter_ratio: f64,
}

impl Backoff {
    pub(crate) fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        Self {
            current: base,
            max: max.max(base),
            jitter_ratio: 0.2,
        }
    }

    /// Delay to sleep before the next attempt. Doubles per call up to the
    /// configured maximum.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = add_jitter(self.current, self.jitter_ratio);
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }
}

fn add_jitter(delay: Duration, ratio: f64) -> Duration {
    if !(0.0..=1.0).contains(&ratio) {
        return delay;
    }

    let delay_ms = delay.as_millis();
    if delay_ms == 0 {
        return delay;
    }

    let jitter_ms_max = ((delay_ms as f64) * ratio) as u128;
    if jitter_ms_max == 0 {
        return delay;
    }

    let now_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    let jitter_ms = (now_nanos as u128) % (jitter_ms_max + 1);
    delay + Duration::from_millis(jitter_ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_up_to_max() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(350));

        let first = backoff.next_delay();
        assert!(first >= Duration::from_millis(100));
        assert!(first <= Duration::from_millis(120));

        let second = backoff.next_delay();
        assert!(second >= Duration::from_millis(200));
        assert!(second <= Duration::from_millis(240));

        let third = backoff.next_delay();
        assert!(third >= Duration::from_millis(350));
        assert!(third <= Duration::from_millis(420));

        // Saturated.
        let fourth = backoff.next_delay();
        assert!(fourth >= Duration::from_millis(350));
        assert!(fourth <= Duration::from_millis(420));
    }

    #[test]
    fn zero_base_is_clamped() {
        let mut backoff = Backoff::new(Duration::ZERO, Duration::from_millis(10));
        let delay = backoff.next_delay();
        assert!(delay >= Duration::from_millis(1));
    }
}
