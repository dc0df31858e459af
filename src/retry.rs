use std::time::Duration;

use crate::CloudResult;

/// Statuses that trigger another attempt instead of ending the call.
pub(crate) const RETRYABLE_STATUSES: [u16; 2] = [429, 500];

/// Exponential backoff: each delay doubles the previous one, capped at `max`.
#[derive(Clone, Debug)]
pub(crate) struct Backoff {
    next_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub(crate) fn new(initial_ms: u64, max_ms: u64) -> Self {
        Self {
            next_ms: initial_ms.min(max_ms),
            max_ms,
        }
    }

    /// Returns the current delay and advances to the next one.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.next_ms;
        self.next_ms = self.next_ms.saturating_mul(2).min(self.max_ms);
        Duration::from_millis(delay)
    }
}

/// An attempt is retried when it produced no response (status 0 included) or a
/// retryable status.
pub(crate) fn should_retry(response: Option<&CloudResult>) -> bool {
    match response {
        None => true,
        Some(response) => {
            response.status_code() == 0 || RETRYABLE_STATUSES.contains(&response.status_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{should_retry, Backoff};
    use crate::CloudResult;

    #[test]
    fn backoff_doubles_until_cap() {
        let mut backoff = Backoff::new(250, 10_000);
        let delays: Vec<u64> = (0..10)
            .map(|_| backoff.next_delay().as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![250, 500, 1_000, 2_000, 4_000, 8_000, 10_000, 10_000, 10_000, 10_000]
        );
    }

    #[test]
    fn backoff_matches_closed_form() {
        let mut backoff = Backoff::new(250, 10_000);
        for k in 0..20u32 {
            let expected = (250u64 << k).min(10_000);
            assert_eq!(backoff.next_delay(), Duration::from_millis(expected));
        }
    }

    #[test]
    fn backoff_never_exceeds_cap() {
        let mut backoff = Backoff::new(50_000, 10_000);
        assert_eq!(backoff.next_delay(), Duration::from_millis(10_000));

        let mut backoff = Backoff::new(u64::MAX / 2 + 1, u64::MAX);
        backoff.next_delay();
        assert_eq!(backoff.next_delay(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn retries_only_on_missing_response_429_and_500() {
        assert!(should_retry(None));
        assert!(should_retry(Some(&CloudResult::empty())));
        assert!(should_retry(Some(&CloudResult::new(429, "", None))));
        assert!(should_retry(Some(&CloudResult::new(500, "", None))));

        for status in [200, 204, 400, 401, 404, 409, 502, 503, 504] {
            assert!(
                !should_retry(Some(&CloudResult::new(status, "", None))),
                "status {status} must be final"
            );
        }
    }
}
