use std::time::Duration;

use web_time::Instant;

#[derive(Debug, Clone)]
struct Armed<T> {
    data: T,
    since: Instant,
    fired: bool,
}

/// Fires once when the same value has been reported continuously for `threshold`.
///
/// Time is passed in by the caller, so the tracker itself owns no timer; the host schedules a
/// wake-up at [`HoldTracker::deadline`] and calls [`HoldTracker::poll`].
#[derive(Debug, Clone)]
pub struct HoldTracker<T> {
    threshold: Duration,
    armed: Option<Armed<T>>,
}

impl<T: Clone + PartialEq> HoldTracker<T> {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            armed: None,
        }
    }

    #[inline]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Reports the current value. A different value (or `None`) restarts the countdown; the
    /// same value keeps the original start time.
    pub fn set_data(&mut self, data: Option<T>, now: Instant) {
        let Some(data) = data else {
            self.reset();
            return;
        };
        if self.armed.as_ref().is_some_and(|armed| armed.data == data) {
            return;
        }
        self.armed = Some(Armed {
            data,
            since: now,
            fired: false,
        });
    }

    pub fn reset(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.as_ref().is_some_and(|armed| !armed.fired)
    }

    /// When the armed value will fire, if it has not fired yet.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed
            .as_ref()
            .filter(|armed| !armed.fired)
            .map(|armed| armed.since + self.threshold)
    }

    /// Returns the held value exactly once, after the threshold has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let armed = self.armed.as_mut()?;
        if armed.fired || now.saturating_duration_since(armed.since) < self.threshold {
            return None;
        }
        armed.fired = true;
        Some(armed.data.clone())
    }
}
