use std::time::Instant;

/// A repeating task schedule with an explicit cancellation handle.
///
/// The orchestrator owns one per recurring concern (the 1 s countdown). The
/// owner polls with its current timestamp and receives the number of whole
/// periods elapsed since the last poll, so a late poll catches up instead of
/// dropping ticks. Every exit path must call [`Ticker::cancel`].
#[derive(Debug, Default, Clone)]
pub struct Ticker {
    period: f32,
    next_due: Option<f64>,
}

impl Ticker {
    /// Arms the ticker: the first fire is one period after `now`.
    pub fn start(period: f32, now: f64) -> Self {
        Self {
            period,
            next_due: Some(now + period as f64),
        }
    }

    /// Returns how many periods have elapsed up to `now` and reschedules.
    /// A cancelled ticker never fires.
    pub fn poll(&mut self, now: f64) -> u32 {
        let Some(due) = self.next_due else {
            return 0;
        };
        if now < due {
            return 0;
        }

        let period = self.period as f64;
        let fires = 1 + ((now - due) / period) as u32;
        self.next_due = Some(due + fires as f64 * period);
        fires
    }

    /// Stops the schedule. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }
}

/// A one-shot delay with the same cancellation contract as [`Ticker`].
#[derive(Debug, Default, Clone)]
pub struct Delay {
    due: Option<f64>,
}

impl Delay {
    pub fn start(seconds: f32, now: f64) -> Self {
        Self {
            due: Some(now + seconds as f64),
        }
    }

    /// True once `now` has reached the deadline. A cancelled delay never
    /// expires.
    pub fn expired(&self, now: f64) -> bool {
        matches!(self.due, Some(due) if now >= due)
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }
}

/// Monotonic wall-clock adapter feeding the orchestrator in the real app.
///
/// Tests bypass this entirely by advancing synthetic timestamps.
#[derive(Debug, Clone)]
pub struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    /// Captures the current instant as time zero.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock was started.
    pub fn now_seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_fires_once_per_period() {
        let mut ticker = Ticker::start(1.0, 10.0);
        assert_eq!(ticker.poll(10.5), 0);
        assert_eq!(ticker.poll(11.0), 1);
        assert_eq!(ticker.poll(11.9), 0);
        assert_eq!(ticker.poll(12.0), 1);
    }

    #[test]
    fn ticker_catches_up_after_a_late_poll() {
        let mut ticker = Ticker::start(1.0, 0.0);
        assert_eq!(ticker.poll(3.5), 3);
        assert_eq!(ticker.poll(4.0), 1);
    }

    #[test]
    fn cancelled_ticker_never_fires() {
        let mut ticker = Ticker::start(1.0, 0.0);
        ticker.cancel();
        ticker.cancel();
        assert_eq!(ticker.poll(100.0), 0);
        assert!(!ticker.is_running());
    }

    #[test]
    fn delay_expires_exactly_once_armed() {
        let delay = Delay::start(3.0, 5.0);
        assert!(!delay.expired(7.9));
        assert!(delay.expired(8.0));
        assert!(delay.expired(50.0));
    }

    #[test]
    fn cancelled_delay_never_expires() {
        let mut delay = Delay::start(1.0, 0.0);
        delay.cancel();
        assert!(!delay.expired(100.0));
        assert!(!delay.is_armed());
    }

    #[test]
    fn session_clock_is_monotonic() {
        let clock = SessionClock::start();
        let a = clock.now_seconds();
        let b = clock.now_seconds();
        assert!(b >= a);
        assert!(a >= 0.0);
    }
}
