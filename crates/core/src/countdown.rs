//! Wall-clock countdown for the session budget.
//!
//! Elapsed time is measured from absolute timestamps rather than counted
//! ticks, so a late or skipped tick never loses or gains time. The anchor only
//! advances by the whole seconds actually charged; sub-second remainders carry
//! into the next tick.

use chrono::{DateTime, Duration, Utc};

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Whole seconds since the anchor.
    pub elapsed: u32,
    /// Seconds actually taken off the budget (`elapsed` clamped to what was left).
    pub charged: u32,
    pub remaining: u32,
    pub expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    anchor: Option<DateTime<Utc>>,
}

impl Countdown {
    /// A stopped countdown holding `remaining` seconds.
    #[must_use]
    pub fn new(remaining: u32) -> Self {
        Self {
            remaining,
            anchor: None,
        }
    }

    /// Begin measuring from `now`. Time before this call is never charged.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        self.anchor = Some(now);
    }

    /// Stop measuring; later ticks are idle.
    pub fn stop(&mut self) {
        self.anchor = None;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Charge the whole seconds elapsed since the anchor.
    ///
    /// A clock that moved backwards re-anchors at `now` without charging.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        let Some(anchor) = self.anchor else {
            return self.idle();
        };

        let delta = now - anchor;
        if delta < Duration::zero() {
            self.anchor = Some(now);
            return self.idle();
        }

        let elapsed = u32::try_from(delta.num_seconds()).unwrap_or(u32::MAX);
        if elapsed == 0 {
            return self.idle();
        }

        self.anchor = Some(anchor + Duration::seconds(i64::from(elapsed)));
        let charged = elapsed.min(self.remaining);
        self.remaining -= charged;

        Tick {
            elapsed,
            charged,
            remaining: self.remaining,
            expired: self.is_expired(),
        }
    }

    fn idle(&self) -> Tick {
        Tick {
            elapsed: 0,
            charged: 0,
            remaining: self.remaining,
            expired: self.is_expired(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn clamps_at_zero_and_reports_expiry() {
        let start = fixed_now();
        let mut countdown = Countdown::new(5);
        countdown.arm(start);

        let first = countdown.tick(start + Duration::seconds(3));
        assert_eq!(first.charged, 3);
        assert_eq!(first.remaining, 2);
        assert!(!first.expired);

        let second = countdown.tick(start + Duration::seconds(6));
        assert_eq!(second.elapsed, 3);
        assert_eq!(second.charged, 2);
        assert_eq!(second.remaining, 0);
        assert!(second.expired);
    }

    #[test]
    fn sub_second_remainders_carry_over() {
        let start = fixed_now();
        let mut countdown = Countdown::new(100);
        countdown.arm(start);

        assert_eq!(countdown.tick(start + Duration::milliseconds(999)).elapsed, 0);
        assert_eq!(countdown.tick(start + Duration::milliseconds(1_998)).elapsed, 1);
        assert_eq!(countdown.tick(start + Duration::milliseconds(2_001)).elapsed, 1);
        assert_eq!(countdown.remaining(), 98);
    }

    #[test]
    fn backwards_clock_is_not_charged() {
        let start = fixed_now();
        let mut countdown = Countdown::new(60);
        countdown.arm(start);

        let tick = countdown.tick(start - Duration::seconds(30));
        assert_eq!(tick.charged, 0);
        assert_eq!(countdown.tick(start + Duration::seconds(-29)).elapsed, 1);
        assert_eq!(countdown.remaining(), 59);
    }

    #[test]
    fn stopped_countdown_is_idle() {
        let mut countdown = Countdown::new(10);
        assert_eq!(countdown.tick(fixed_now()).charged, 0);

        countdown.arm(fixed_now());
        countdown.stop();
        let tick = countdown.tick(fixed_now() + Duration::seconds(8));
        assert_eq!(tick.remaining, 10);
        assert!(!countdown.is_running());
    }
}
