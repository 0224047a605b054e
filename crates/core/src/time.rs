use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
///
/// The attempt timer is derived from this clock rather than from a running
/// task: callers ask for elapsed seconds whenever they need them.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Whole seconds between `since` and now, clamped at zero for clocks
    /// that run behind the given instant.
    #[must_use]
    pub fn elapsed_seconds(&self, since: DateTime<Utc>) -> u64 {
        let seconds = (self.now() - since).num_seconds();
        u64::try_from(seconds).unwrap_or(0)
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock represents real time.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Clock::Default)
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Deterministic timestamp for tests and examples (2025-06-15T15:06:40Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_750_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_seconds_counts_forward() {
        let mut clock = fixed_clock();
        let start = clock.now();
        clock.advance(Duration::seconds(95));
        assert_eq!(clock.elapsed_seconds(start), 95);
    }

    #[test]
    fn elapsed_seconds_clamps_negative_to_zero() {
        let clock = fixed_clock();
        let future = clock.now() + Duration::seconds(30);
        assert_eq!(clock.elapsed_seconds(future), 0);
    }
}
