//! Wrapping monotonic time
//!
//! Deadlines are kept as 32-bit millisecond tick counts, which wrap after
//! about 49.7 days. Two ticks are ordered by the sign of their wrapping
//! difference, never by comparing raw counter values, so a deadline scheduled
//! just before the wrap still expires just after it.
//!
//! ## Example
//!
//! ```
//! use hourglass::Ticks;
//!
//! let before_wrap = Ticks::from_millis(u32::MAX - 5);
//! let after_wrap = before_wrap.wrapping_add(10);
//!
//! assert_eq!(after_wrap.as_millis(), 4);
//! assert_eq!(after_wrap.diff(before_wrap), 10);
//! assert!(after_wrap.is_after(before_wrap));
//! ```

/// A point on the wrapping millisecond counter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Ticks(u32);

impl Ticks {
    /// Wrap a raw millisecond count
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    /// Raw millisecond count
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Offset by `ms`, wrapping at the counter width
    pub const fn wrapping_add(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }

    /// Signed distance `self - earlier`
    ///
    /// Correct as long as the true distance is within ±2^31 ms.
    pub const fn diff(self, earlier: Ticks) -> i32 {
        self.0.wrapping_sub(earlier.0) as i32
    }

    /// Whether `self` lies strictly after `other`
    pub const fn is_after(self, other: Ticks) -> bool {
        self.diff(other) > 0
    }
}

/// Source of monotonic time
///
/// Board code implements this on top of its timer (e.g. embassy-time's
/// `Instant::now().as_millis()` truncated to 32 bits).
pub trait Monotonic {
    /// Current tick count
    fn now(&self) -> Ticks;
}

impl<T: Monotonic + ?Sized> Monotonic for &T {
    fn now(&self) -> Ticks {
        (**self).now()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use core::cell::Cell;

    /// Hand-cranked clock for tests
    #[derive(Debug, Default)]
    pub struct ManualClock {
        now: Cell<u32>,
    }

    impl ManualClock {
        pub fn starting_at(ms: u32) -> Self {
            Self { now: Cell::new(ms) }
        }

        pub fn advance(&self, ms: u32) {
            self.now.set(self.now.get().wrapping_add(ms));
        }
    }

    impl Monotonic for ManualClock {
        fn now(&self) -> Ticks {
            Ticks::from_millis(self.now.get())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_plain() {
        let a = Ticks::from_millis(1_000);
        let b = Ticks::from_millis(1_500);
        assert_eq!(b.diff(a), 500);
        assert_eq!(a.diff(b), -500);
        assert!(b.is_after(a));
        assert!(!a.is_after(b));
    }

    #[test]
    fn test_equal_ticks_are_not_after() {
        let a = Ticks::from_millis(42);
        assert_eq!(a.diff(a), 0);
        assert!(!a.is_after(a));
    }

    #[test]
    fn test_diff_across_wrap() {
        let deadline = Ticks::from_millis(u32::MAX - 100).wrapping_add(1_000);
        assert_eq!(deadline.as_millis(), 899);

        let just_before = Ticks::from_millis(u32::MAX - 10);
        assert!(!just_before.is_after(deadline));
        assert_eq!(deadline.diff(just_before), 910);

        let just_after = Ticks::from_millis(900);
        assert!(just_after.is_after(deadline));
    }

    #[test]
    fn test_raw_compare_would_be_wrong_across_wrap() {
        let now = Ticks::from_millis(5);
        let earlier = Ticks::from_millis(u32::MAX - 5);
        assert!(now.as_millis() < earlier.as_millis());
        assert!(now.is_after(earlier));
    }
}
