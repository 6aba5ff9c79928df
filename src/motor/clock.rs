//! Monotonic microsecond time source.

/// Monotonic microsecond counter that wraps silently.
///
/// Only differences between readings are meaningful; use [`elapsed_micros`].
pub trait Clock {
    /// Current counter value in microseconds.
    fn now_micros(&mut self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &mut C {
    #[inline]
    fn now_micros(&mut self) -> u32 {
        (**self).now_micros()
    }
}

/// Microseconds from `earlier` to `now`, correct across one counter wrap.
#[inline]
pub fn elapsed_micros(earlier: u32, now: u32) -> u32 {
    now.wrapping_sub(earlier)
}

/// [`Clock`] backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Start a clock at 0 µs.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_micros(&mut self) -> u32 {
        // Truncation gives the wrapping semantics of a hardware counter.
        self.origin.elapsed().as_micros() as u32
    }
}
