//! Monotonic clock wrapper used to age-out idle pool contents.
//!
//! `ObjectPool` only ever compares two `Tick`s taken from the same
//! process, so `Instant` — guaranteed monotonic and immune to wall-clock
//! adjustment — is the right primitive, unlike `Time` in a persisted
//! on-disk timestamp.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Tick(Instant);

impl Tick {
    #[inline]
    pub fn now() -> Self {
        Tick(Instant::now())
    }

    /// Elapsed time since this tick was taken, saturating to zero if the
    /// clock has somehow gone backwards relative to `self`.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// True once at least `threshold` has elapsed since this tick.
    #[inline]
    pub fn is_older_than(&self, threshold: Duration) -> bool {
        self.elapsed() >= threshold
    }
}

impl Default for Tick {
    #[inline]
    fn default() -> Self {
        Tick::now()
    }
}
