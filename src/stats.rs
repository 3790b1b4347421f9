//! Monotonic outcome counters exposed to the platform's statistics
//! facility.
//!
//! Counters never affect correctness — they exist purely for outcome
//! classification, so ordering between increments is not guaranteed.

use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! counters {
    ($($name:ident),* $(,)?) => {
        /// A flat record of atomic, append-only u64 counters.
        #[derive(Debug, Default)]
        pub struct StatsSink {
            $(pub $name: AtomicU64,)*
        }

        impl StatsSink {
            pub fn new() -> Self {
                Self::default()
            }

            $(
                #[inline]
                pub fn $name(&self) -> u64 {
                    self.$name.load(Ordering::Relaxed)
                }
            )*
        }
    };
}

counters! {
    alloc_fail,
    compress_alloc_fail,
    decompress_alloc_fail,
    decompress_alloc_fallback,
    compress_level_invalid,
    decompress_level_invalid,
    decompress_header_invalid,
    compress_failed,
    decompress_failed,
    lz4pass_allowed,
    lz4pass_rejected,
    zstdpass_allowed,
    zstdpass_rejected,
    passignored,
    passignored_size,
    buffers,
    size,
}

impl StatsSink {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(counter: &AtomicU64, delta: u64) {
        counter.fetch_add(delta, Ordering::Relaxed);
    }

    #[inline]
    pub fn sub(counter: &AtomicU64, delta: u64) {
        counter.fetch_sub(delta, Ordering::Relaxed);
    }

    /// Clears outcome counters but preserves `buffers` and `size`,
    /// which reflect live pool footprint rather than history.
    pub fn reset_outcomes(&self) {
        self.alloc_fail.store(0, Ordering::Relaxed);
        self.compress_alloc_fail.store(0, Ordering::Relaxed);
        self.decompress_alloc_fail.store(0, Ordering::Relaxed);
        self.decompress_alloc_fallback.store(0, Ordering::Relaxed);
        self.compress_level_invalid.store(0, Ordering::Relaxed);
        self.decompress_level_invalid.store(0, Ordering::Relaxed);
        self.decompress_header_invalid.store(0, Ordering::Relaxed);
        self.compress_failed.store(0, Ordering::Relaxed);
        self.decompress_failed.store(0, Ordering::Relaxed);
        self.lz4pass_allowed.store(0, Ordering::Relaxed);
        self.lz4pass_rejected.store(0, Ordering::Relaxed);
        self.zstdpass_allowed.store(0, Ordering::Relaxed);
        self.zstdpass_rejected.store(0, Ordering::Relaxed);
        self.passignored.store(0, Ordering::Relaxed);
        self.passignored_size.store(0, Ordering::Relaxed);
    }
}

lazy_static::lazy_static! {
    /// The adapter's single process-wide stats record, shared by both
    /// codec pools and both compress/decompress paths.
    pub static ref STATS: StatsSink = StatsSink::new();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_increments() {
        let s = StatsSink::new();
        StatsSink::bump(&s.compress_failed);
        StatsSink::bump(&s.compress_failed);
        assert_eq!(s.compress_failed(), 2);
    }

    #[test]
    fn reset_preserves_buffers_and_size() {
        let s = StatsSink::new();
        StatsSink::add(&s.buffers, 4);
        StatsSink::add(&s.size, 1024);
        StatsSink::bump(&s.compress_failed);
        s.reset_outcomes();
        assert_eq!(s.buffers(), 4);
        assert_eq!(s.size(), 1024);
        assert_eq!(s.compress_failed(), 0);
    }
}
