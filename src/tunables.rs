//! The adapter's runtime-mutable parameter surface.
//!
//! Wiring these to a real module-parameter or CLI system is out of
//! scope; this module only owns their storage and a thread-safe
//! read/write API, held behind a single `lazy_static!` global the same
//! way a process-wide mutable singleton is held elsewhere in this crate
//! (`crate::stats::STATS`).

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Baseline early-abort threshold, in bytes.
pub const DEFAULT_ABORT_SIZE: u64 = 131_072;

/// Floor the scaled-abort-size formula never goes below.
pub const ABORT_SIZE_FLOOR: u64 = 8193;

/// Default minimum `fs_level` ordinal at which probing is enabled.
pub const DEFAULT_CUTOFF_LEVEL: i64 = 3;

/// Default right-shift used to derive the lz4 probe's target size from
/// `src_len`: shift 3 means target ≈ 87.5% of `src_len`.
pub const DEFAULT_LZ4_SHIFT_SIZE: u64 = 3;

pub struct Tunables {
    pub lz4_pass: AtomicBool,
    pub zstd_pass: AtomicBool,
    /// 1, 2, or 3 — selects the zstd probe level.
    pub firstpass_mode: AtomicI64,
    pub cutoff_level: AtomicI64,
    pub abort_size: AtomicU64,
    /// Override mode: when > 0, forces the committed compress path
    /// regardless of probe outcome.
    pub hard_moed: AtomicI64,
    pub lz4_shift_size: AtomicU64,
    /// Gates the scaled-abort-size formula; disabled by default unless
    /// the `scaled-abort` cargo feature is enabled. Runtime-togglable
    /// either way.
    pub ea_division_mode: AtomicBool,
    pub ea_divisor: AtomicU64,
    pub ea_level_factor: AtomicU64,
}

impl Default for Tunables {
    fn default() -> Self {
        Tunables {
            lz4_pass: AtomicBool::new(true),
            zstd_pass: AtomicBool::new(true),
            firstpass_mode: AtomicI64::new(1),
            cutoff_level: AtomicI64::new(DEFAULT_CUTOFF_LEVEL),
            abort_size: AtomicU64::new(DEFAULT_ABORT_SIZE),
            hard_moed: AtomicI64::new(0),
            lz4_shift_size: AtomicU64::new(DEFAULT_LZ4_SHIFT_SIZE),
            ea_division_mode: AtomicBool::new(cfg!(feature = "scaled-abort")),
            ea_divisor: AtomicU64::new(2),
            ea_level_factor: AtomicU64::new(1),
        }
    }
}

impl Tunables {
    /// The effective early-abort threshold `T` for a given requested
    /// codec level.
    ///
    /// When `ea_division_mode` is off (the default), this is just
    /// `abort_size`. When on, `T` is divided by `ea_divisor` for every
    /// `ea_level_factor` levels the requested level sits above
    /// `cutoff_level`, floored at `ABORT_SIZE_FLOOR`.
    pub fn effective_abort_size(&self, codec_level: i32) -> u64 {
        let base = self.abort_size.load(Ordering::Relaxed);
        if !self.ea_division_mode.load(Ordering::Relaxed) {
            return base;
        }
        let cutoff = self.cutoff_level.load(Ordering::Relaxed);
        let factor = self.ea_level_factor.load(Ordering::Relaxed).max(1);
        let divisor = self.ea_divisor.load(Ordering::Relaxed).max(1);
        let levels_above = (i64::from(codec_level) - cutoff).max(0) as u64;
        let steps = levels_above / factor;
        let mut t = base;
        for _ in 0..steps {
            t /= divisor;
            if t <= ABORT_SIZE_FLOOR {
                return ABORT_SIZE_FLOOR;
            }
        }
        t.max(ABORT_SIZE_FLOOR)
    }
}

lazy_static::lazy_static! {
    pub static ref TUNABLES: Tunables = Tunables::default();
}
