//! A low-contention pool of expensive working-state objects — codec
//! compression/decompression contexts — shared across threads.
//!
//! The pool holds a single lock guarding `(slots, last_touched)`. The
//! codec call itself always runs *outside* the lock; once `grab`
//! returns, the caller owns the object exclusively until `ungrab`.
//! Slot selection is unordered: `grab` takes the first occupied slot it
//! finds, `ungrab` fills the first empty one. No LIFO/LRU guarantee is
//! made or needed.

use std::sync::atomic::AtomicU64;
use std::sync::Mutex;
use std::time::Duration;

use crate::base::Tick;
use crate::stats::StatsSink;

/// How long a fully-idle pool (every slot occupied, nothing rented)
/// must sit untouched before `reap` clears it.
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(15);

/// A working-state object the pool can create, reset for reuse, and
/// estimate the footprint of for stats purposes.
pub trait Poolable: Sized {
    /// Allocates a fresh object. Returns `None` on allocator exhaustion.
    fn create() -> Option<Self>;

    /// Restores session state so the object is ready for a new caller.
    fn reset(&mut self);

    /// Approximate resident size, used only to drive the `size` stats
    /// counter — not load-bearing for correctness.
    fn estimated_size() -> u64;
}

struct Inner<T> {
    slots: Vec<Option<Box<T>>>,
    last_touched: Tick,
}

pub struct ObjectPool<T> {
    inner: Mutex<Inner<T>>,
    name: &'static str,
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new(name: &'static str) -> Self {
        ObjectPool {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                last_touched: Tick::now(),
            }),
            name,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of slots currently in the pool's slot vector (occupied or
    /// empty). This is the pool's `size`/`count`, not the number of
    /// objects currently rented out.
    pub fn slot_count(&self) -> usize {
        self.inner.lock().unwrap().slots.len()
    }

    /// Acquires a working-state object, creating one if the pool has
    /// no cached object available.
    pub fn grab(&self, stats: &StatsSink, alloc_fail_counter: &AtomicU64) -> Option<Box<T>> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(slot) = inner.slots.iter_mut().find(|s| s.is_some()) {
                let mut obj = slot.take().expect("slot checked non-empty");
                inner.last_touched = Tick::now();
                drop(inner);
                obj.reset();
                return Some(obj);
            }
            // Every slot (if any) is rented; fall through to create a
            // fresh object outside the lock.
        }

        let fresh = T::create();
        let fresh = match fresh {
            Some(obj) => obj,
            None => {
                StatsSink::bump(alloc_fail_counter);
                return None;
            }
        };

        {
            let mut inner = self.inner.lock().unwrap();
            // Grow the slot vector by one empty cell to receive this
            // object's eventual return. If growth fails (it can't,
            // under `Vec`, short of OOM) the object is still handed
            // back; it will simply be freed instead of cached on its
            // `ungrab`.
            inner.slots.push(None);
            inner.last_touched = Tick::now();
        }
        StatsSink::bump(&stats.buffers);
        StatsSink::add(&stats.size, T::estimated_size());

        Some(Box::new(fresh))
    }

    /// Returns a working-state object to the pool. If no empty slot is
    /// available the object is dropped (freed) instead of cached.
    pub fn ungrab(&self, obj: Box<T>, stats: &StatsSink) {
        let mut inner = self.inner.lock().unwrap();
        debug_assert!(
            !inner.slots.iter().any(|s| match s {
                Some(cached) => std::ptr::eq(cached.as_ref(), obj.as_ref()),
                None => false,
            }),
            "ungrab called with an object already cached in the pool"
        );
        if let Some(slot) = inner.slots.iter_mut().find(|s| s.is_none()) {
            *slot = Some(obj);
            inner.last_touched = Tick::now();
            return;
        }
        inner.last_touched = Tick::now();
        drop(inner);
        // No empty cell: destroy the object instead of growing the
        // pool on the return path (only `grab` grows it).
        drop(obj);
        StatsSink::sub(&stats.buffers, 1);
        StatsSink::sub(&stats.size, T::estimated_size());
    }

    fn reap_inner(&self, force: bool) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let idle = force || inner.last_touched.is_older_than(IDLE_THRESHOLD);
        let none_rented = inner.slots.iter().all(|s| s.is_some());
        if idle && none_rented {
            let n = inner.slots.len();
            inner.slots.clear();
            inner.last_touched = Tick::now();
            n
        } else {
            0
        }
    }

    /// Destroys all cached objects if the pool has been idle (every
    /// slot occupied, none rented) for longer than `IDLE_THRESHOLD`.
    /// A no-op otherwise.
    pub fn reap(&self, stats: &StatsSink) -> usize {
        let n = self.reap_inner(false);
        if n > 0 {
            StatsSink::sub(&stats.buffers, n as u64);
            StatsSink::sub(&stats.size, n as u64 * T::estimated_size());
            log::debug!("pool {} reaped {} idle objects", self.name, n);
        }
        n
    }

    /// Unconditionally clears the pool. Precondition: no rentals are
    /// outstanding — violating this is a caller bug, not a runtime
    /// condition, so it's a debug assertion rather than an error
    /// return.
    pub fn destroy(&self, stats: &StatsSink) {
        {
            let inner = self.inner.lock().unwrap();
            debug_assert!(
                inner.slots.iter().all(|s| s.is_some()),
                "destroy called on pool {} with rentals outstanding",
                self.name
            );
        }
        let n = self.reap_inner(true);
        if n > 0 {
            StatsSink::sub(&stats.buffers, n as u64);
            StatsSink::sub(&stats.size, n as u64 * T::estimated_size());
        }
        debug_assert_eq!(self.slot_count(), 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;

    #[derive(Debug)]
    struct Dummy(u64);

    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    static RESET_COUNT: AtomicU64 = AtomicU64::new(0);

    impl Poolable for Dummy {
        fn create() -> Option<Self> {
            Some(Dummy(NEXT_ID.fetch_add(1, Ordering::Relaxed)))
        }
        fn reset(&mut self) {
            RESET_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        fn estimated_size() -> u64 {
            64
        }
    }

    #[test]
    fn grab_creates_when_empty() {
        let stats = StatsSink::new();
        let pool: ObjectPool<Dummy> = ObjectPool::new("test");
        let obj = pool.grab(&stats, &stats.alloc_fail).unwrap();
        assert!(obj.0 > 0);
        assert_eq!(pool.slot_count(), 1);
    }

    #[test]
    fn ungrab_then_grab_reuses_slot() {
        let stats = StatsSink::new();
        let pool: ObjectPool<Dummy> = ObjectPool::new("test");
        let obj = pool.grab(&stats, &stats.alloc_fail).unwrap();
        let id = obj.0;
        pool.ungrab(obj, &stats);
        assert_eq!(pool.slot_count(), 1);
        let obj2 = pool.grab(&stats, &stats.alloc_fail).unwrap();
        assert_eq!(obj2.0, id);
    }

    #[test]
    fn ungrab_with_no_empty_slot_destroys_object() {
        let stats = StatsSink::new();
        let pool: ObjectPool<Dummy> = ObjectPool::new("test");
        let a = pool.grab(&stats, &stats.alloc_fail).unwrap();
        let b = pool.grab(&stats, &stats.alloc_fail).unwrap();
        // Two rentals, two slots, both empty.
        pool.ungrab(a, &stats);
        pool.ungrab(b, &stats);
        assert_eq!(pool.slot_count(), 2);
    }

    #[test]
    fn reap_is_noop_while_rented() {
        let stats = StatsSink::new();
        let pool: ObjectPool<Dummy> = ObjectPool::new("test");
        let obj = pool.grab(&stats, &stats.alloc_fail).unwrap();
        assert_eq!(pool.reap(&stats), 0);
        pool.ungrab(obj, &stats);
    }

    #[test]
    fn reap_is_noop_before_idle_threshold() {
        let stats = StatsSink::new();
        let pool: ObjectPool<Dummy> = ObjectPool::new("test");
        let obj = pool.grab(&stats, &stats.alloc_fail).unwrap();
        pool.ungrab(obj, &stats);
        assert_eq!(pool.reap(&stats), 0);
        assert_eq!(pool.slot_count(), 1);
    }

    #[test]
    fn destroy_clears_all_slots() {
        let stats = StatsSink::new();
        let pool: ObjectPool<Dummy> = ObjectPool::new("test");
        let obj = pool.grab(&stats, &stats.alloc_fail).unwrap();
        pool.ungrab(obj, &stats);
        pool.destroy(&stats);
        assert_eq!(pool.slot_count(), 0);
    }

    #[test]
    fn concurrent_grab_ungrab_never_duplicates() {
        let stats = std::sync::Arc::new(StatsSink::new());
        let pool = std::sync::Arc::new(ObjectPool::<Dummy>::new("concurrent"));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let stats = stats.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let obj = pool.grab(&stats, &stats.alloc_fail).unwrap();
                    pool.ungrab(obj, &stats);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
