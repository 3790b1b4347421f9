//! Concurrent round-trip stress test.
//!
//! A modest thread/iteration count, enough to exercise pool growth,
//! try-lock contention, and idle-reap races without making the test
//! suite slow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use fszstd::{compress, decompress};

#[test]
fn concurrent_compress_decompress_never_corrupts() {
    const THREADS: usize = 16;
    const ITERS: usize = 200;

    let failures = Arc::new(AtomicU64::new(0));
    let mut handles = Vec::with_capacity(THREADS);

    for t in 0..THREADS {
        let failures = failures.clone();
        handles.push(thread::spawn(move || {
            let mut rng = XorShiftRng::seed_from_u64(0xC0FF_EE00 + t as u64);
            for _ in 0..ITERS {
                let len = 256 + rng.gen_range(0..4096);
                let mut src = vec![0u8; len];
                // Bias toward compressible content half the time so
                // both the "compressed" and "stored raw" branches run.
                if rng.gen_bool(0.5) {
                    rng.fill(src.as_mut_slice());
                } else {
                    let fill: u8 = rng.gen();
                    src.iter_mut().for_each(|b| *b = fill);
                }

                let level = rng.gen_range(1..=19);
                let mut framed = vec![0u8; len];
                let n = compress(&src, &mut framed, level);

                if n == len {
                    continue;
                }

                let mut out = vec![0u8; len];
                let rc = decompress(&framed[..n], &mut out, None);
                if rc != 0 || out != src {
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    for h in handles {
        h.join().expect("worker thread panicked");
    }

    assert_eq!(failures.load(Ordering::Relaxed), 0);
}
