//! One-shot lz4 probe.
//!
//! The adapter only ever uses lz4 as a cheap first-pass probe, never as
//! a committed compression format, so the block-format one-shot API is
//! all that's needed here — no streaming, no dictionary support.

use std::os::raw::{c_char, c_int};

use lz4_sys::{LZ4_compressBound, LZ4_compress_fast};

/// Runs `LZ4_compress_fast` against `src`, writing into `dst`.
///
/// Returns `Some(n)` with the number of bytes written if the probe fit
/// within `dst`, `None` if lz4 rejected it (output would not have
/// fit). `acceleration` is fixed at 1, matching the filesystem's probe
/// contract, which only cares about the target-size fit, not speed.
pub fn compress_probe(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    if dst.is_empty() {
        return None;
    }
    let written = unsafe {
        LZ4_compress_fast(
            src.as_ptr() as *const c_char,
            dst.as_mut_ptr() as *mut c_char,
            src.len() as c_int,
            dst.len() as c_int,
            1,
        )
    };
    if written <= 0 {
        None
    } else {
        Some(written as usize)
    }
}

/// Worst-case output size lz4 could require for a given input length.
pub fn compress_bound(src_len: usize) -> usize {
    unsafe { LZ4_compressBound(src_len as c_int) as usize }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compresses_highly_repetitive_input() {
        let src = vec![0x41u8; 8192];
        let mut dst = vec![0u8; compress_bound(src.len())];
        let n = compress_probe(&src, &mut dst).expect("repetitive input should compress");
        assert!(n < src.len());
    }

    #[test]
    fn rejects_when_target_too_small() {
        let src = vec![0x41u8; 8192];
        let mut dst = vec![0u8; 4];
        assert_eq!(compress_probe(&src, &mut dst), None);
    }

    #[test]
    fn rejects_incompressible_random_input_against_tight_target() {
        // A small xorshift-style PRNG would need a dependency; a simple
        // LCG is enough to produce input lz4 cannot shrink below a tight
        // target bound.
        let mut state: u64 = 0x243F_6A88_85A3_08D3;
        let mut src = vec![0u8; 4096];
        for b in src.iter_mut() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            *b = (state >> 33) as u8;
        }
        let target = src.len() - (src.len() >> 3);
        let mut dst = vec![0u8; target];
        // Either it's rejected, or it happens to fit; both are valid
        // lz4 outcomes for pseudo-random input, but the call must not
        // panic or overflow `dst`.
        let _ = compress_probe(&src, &mut dst);
    }
}
