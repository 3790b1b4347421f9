//! Custom allocator glue handed to the codec library.
//!
//! The codec's advanced context-creation API accepts a pair of
//! `alloc`/`free` function pointers plus an opaque context pointer, so
//! working-state objects can be built from host-controlled memory
//! instead of the codec's own malloc/free. Each allocation here is
//! prefixed with a small `AllocHeader { size }`; the pointer handed
//! back to the codec points just past that header, and `free` walks
//! backward to recover the full allocation for release.
//!
//! The compress-side shim is best-effort and non-blocking: on failure
//! it returns a null pointer so the caller can fall back to "store
//! uncompressed". The decompress-side shim retries on failure, because
//! a read-path allocation failure is not an acceptable outcome — there
//! is no kernel-backed guaranteed allocator to call into from user
//! space, so the retry loop is the best approximation available.

use std::alloc::{alloc as sys_alloc, dealloc as sys_dealloc, Layout};
use std::mem;
use std::os::raw::c_void;
use std::ptr;
use std::sync::atomic::AtomicU64;

use crate::stats::StatsSink;

#[repr(C)]
struct AllocHeader {
    size: usize,
}

const HEADER_ALIGN: usize = mem::align_of::<AllocHeader>();
const HEADER_SIZE: usize = mem::size_of::<AllocHeader>();

/// How many times the decompress-side fallback retries a failed
/// allocation before giving up.
const FALLBACK_ATTEMPTS: u32 = 8;

unsafe fn raw_alloc(total: usize) -> *mut u8 {
    match Layout::from_size_align(total, HEADER_ALIGN) {
        Ok(layout) => sys_alloc(layout),
        Err(_) => ptr::null_mut(),
    }
}

unsafe fn raw_dealloc(base: *mut u8, total: usize) {
    let layout = Layout::from_size_align_unchecked(total, HEADER_ALIGN);
    sys_dealloc(base, layout);
}

unsafe fn write_header_and_return(base: *mut u8, size: usize) -> *mut c_void {
    (base as *mut AllocHeader).write(AllocHeader { size });
    base.add(HEADER_SIZE) as *mut c_void
}

unsafe fn recover_base(ptr: *mut c_void) -> (*mut u8, usize) {
    let base = (ptr as *mut u8).sub(HEADER_SIZE);
    let size = (*(base as *const AllocHeader)).size;
    (base, size)
}

/// Opaque context passed through the codec's `opaque` tag for the
/// compress-side shim.
pub struct CompressAllocContext<'a> {
    pub alloc_fail: &'a AtomicU64,
}

pub extern "C" fn compress_alloc(opaque: *mut c_void, size: usize) -> *mut c_void {
    unsafe {
        let ctx = &*(opaque as *const CompressAllocContext);
        let total = HEADER_SIZE + size;
        let base = raw_alloc(total);
        if base.is_null() {
            StatsSink::bump(ctx.alloc_fail);
            return ptr::null_mut();
        }
        write_header_and_return(base, total)
    }
}

pub extern "C" fn compress_free(_opaque: *mut c_void, ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let (base, total) = recover_base(ptr);
        raw_dealloc(base, total);
    }
}

/// Opaque context for the decompress-side shim. Distinguished from the
/// compress side only by behavior on allocation failure: this side
/// retries before giving up, the compress side fails fast.
pub struct DecompressAllocContext<'a> {
    pub alloc_fail: &'a AtomicU64,
    pub alloc_fallback: &'a AtomicU64,
}

pub extern "C" fn decompress_alloc(opaque: *mut c_void, size: usize) -> *mut c_void {
    unsafe {
        let ctx = &*(opaque as *const DecompressAllocContext);
        let total = HEADER_SIZE + size;

        let base = raw_alloc(total);
        if !base.is_null() {
            return write_header_and_return(base, total);
        }

        StatsSink::bump(ctx.alloc_fallback);
        for _ in 0..FALLBACK_ATTEMPTS {
            std::thread::yield_now();
            let base = raw_alloc(total);
            if !base.is_null() {
                return write_header_and_return(base, total);
            }
        }
        StatsSink::bump(ctx.alloc_fail);
        ptr::null_mut()
    }
}

pub extern "C" fn decompress_free(opaque: *mut c_void, ptr: *mut c_void) {
    compress_free(opaque, ptr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn compress_alloc_round_trips_and_preserves_bytes() {
        let alloc_fail = AtomicU64::new(0);
        let ctx = CompressAllocContext {
            alloc_fail: &alloc_fail,
        };
        let ctx_ptr = &ctx as *const _ as *mut c_void;

        let p = compress_alloc(ctx_ptr, 256);
        assert!(!p.is_null());
        unsafe {
            let slice = std::slice::from_raw_parts_mut(p as *mut u8, 256);
            for (i, b) in slice.iter_mut().enumerate() {
                *b = (i % 256) as u8;
            }
            assert_eq!(slice[10], 10);
        }
        compress_free(ctx_ptr, p);
        assert_eq!(alloc_fail.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn compress_alloc_returns_null_and_bumps_on_absurd_size() {
        let alloc_fail = AtomicU64::new(0);
        let ctx = CompressAllocContext {
            alloc_fail: &alloc_fail,
        };
        let ctx_ptr = &ctx as *const _ as *mut c_void;

        let p = compress_alloc(ctx_ptr, usize::MAX);
        assert!(p.is_null());
        assert_eq!(alloc_fail.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn decompress_alloc_succeeds_without_fallback_on_normal_size() {
        let alloc_fail = AtomicU64::new(0);
        let alloc_fallback = AtomicU64::new(0);
        let ctx = DecompressAllocContext {
            alloc_fail: &alloc_fail,
            alloc_fallback: &alloc_fallback,
        };
        let ctx_ptr = &ctx as *const _ as *mut c_void;

        let p = decompress_alloc(ctx_ptr, 64);
        assert!(!p.is_null());
        decompress_free(ctx_ptr, p);
        assert_eq!(alloc_fallback.load(Ordering::Relaxed), 0);
        assert_eq!(alloc_fail.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn decompress_alloc_exhausts_fallback_and_bumps_both_counters() {
        let alloc_fail = AtomicU64::new(0);
        let alloc_fallback = AtomicU64::new(0);
        let ctx = DecompressAllocContext {
            alloc_fail: &alloc_fail,
            alloc_fallback: &alloc_fallback,
        };
        let ctx_ptr = &ctx as *const _ as *mut c_void;

        let p = decompress_alloc(ctx_ptr, usize::MAX);
        assert!(p.is_null());
        assert_eq!(alloc_fallback.load(Ordering::Relaxed), 1);
        assert_eq!(alloc_fail.load(Ordering::Relaxed), 1);
    }
}
