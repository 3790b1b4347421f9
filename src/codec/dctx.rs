//! Pooled zstd decompression context.

use std::os::raw::c_void;
use std::ptr::NonNull;

use zstd_sys::{
    ZSTD_DCtx, ZSTD_DCtx_reset, ZSTD_DCtx_setParameter, ZSTD_customMem, ZSTD_dParameter,
    ZSTD_decompressDCtx, ZSTD_format_e, ZSTD_freeDCtx, ZSTD_createDCtx_advanced,
    ZSTD_ResetDirective,
};

use crate::alloc::{decompress_alloc, decompress_free, DecompressAllocContext};
use crate::pool::Poolable;
use crate::stats::STATS;

use super::{classify, CodecOutcome};

/// A pooled zstd decompression context, built with the custom
/// allocator shim's blocking-fallback variant.
pub struct DCtx {
    raw: NonNull<ZSTD_DCtx>,
    _alloc_ctx: Box<DecompressAllocContext<'static>>,
}

unsafe impl Send for DCtx {}

impl DCtx {
    fn raw_ptr(&self) -> *mut ZSTD_DCtx {
        self.raw.as_ptr()
    }

    /// Configures magicless framing to match `CCtx::configure`.
    pub fn configure(&mut self) -> Result<(), ()> {
        let code = unsafe {
            ZSTD_DCtx_setParameter(
                self.raw_ptr(),
                ZSTD_dParameter::ZSTD_d_format,
                ZSTD_format_e::ZSTD_f_zstd1_magicless as i32,
            )
        };
        if unsafe { zstd_sys::ZSTD_isError(code) } != 0 {
            return Err(());
        }
        Ok(())
    }

    /// Runs the one-shot decompression call.
    pub fn decompress(&mut self, dst: &mut [u8], src: &[u8]) -> CodecOutcome {
        let code = unsafe {
            ZSTD_decompressDCtx(
                self.raw_ptr(),
                dst.as_mut_ptr() as *mut c_void,
                dst.len(),
                src.as_ptr() as *const c_void,
                src.len(),
            )
        };
        classify(code)
    }
}

impl Poolable for DCtx {
    fn create() -> Option<Self> {
        let alloc_ctx = Box::new(DecompressAllocContext {
            alloc_fail: &STATS.decompress_alloc_fail,
            alloc_fallback: &STATS.decompress_alloc_fallback,
        });
        let opaque = alloc_ctx.as_ref() as *const DecompressAllocContext as *mut c_void;
        let mem = ZSTD_customMem {
            customAlloc: Some(decompress_alloc),
            customFree: Some(decompress_free),
            opaque,
        };
        let raw = unsafe { ZSTD_createDCtx_advanced(mem) };
        NonNull::new(raw).map(|raw| DCtx {
            raw,
            _alloc_ctx: alloc_ctx,
        })
    }

    fn reset(&mut self) {
        unsafe {
            ZSTD_DCtx_reset(self.raw_ptr(), ZSTD_ResetDirective::ZSTD_reset_session_only);
        }
    }

    fn estimated_size() -> u64 {
        128 * 1024
    }
}

impl Drop for DCtx {
    fn drop(&mut self) {
        unsafe {
            ZSTD_freeDCtx(self.raw_ptr());
        }
    }
}
