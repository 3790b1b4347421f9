//! Pooled zstd compression context.

use std::os::raw::c_void;
use std::ptr::NonNull;

use zstd_sys::{
    ZSTD_CCtx_reset, ZSTD_CCtx_setParameter, ZSTD_cParameter, ZSTD_compress2, ZSTD_createCCtx_advanced,
    ZSTD_customMem, ZSTD_format_e, ZSTD_freeCCtx, ZSTD_strategy, ZSTD_CCtx,
    ZSTD_ResetDirective,
};

use crate::alloc::{compress_alloc, compress_free, CompressAllocContext};
use crate::pool::Poolable;
use crate::stats::STATS;

use super::{classify, CodecOutcome};

/// Strategy parameters forced for the `TUNED` first-pass probe.
pub struct TunedParams {
    pub window_log: i32,
    pub hash_log: i32,
    pub chain_log: i32,
    pub search_log: i32,
    pub min_match: i32,
    pub target_length: i32,
}

pub const TUNED_PARAMS: TunedParams = TunedParams {
    window_log: 21,
    hash_log: 15,
    chain_log: 16,
    search_log: 1,
    min_match: 6,
    target_length: 0,
};

/// A pooled zstd compression context, built with the custom allocator
/// shim so the codec never reaches for its own malloc.
pub struct CCtx {
    raw: NonNull<ZSTD_CCtx>,
    // Kept alive for as long as `raw` is; its address is the codec's
    // opaque allocator tag.
    _alloc_ctx: Box<CompressAllocContext<'static>>,
}

unsafe impl Send for CCtx {}

impl CCtx {
    fn raw_ptr(&self) -> *mut ZSTD_CCtx {
        self.raw.as_ptr()
    }

    /// Sets compression level, magicless format, checksum off,
    /// content-size-flag off.
    pub fn configure(&mut self, level: i32) -> Result<(), ()> {
        unsafe {
            let checks = [
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_compressionLevel,
                    level,
                ),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_format,
                    ZSTD_format_e::ZSTD_f_zstd1_magicless as i32,
                ),
                ZSTD_CCtx_setParameter(self.raw_ptr(), ZSTD_cParameter::ZSTD_c_checksumFlag, 0),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_contentSizeFlag,
                    0,
                ),
            ];
            if checks.iter().any(|&c| zstd_sys::ZSTD_isError(c) != 0) {
                return Err(());
            }
        }
        Ok(())
    }

    /// Overrides strategy parameters for the `TUNED` probe level.
    pub fn configure_tuned(&mut self, src_len: usize) -> Result<(), ()> {
        unsafe {
            let checks = [
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_windowLog,
                    TUNED_PARAMS.window_log,
                ),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_hashLog,
                    TUNED_PARAMS.hash_log,
                ),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_chainLog,
                    TUNED_PARAMS.chain_log,
                ),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_searchLog,
                    TUNED_PARAMS.search_log,
                ),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_minMatch,
                    TUNED_PARAMS.min_match,
                ),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_targetLength,
                    TUNED_PARAMS.target_length,
                ),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_strategy,
                    ZSTD_strategy::ZSTD_fast as i32,
                ),
                ZSTD_CCtx_setParameter(
                    self.raw_ptr(),
                    ZSTD_cParameter::ZSTD_c_srcSizeHint,
                    src_len as i32,
                ),
            ];
            if checks.iter().any(|&c| zstd_sys::ZSTD_isError(c) != 0) {
                return Err(());
            }
        }
        Ok(())
    }

    /// Runs the one-shot compression call.
    pub fn compress2(&mut self, dst: &mut [u8], src: &[u8]) -> CodecOutcome {
        let code = unsafe {
            ZSTD_compress2(
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

impl Poolable for CCtx {
    fn create() -> Option<Self> {
        let alloc_ctx = Box::new(CompressAllocContext {
            alloc_fail: &STATS.alloc_fail,
        });
        let opaque = alloc_ctx.as_ref() as *const CompressAllocContext as *mut c_void;
        let mem = ZSTD_customMem {
            customAlloc: Some(compress_alloc),
            customFree: Some(compress_free),
            opaque,
        };
        let raw = unsafe { ZSTD_createCCtx_advanced(mem) };
        NonNull::new(raw).map(|raw| CCtx {
            raw,
            _alloc_ctx: alloc_ctx,
        })
    }

    fn reset(&mut self) {
        unsafe {
            ZSTD_CCtx_reset(self.raw_ptr(), ZSTD_ResetDirective::ZSTD_reset_session_only);
        }
    }

    fn estimated_size() -> u64 {
        // A rough working-set estimate for a default-windowLog cctx;
        // used only to drive the advisory `size` stat.
        256 * 1024
    }
}

impl Drop for CCtx {
    fn drop(&mut self) {
        unsafe {
            ZSTD_freeCCtx(self.raw_ptr());
        }
    }
}
