//! Bindings onto the zstd codec, plus the lz4 probe (`codec::lz4`).
//!
//! Every call here is one-shot: no streaming state survives a single
//! `compress`/`decompress` invocation beyond what's held in a pooled
//! context (`crate::pool`).

pub mod cctx;
pub mod dctx;
pub mod lz4;

pub use cctx::CCtx;
pub use dctx::DCtx;

use zstd_sys::ZSTD_ErrorCode;

/// Outcome of a one-shot `compress2`/`decompressDCtx` call, already
/// classified against the codec's own error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOutcome {
    Wrote(usize),
    /// Destination too small, or (on the probe path) output no smaller
    /// than the source — not counted as a failure.
    Reject,
    /// Any other codec error.
    Fail,
}

pub(crate) fn classify(code: usize) -> CodecOutcome {
    if unsafe { zstd_sys::ZSTD_isError(code) } == 0 {
        return CodecOutcome::Wrote(code);
    }
    let err_code = unsafe { zstd_sys::ZSTD_getErrorCode(code) };
    if err_code == ZSTD_ErrorCode::ZSTD_error_dstSize_tooSmall {
        CodecOutcome::Reject
    } else {
        CodecOutcome::Fail
    }
}

/// The zstd library's own version number, stamped into every
/// `BlockHeader` as `encoder_version`.
pub fn encoder_version() -> u32 {
    unsafe { zstd_sys::ZSTD_versionNumber() }
}
