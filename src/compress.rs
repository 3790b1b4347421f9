//! Orchestrates the early-abort heuristic, first-pass probing, and
//! committed compression into a single block-in/block-out operation.

use std::sync::atomic::Ordering;

use crate::codec::cctx::CCtx;
use crate::codec::{self, lz4};
use crate::header::{BlockHeader, HEADER_LEN};
use crate::level::{self, FsLevel};
use crate::pool::ObjectPool;
use crate::stats::{StatsSink, STATS};
use crate::tunables::{Tunables, TUNABLES};

lazy_static::lazy_static! {
    static ref CCTX_POOL: ObjectPool<CCtx> = ObjectPool::new("cctx");
}

/// Compresses `src` into `dst`, returning the number of framed bytes
/// written, or `src.len()` to signal "store this block raw". `dst`
/// must be at least as large as `src`.
pub fn compress(src: &[u8], dst: &mut [u8], requested_level: i32) -> usize {
    compress_with(src, dst, requested_level, &TUNABLES)
}

/// Same as [`compress`] but against a caller-supplied tunable set,
/// letting tests exercise the heuristic without perturbing the shared
/// global (`crate::tunables::TUNABLES`).
pub fn compress_with(src: &[u8], dst: &mut [u8], requested_level: i32, tunables: &Tunables) -> usize {
    let src_len = src.len();
    debug_assert!(dst.len() >= src_len);

    let level = match FsLevel::from_ordinal(requested_level) {
        Ok(l) => l,
        Err(_) => {
            StatsSink::bump(&STATS.compress_level_invalid);
            return src_len;
        }
    };
    let codec_level = level.to_codec_level();
    let hard_override = tunables.hard_moed.load(Ordering::Relaxed) > 0;

    let abort_size = tunables.effective_abort_size(codec_level);
    let cutoff = tunables.cutoff_level.load(Ordering::Relaxed);
    let probing_enabled =
        i64::from(level.ordinal()) >= cutoff && (src_len as u64) >= abort_size;

    if !probing_enabled {
        StatsSink::bump(&STATS.passignored);
        StatsSink::add(&STATS.passignored_size, src_len as u64);
        return commit(src, dst, level, codec_level);
    }

    if !tunables.lz4_pass.load(Ordering::Relaxed) {
        return commit(src, dst, level, codec_level);
    }

    let shift = tunables.lz4_shift_size.load(Ordering::Relaxed) as usize;
    let target = src_len.saturating_sub(src_len >> shift);
    let fit = if target > HEADER_LEN {
        let mut probe_dst = vec![0u8; target];
        lz4::compress_probe(src, &mut probe_dst).is_some()
    } else {
        false
    };
    if fit {
        StatsSink::bump(&STATS.lz4pass_allowed);
        return commit(src, dst, level, codec_level);
    }
    StatsSink::bump(&STATS.lz4pass_rejected);

    if !tunables.zstd_pass.load(Ordering::Relaxed) {
        if hard_override {
            return commit(src, dst, level, codec_level);
        }
        return src_len;
    }

    let firstpass_mode = tunables.firstpass_mode.load(Ordering::Relaxed);
    let tuned = firstpass_mode == 3;
    let probe_level = match firstpass_mode {
        2 => 2,
        3 => level::TUNED,
        _ => 1,
    };

    let probe_outcome = {
        let ctx = CCTX_POOL.grab(&STATS, &STATS.compress_alloc_fail);
        let mut ctx = match ctx {
            Some(c) => c,
            None => return src_len,
        };
        let effective_level = if tuned { 2 } else { probe_level };
        let configured =
            ctx.configure(effective_level).is_ok() && (!tuned || ctx.configure_tuned(src_len).is_ok());
        let outcome = if configured {
            Some(ctx.compress2(dst, src))
        } else {
            None
        };
        ctx.reset();
        CCTX_POOL.ungrab(ctx, &STATS);
        outcome
    };

    let probe_fits = matches!(probe_outcome, Some(codec::CodecOutcome::Wrote(n)) if n < src_len);
    if probe_fits {
        StatsSink::bump(&STATS.zstdpass_allowed);
        return commit(src, dst, level, codec_level);
    }

    StatsSink::bump(&STATS.zstdpass_rejected);
    if hard_override {
        return commit(src, dst, level, codec_level);
    }
    src_len
}

fn commit(src: &[u8], dst: &mut [u8], level: FsLevel, codec_level: i32) -> usize {
    let src_len = src.len();
    if dst.len() < HEADER_LEN + 1 {
        return src_len;
    }

    let ctx = CCTX_POOL.grab(&STATS, &STATS.compress_alloc_fail);
    let mut ctx = match ctx {
        Some(c) => c,
        None => return src_len,
    };

    if ctx.configure(codec_level).is_err() {
        ctx.reset();
        CCTX_POOL.ungrab(ctx, &STATS);
        return src_len;
    }

    let outcome = {
        let (_header_area, payload_dst) = dst.split_at_mut(HEADER_LEN);
        ctx.compress2(payload_dst, src)
    };

    let result = match outcome {
        codec::CodecOutcome::Wrote(c_len) if c_len < src_len.saturating_sub(HEADER_LEN) => {
            let header = BlockHeader::encode(c_len as u32, codec::encoder_version(), level.ordinal());
            dst[..HEADER_LEN].copy_from_slice(&header);
            HEADER_LEN + c_len
        }
        codec::CodecOutcome::Wrote(_) | codec::CodecOutcome::Reject => src_len,
        codec::CodecOutcome::Fail => {
            StatsSink::bump(&STATS.compress_failed);
            src_len
        }
    };

    ctx.reset();
    CCTX_POOL.ungrab(ctx, &STATS);
    result
}
