//! Parses the per-block header, validates it, and inverts
//! `compress::compress`.

use crate::codec::dctx::DCtx;
use crate::codec::{self};
use crate::header::{BlockHeader, HEADER_LEN};
use crate::level::FsLevel;
use crate::pool::ObjectPool;
use crate::stats::{StatsSink, STATS};

lazy_static::lazy_static! {
    static ref DCTX_POOL: ObjectPool<DCtx> = ObjectPool::new("dctx");
}

/// Decompresses a framed block from `src` into `dst`.
///
/// Returns `0` on success, `1` on any failure. On success, if
/// `out_level` is `Some`, the recovered `FsLevel` ordinal is written
/// there.
pub fn decompress(src: &[u8], dst: &mut [u8], out_level: Option<&mut u8>) -> u8 {
    if src.len() < HEADER_LEN {
        StatsSink::bump(&STATS.decompress_header_invalid);
        return 1;
    }

    let header = BlockHeader::decode(src);

    let level = match FsLevel::from_ordinal(i32::from(header.fs_level_ordinal)) {
        Ok(l) => l,
        Err(_) => {
            StatsSink::bump(&STATS.decompress_level_invalid);
            return 1;
        }
    };

    let c_len = header.c_len as usize;
    if c_len.checked_add(HEADER_LEN).map_or(true, |total| total > src.len()) {
        StatsSink::bump(&STATS.decompress_header_invalid);
        return 1;
    }

    // Encoder version is read but not acted upon (forward-compat hook).
    let _ = header.encoder_version;

    let ctx = DCTX_POOL.grab(&STATS, &STATS.decompress_alloc_fail);
    let mut ctx = match ctx {
        Some(c) => c,
        None => {
            StatsSink::bump(&STATS.decompress_alloc_fail);
            return 1;
        }
    };

    if ctx.configure().is_err() {
        ctx.reset();
        DCTX_POOL.ungrab(ctx, &STATS);
        StatsSink::bump(&STATS.decompress_failed);
        return 1;
    }

    let payload = &src[HEADER_LEN..HEADER_LEN + c_len];
    let outcome = ctx.decompress(dst, payload);

    let result = match outcome {
        codec::CodecOutcome::Wrote(_n) => {
            if let Some(slot) = out_level {
                *slot = level.ordinal();
            }
            0
        }
        codec::CodecOutcome::Reject | codec::CodecOutcome::Fail => {
            StatsSink::bump(&STATS.decompress_failed);
            1
        }
    };

    ctx.reset();
    DCTX_POOL.ungrab(ctx, &STATS);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress;

    #[test]
    fn round_trips_highly_compressible_block() {
        let src = vec![0u8; 4096];
        let mut framed = vec![0u8; 4096];
        let n = compress(&src, &mut framed, 3);
        assert!(n < src.len());

        let mut out = vec![0u8; src.len()];
        let mut level = 0u8;
        let rc = decompress(&framed[..n], &mut out, Some(&mut level));
        assert_eq!(rc, 0);
        assert_eq!(out, src);
        assert_eq!(level, 3);
    }

    #[test]
    fn corrupt_header_c_len_is_rejected_and_source_unchanged() {
        let src = vec![0u8; 4096];
        let mut framed = vec![0u8; 4096];
        let n = compress(&src, &mut framed, 3);
        assert!(n < src.len());

        let mut corrupt = framed[..n].to_vec();
        let bogus = (corrupt.len() as u32) + 1000;
        corrupt[0..4].copy_from_slice(&bogus.to_be_bytes());
        let original = corrupt.clone();

        let before = STATS.decompress_header_invalid();
        let mut out = vec![0u8; src.len()];
        let rc = decompress(&corrupt, &mut out, None);
        assert_eq!(rc, 1);
        assert_eq!(STATS.decompress_header_invalid(), before + 1);
        assert_eq!(corrupt, original);
    }

    #[test]
    fn truncated_input_shorter_than_header_is_rejected() {
        let mut out = vec![0u8; 16];
        let rc = decompress(&[1, 2, 3], &mut out, None);
        assert_eq!(rc, 1);
    }
}
