//! A block-level compression adapter for filesystem storage I/O
//! pipelines, backed by zstd with an lz4 first-pass probe.
//!
//! For every fixed-size block handed down by a filesystem's write
//! path, [`compress`] decides whether compressing it is worth the
//! cost, runs a cheap probe before committing to the requested level,
//! and frames the result in a compact, magicless per-block header. On
//! the read path, [`decompress`] inverts the process.
//!
//! The adapter does not provide a streaming API: every operation is
//! block-in, block-out, with the caller owning pre-allocated output
//! capacity. Working-state objects (compression and decompression
//! contexts) are recycled across calls through [`pool::ObjectPool`]
//! rather than allocated per block.
//!
//! Call [`init_log`] once during startup before issuing any other
//! call.
//!
//! # Examples
//!
//! ```
//! use fszstd::{compress, decompress};
//!
//! let src = vec![0u8; 4096];
//! let mut framed = vec![0u8; 4096];
//! let n = compress(&src, &mut framed, 3);
//! assert!(n < src.len());
//!
//! let mut out = vec![0u8; src.len()];
//! assert_eq!(decompress(&framed[..n], &mut out, None), 0);
//! assert_eq!(out, src);
//! ```

pub mod alloc;
pub mod base;
pub mod codec;
pub mod compress;
pub mod decompress;
pub mod error;
pub mod header;
pub mod level;
pub mod pool;
pub mod stats;
pub mod tunables;

pub use self::base::init_log;
pub use self::compress::compress;
pub use self::decompress::decompress;
pub use self::error::{Error, Result};
pub use self::header::{BlockHeader, HEADER_LEN};
pub use self::level::FsLevel;
pub use self::stats::{StatsSink, STATS};
pub use self::tunables::{Tunables, TUNABLES};
