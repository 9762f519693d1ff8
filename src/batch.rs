//! Batched / parallel encode and decode over many inputs, using a bounded
//! worker pool (§4.6).
//!
//! Mirrors the pattern in `rten::threading`: a `rayon::ThreadPool` wrapped
//! so that encode/decode run directly on the caller's thread if pool
//! construction fails (e.g. on a platform without thread support), rather
//! than panicking. Unlike `rten::threading::thread_pool`, which lazily
//! builds one process-wide pool sized from `RTEN_NUM_THREADS`, the pool
//! here is sized per call from the caller-supplied `num_threads`, since
//! that is an explicit parameter of `batch_encode`/`batch_decode` rather
//! than a process-wide default.

use rayon::prelude::*;

use crate::error::TokenizerError;
use crate::tokenizers::{TokenId, Tokenizer};

fn build_pool(num_threads: u32) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1) as usize)
        .thread_name(|i| format!("swiftbpe-{}", i))
        .build()
        .ok()
}

/// Tokenize `docs` across a bounded pool of `num_threads` workers, returning
/// the flattened token stream in input order.
///
/// Each worker holds only a read-only borrow of `tokenizer`; no
/// cross-worker synchronization happens on the hot path. Equal to calling
/// `tokenizer.encode` on each doc sequentially and concatenating the
/// results, for any `num_threads >= 1`.
pub fn batch_encode<S>(
    tokenizer: &Tokenizer,
    docs: &[S],
    num_threads: u32,
) -> Result<Vec<TokenId>, TokenizerError>
where
    S: AsRef<str> + Sync,
{
    let encode_one = |doc: &S| -> Result<Vec<TokenId>, TokenizerError> {
        Ok(tokenizer.encode(doc.as_ref(), Default::default())?.into_ids())
    };

    let results: Vec<Result<Vec<TokenId>, TokenizerError>> = match build_pool(num_threads) {
        Some(pool) => pool.install(|| docs.par_iter().map(encode_one).collect()),
        None => docs.iter().map(encode_one).collect(),
    };

    let mut flat = Vec::new();
    for r in results {
        flat.extend(r?);
    }
    Ok(flat)
}

/// Detokenize `batches` across a bounded pool of `num_threads` workers,
/// concatenating the resulting text in input order.
pub fn batch_decode<B>(
    tokenizer: &Tokenizer,
    batches: &[B],
    num_threads: u32,
) -> Result<String, TokenizerError>
where
    B: AsRef<[TokenId]> + Sync,
{
    let decode_one = |ids: &B| tokenizer.decode(ids.as_ref());

    let results: Vec<Result<String, TokenizerError>> = match build_pool(num_threads) {
        Some(pool) => pool.install(|| batches.par_iter().map(decode_one).collect()),
        None => batches.iter().map(decode_one).collect(),
    };

    let mut out = String::new();
    for r in results {
        out.push_str(&r?);
    }
    Ok(out)
}
