//! Process-wide default tokenizer session (§4.7).
//!
//! The reference implementation keeps its tokenizer state in a module-level
//! global inside a native extension, so that callers can just `initialize`
//! once and then call bare `encode`/`decode` functions without threading a
//! handle through their own code. This module reproduces that convenience
//! on top of [`Tokenizer`], which is otherwise an explicit, independently
//! constructible value with no hidden global state.

use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::config::TokenizerConfig;
use crate::error::TokenizerError;
use crate::tokenizers::{Bpe, EncodeOptions, TokenId, Tokenizer};

static SESSION: RwLock<Option<Arc<Tokenizer>>> = RwLock::new(None);

/// Build a tokenizer from `config` and install it as the process-wide
/// default session, replacing whatever session was there before.
///
/// Concurrent `encode`/`decode` calls observe either the prior session or
/// the new one, never a mix of both: the swap happens under a single write
/// lock and readers clone an `Arc` under a read lock.
pub fn initialize(config: &TokenizerConfig) -> Result<(), TokenizerError> {
    let tokenizer = Tokenizer::new(Bpe::new(config)?);
    let mut slot = SESSION.write().expect("session lock poisoned");
    *slot = Some(Arc::new(tokenizer));
    Ok(())
}

/// Return the current default session, or [`TokenizerError::NotInitialized`]
/// if [`initialize`] has not been called (or [`reset`] cleared it).
pub fn current() -> Result<Arc<Tokenizer>, TokenizerError> {
    SESSION
        .read()
        .expect("session lock poisoned")
        .clone()
        .ok_or(TokenizerError::NotInitialized)
}

/// Tokenize `text` using the process-wide default session.
pub fn encode(text: &str) -> Result<Vec<TokenId>, TokenizerError> {
    Ok(current()?
        .encode(text, EncodeOptions::default())?
        .into_ids())
}

/// Detokenize `ids` using the process-wide default session.
pub fn decode(ids: &[TokenId]) -> Result<String, TokenizerError> {
    current()?.decode(ids)
}

/// Clear the process-wide default session. Mainly useful for tests that
/// need a clean slate between cases.
pub fn reset() {
    let mut slot = SESSION.write().expect("session lock poisoned");
    *slot = None;
}

/// Train a new byte-pair-encoding vocabulary from a text corpus.
///
/// Training is out of scope for this crate: it only consumes vocabularies
/// produced elsewhere (§6, "Non-goals"). This stub exists so the shape of
/// the reference API is still present for callers migrating from it.
pub fn bpe_train(_corpus_path: &Path, _vocab_size: usize) -> Result<(), TokenizerError> {
    Err(TokenizerError::NotSupported("bpe_train"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_alphabet::ByteAlphabet;
    use std::io::Write;
    use std::sync::Mutex;

    // The session is process-wide state; serialize tests that touch it so
    // they don't stomp on each other when run concurrently.
    static GUARD: Mutex<()> = Mutex::new(());

    fn write_byte_vocab() -> tempfile::NamedTempFile {
        let alphabet = ByteAlphabet::standard();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for b in 0..=255u8 {
            let text = alphabet.encode_byte(b);
            let hex: String = text.as_bytes().iter().map(|x| format!("0x{:02X}", x)).collect();
            writeln!(file, "{} == {}", hex, b as u32).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn uninitialized_session_errors() {
        let _guard = GUARD.lock().unwrap();
        reset();
        assert!(matches!(encode("hi"), Err(TokenizerError::NotInitialized)));
        assert!(matches!(decode(&[0]), Err(TokenizerError::NotInitialized)));
    }

    #[test]
    fn initialize_then_encode_decode_round_trips() {
        let _guard = GUARD.lock().unwrap();
        let file = write_byte_vocab();
        initialize(&TokenizerConfig::byte_level(file.path())).unwrap();

        let ids = encode("hello").unwrap();
        assert_eq!(decode(&ids).unwrap(), "hello");
        reset();
    }

    #[test]
    fn reinitialize_replaces_prior_session() {
        let _guard = GUARD.lock().unwrap();
        let file_a = write_byte_vocab();
        initialize(&TokenizerConfig::byte_level(file_a.path())).unwrap();
        let first = current().unwrap();

        let file_b = write_byte_vocab();
        initialize(&TokenizerConfig::byte_level(file_b.path())).unwrap();
        let second = current().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        reset();
    }

    #[test]
    fn bpe_train_is_not_supported() {
        let err = bpe_train(Path::new("corpus.txt"), 1000).unwrap_err();
        assert!(matches!(err, TokenizerError::NotSupported("bpe_train")));
    }
}
