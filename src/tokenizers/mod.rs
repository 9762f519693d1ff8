//! Tokenizer front end: the [`Encoder`] trait implemented by concrete
//! tokenization strategies, and the [`Tokenizer`] wrapper that drives one.

pub mod bpe;

pub use bpe::Bpe;
pub use crate::pretokenizer::patterns;

use crate::error::TokenizerError;

/// A vocabulary token id.
pub type TokenId = u32;

/// A tokenization strategy: turns text into token ids and back.
///
/// This is the seam a binding layer or an alternative tokenization scheme
/// (WordPiece, Unigram, ...) would implement against; [`Bpe`] is the only
/// implementation this crate ships.
pub trait Encoder: Send + Sync {
    /// Number of ids in the encoder's id space.
    fn vocab_size(&self) -> usize;

    /// Return the text an id decodes to in isolation.
    fn get_token_str(&self, id: TokenId) -> Result<String, TokenizerError>;

    /// Return the id of a token whose text is exactly `text`, if the
    /// encoder's vocabulary has an entry for it as a single token.
    fn get_token_id(&self, text: &str) -> Result<TokenId, TokenizerError>;

    /// Tokenize `text`, invoking `on_token(source_offset, id)` for every
    /// token produced, in order. `source_offset` is the byte offset within
    /// `text` of the pretoken the id came from.
    fn encode_sequence(
        &self,
        text: &str,
        on_token: &mut dyn FnMut(usize, TokenId),
    ) -> Result<(), TokenizerError>;

    /// Decode a sequence of ids back into text.
    ///
    /// The default concatenates each id's token string in turn. Encoders
    /// whose token strings are not literal output text — e.g. a byte-level
    /// encoder whose tokens are an intermediate printable alphabet rather
    /// than the final bytes — override this.
    fn decode(&self, ids: &[TokenId]) -> Result<String, TokenizerError> {
        let mut out = String::new();
        for &id in ids {
            out.push_str(&self.get_token_str(id)?);
        }
        Ok(out)
    }

    /// Convenience: decode each id to its own token string.
    fn get_tokens(&self, ids: &[TokenId]) -> Result<Vec<String>, TokenizerError> {
        ids.iter().map(|&id| self.get_token_str(id)).collect()
    }
}

/// Reserved for future per-call encode knobs (e.g. whether to emit added
/// special tokens). Currently empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {}

/// The result of [`Tokenizer::encode`]: the token ids plus the byte offset
/// in the source text each one came from.
#[derive(Debug, Clone, Default)]
pub struct EncodedText {
    ids: Vec<TokenId>,
    offsets: Vec<usize>,
}

impl EncodedText {
    pub fn token_ids(&self) -> &[TokenId] {
        &self.ids
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn into_ids(self) -> Vec<TokenId> {
        self.ids
    }
}

/// Wraps an [`Encoder`] to provide the public encode/decode surface.
///
/// A `Tokenizer` owns its encoder outright, in contrast to the reference
/// implementation's process-wide globals (see [`crate::session`]): several
/// tokenizers can exist side by side, each independently constructed from a
/// [`TokenizerConfig`](crate::config::TokenizerConfig).
pub struct Tokenizer {
    encoder: Box<dyn Encoder>,
}

impl Tokenizer {
    pub fn new(encoder: impl Encoder + 'static) -> Tokenizer {
        Tokenizer {
            encoder: Box::new(encoder),
        }
    }

    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    /// Tokenize `text`.
    pub fn encode(&self, text: &str, _options: EncodeOptions) -> Result<EncodedText, TokenizerError> {
        let mut ids = Vec::new();
        let mut offsets = Vec::new();
        self.encoder.encode_sequence(text, &mut |offset, id| {
            ids.push(id);
            offsets.push(offset);
        })?;
        Ok(EncodedText { ids, offsets })
    }

    /// Detokenize `ids` back into text.
    pub fn decode(&self, ids: &[TokenId]) -> Result<String, TokenizerError> {
        self.encoder.decode(ids)
    }
}
