//! `swiftbpe` is a byte-pair-encoding tokenizer library for GPT-2 style
//! vocabularies, tuned for high-throughput encode/decode over large corpora.
//!
//! A [`Tokenizer`] wraps a concrete [`Encoder`] (currently just [`Bpe`]) and
//! is built from a [`TokenizerConfig`] pointing at a vocabulary file. For
//! callers migrating from the reference API's global-session style, see
//! [`session`].

mod byte_alphabet;
mod pretokenizer;
mod vocab;

pub mod batch;
pub mod config;
pub mod error;
pub mod session;
pub mod tokenizers;

pub use batch::{batch_decode, batch_encode};
pub use config::TokenizerConfig;
pub use error::{TokenizerError, VocabError};
pub use pretokenizer::patterns;
pub use session::bpe_train;
pub use tokenizers::{Bpe, EncodeOptions, EncodedText, Encoder, TokenId, Tokenizer};
