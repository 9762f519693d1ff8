//! The closed, enumerated configuration surface for initializing a
//! [`Tokenizer`](crate::tokenizers::Tokenizer).
//!
//! This replaces the reference implementation's style of forwarding
//! arbitrary positional/keyword arguments into a native extension
//! (`hutoken.initialize(vocab_path, *args, **kwargs)` in
//! `original_source/hutoken.py`) with an explicit struct: any new knob
//! needs a field here, not a string key threaded through the hot path.

use std::path::PathBuf;

use crate::tokenizers::TokenId;

/// Configuration for loading a vocabulary and building a [`Tokenizer`](crate::tokenizers::Tokenizer).
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Path to the hex-encoded vocabulary file (§4.1/§6).
    pub vocab_path: PathBuf,

    /// Path to an optional special-characters override file (§4.2/§6).
    pub special_chars_path: Option<PathBuf>,

    /// An explicit prefix-sentinel glyph, overriding auto-detection.
    pub prefix: Option<char>,

    /// Whether the vocabulary was produced by a byte-level upstream
    /// tokenizer (GPT-2 family). Governs both the encode and decode paths.
    pub is_byte_encoder: bool,

    /// Token id substituted for byte sequences with no vocabulary entry,
    /// instead of failing encode with [`TokenizerError::UnknownInput`](crate::error::TokenizerError::UnknownInput).
    pub unknown_token_id: Option<TokenId>,
}

impl TokenizerConfig {
    /// Start a config for a byte-level (GPT-2 style) vocabulary at `vocab_path`.
    pub fn byte_level(vocab_path: impl Into<PathBuf>) -> TokenizerConfig {
        TokenizerConfig {
            vocab_path: vocab_path.into(),
            special_chars_path: None,
            prefix: None,
            is_byte_encoder: true,
            unknown_token_id: None,
        }
    }

    pub fn with_special_chars(mut self, path: impl Into<PathBuf>) -> TokenizerConfig {
        self.special_chars_path = Some(path.into());
        self
    }

    pub fn with_prefix(mut self, prefix: char) -> TokenizerConfig {
        self.prefix = Some(prefix);
        self
    }

    pub fn with_unknown_token_id(mut self, id: TokenId) -> TokenizerConfig {
        self.unknown_token_id = Some(id);
        self
    }
}
