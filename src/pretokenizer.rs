//! Splits input text into BPE-eligible chunks along a GPT-2-style regular
//! expression: contractions, then runs of letters, digits, punctuation and
//! whitespace, each optionally preceded by a single absorbed space.

use fancy_regex::Regex;

/// Regex patterns used by popular tokenizer models.
pub mod patterns {
    /// Tokenization regex used by GPT-2 and its descendants.
    ///
    /// See <https://github.com/openai/tiktoken/blob/main/tiktoken_ext/openai_public.py>.
    pub const GPT2: &str =
        r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";
}

/// A chunk produced by [`Pretokenizer::split`].
///
/// `text` includes a leading ASCII space when the pattern absorbed one; the
/// byte-level encoder turns that space into the prefix-sentinel glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pretoken<'a> {
    pub text: &'a str,
    /// Byte offset of `text` within the original input.
    pub start: usize,
}

/// Splits text into pretokens using a configurable regex.
///
/// Rust's `str` guarantees well-formed UTF-8 at the type level, which
/// satisfies the "reject malformed UTF-8 at the input boundary" requirement
/// without extra validation here; a binding layer accepting raw bytes from
/// another language is responsible for that check before calling in.
pub struct Pretokenizer {
    splitter: Regex,
}

impl Pretokenizer {
    /// Build a pretokenizer from an arbitrary pattern. The syntax supported
    /// is whatever [fancy_regex] supports, which includes the negative
    /// lookahead `(?!...)` the GPT-2 pattern needs.
    pub fn new(pattern: &str) -> Result<Pretokenizer, fancy_regex::Error> {
        Ok(Pretokenizer {
            splitter: Regex::new(pattern)?,
        })
    }

    /// Build a pretokenizer using the GPT-2 splitting pattern.
    pub fn gpt2() -> Pretokenizer {
        Pretokenizer::new(patterns::GPT2).expect("GPT2 pattern is a valid regex")
    }

    /// Split `text` into an ordered, non-overlapping sequence of pretokens
    /// whose concatenation equals `text`.
    pub fn split<'a>(&self, text: &'a str) -> Result<Vec<Pretoken<'a>>, fancy_regex::Error> {
        let mut out = Vec::new();
        for m in self.splitter.find_iter(text) {
            let m = m?;
            if m.range().is_empty() {
                continue;
            }
            out.push(Pretoken {
                text: m.as_str(),
                start: m.start(),
            });
        }
        Ok(out)
    }
}
