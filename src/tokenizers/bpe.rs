//! Byte Pair Encoding tokenizer, bit-exact with the GPT-2 family of models.
//!
//! Byte Pair Encoding was introduced by Sennrich, Haddow and Birch, "Neural
//! machine translation of rare words with subword units" (2015). The
//! variant used by GPT-2 [Radford et al. 2019] and its descendants operates
//! on bytes rather than characters, via an intermediate printable alphabet
//! (see [`crate::byte_alphabet`]), which avoids needing a huge base
//! vocabulary to support arbitrary Unicode input.
//!
//! Unlike a tokenizer built from a standalone merge list, this
//! implementation is purely vocabulary-driven: the rank of a candidate
//! merge `(a, b)` is the id of `a ∘ b` if that concatenation is itself a
//! vocabulary entry, and infinite otherwise. Lower id wins; ties are broken
//! strictly leftmost. This matches the reference tokenizer's output exactly
//! because a vocabulary's ids already encode merge order (earlier-learned
//! merges have lower ids).

use std::collections::HashMap;

use crate::byte_alphabet::ByteAlphabet;
use crate::config::TokenizerConfig;
use crate::error::TokenizerError;
use crate::pretokenizer::Pretokenizer;
use crate::tokenizers::{Encoder, TokenId};
use crate::vocab::Vocabulary;

/// Byte offsets of one code point within an encoded pretoken string.
type Span = (usize, usize);

fn char_spans(s: &str) -> Vec<Span> {
    let mut spans = Vec::with_capacity(s.len());
    for (start, ch) in s.char_indices() {
        spans.push((start, start + ch.len_utf8()));
    }
    spans
}

/// Reduce the code points of `s` to the minimum-rank tokenization, per
/// §4.4: a fast exact-match path, then repeated leftmost-minimum-rank
/// merges until no adjacent pair is itself a vocabulary entry.
fn bpe_merge(
    vocab: &Vocabulary,
    unknown_token_id: Option<TokenId>,
    s: &str,
) -> Result<Vec<TokenId>, TokenizerError> {
    if let Some(id) = vocab.id_of(s.as_bytes()) {
        return Ok(vec![id]);
    }

    let mut spans = char_spans(s);

    loop {
        let mut best: Option<(usize, TokenId)> = None;

        for i in 0..spans.len().saturating_sub(1) {
            let (start, _) = spans[i];
            let (_, end) = spans[i + 1];
            let Some(id) = vocab.id_of(s[start..end].as_bytes()) else {
                continue;
            };
            match best {
                Some((_, best_id)) if id >= best_id => {}
                _ => best = Some((i, id)),
            }
        }

        let Some((i, _)) = best else {
            break;
        };

        let (start, _) = spans[i];
        let (_, end) = spans[i + 1];
        spans[i] = (start, end);
        spans.remove(i + 1);
    }

    let mut ids = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match vocab.id_of(s[start..end].as_bytes()) {
            Some(id) => ids.push(id),
            None => match unknown_token_id {
                Some(id) => ids.push(id),
                None => return Err(TokenizerError::UnknownInput(s[start..end].to_string())),
            },
        }
    }
    Ok(ids)
}

/// Probe the word "hu" the way the reference loader does, recording the
/// prefix-sentinel glyph if the first resulting token begins with anything
/// other than an ASCII `h` (see §4.2). Only non-ASCII candidates are kept —
/// a plain leading space just means the vocabulary has no such convention.
fn detect_prefix_sentinel(
    vocab: &Vocabulary,
    alphabet: &ByteAlphabet,
    pretokenizer: &Pretokenizer,
    is_byte_encoder_mode: bool,
) -> Option<char> {
    let pretokens = pretokenizer.split(" hu").ok()?;
    let first = pretokens.first()?;
    let encoded = if is_byte_encoder_mode {
        alphabet.encode(first.text.as_bytes())
    } else {
        first.text.to_string()
    };

    let ids = bpe_merge(vocab, None, &encoded).ok()?;
    let first_id = *ids.first()?;
    let token_bytes = vocab.bytes_of(first_id)?;
    let token_str = std::str::from_utf8(token_bytes).ok()?;
    let first_char = token_str.chars().next()?;

    if first_char != 'h' && !first_char.is_ascii() {
        Some(first_char)
    } else {
        None
    }
}

/// Byte Pair Encoding tokenizer.
pub struct Bpe {
    vocab: Vocabulary,
    alphabet: ByteAlphabet,
    pretokenizer: Pretokenizer,
    is_byte_encoder_mode: bool,
    prefix_sentinel: Option<char>,
    unknown_token_id: Option<TokenId>,
}

impl Bpe {
    /// Load a vocabulary (and optional special-character overrides) per
    /// `config`, building a ready-to-use BPE tokenizer.
    pub fn new(config: &TokenizerConfig) -> Result<Bpe, TokenizerError> {
        let vocab = Vocabulary::load(&config.vocab_path)?;

        let overrides: HashMap<u8, String> = match &config.special_chars_path {
            Some(path) => ByteAlphabet::load_overrides(path)?,
            None => HashMap::new(),
        };
        let mut alphabet = if overrides.is_empty() {
            ByteAlphabet::standard()
        } else {
            ByteAlphabet::with_overrides(&overrides)
        };

        if config.is_byte_encoder {
            if let Some(prefix) = config.prefix {
                let mut with_prefix = overrides.clone();
                with_prefix.insert(b' ', prefix.to_string());
                alphabet = ByteAlphabet::with_overrides(&with_prefix);
            }
        }

        let pretokenizer = Pretokenizer::gpt2();

        let prefix_sentinel = match config.prefix {
            Some(c) => Some(c),
            None => detect_prefix_sentinel(&vocab, &alphabet, &pretokenizer, config.is_byte_encoder),
        };

        log::info!(
            "bpe tokenizer ready: {} ids, byte_encoder={}, prefix={:?}",
            vocab.len(),
            config.is_byte_encoder,
            prefix_sentinel
        );

        Ok(Bpe {
            vocab,
            alphabet,
            pretokenizer,
            is_byte_encoder_mode: config.is_byte_encoder,
            prefix_sentinel,
            unknown_token_id: config.unknown_token_id,
        })
    }

    /// Detected or configured prefix-sentinel glyph, if any.
    pub fn prefix_sentinel(&self) -> Option<char> {
        self.prefix_sentinel
    }

    fn encode_pretoken_text(&self, text: &str) -> String {
        if self.is_byte_encoder_mode {
            self.alphabet.encode(text.as_bytes())
        } else if let (Some(prefix), true) = (self.prefix_sentinel, text.starts_with(' ')) {
            let mut out = String::with_capacity(text.len());
            out.push(prefix);
            out.push_str(&text[1..]);
            out
        } else {
            text.to_string()
        }
    }

    fn encode_piece(&self, text: &str) -> Result<Vec<TokenId>, TokenizerError> {
        let encoded = self.encode_pretoken_text(text);
        bpe_merge(&self.vocab, self.unknown_token_id, &encoded)
    }
}

impl Encoder for Bpe {
    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    fn get_token_str(&self, id: TokenId) -> Result<String, TokenizerError> {
        let bytes = self
            .vocab
            .bytes_of(id)
            .ok_or(TokenizerError::IdOutOfRange(id as i64))?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(TokenizerError::InvalidUtf8)
    }

    fn get_token_id(&self, text: &str) -> Result<TokenId, TokenizerError> {
        let encoded = self.encode_pretoken_text(text);
        self.vocab
            .id_of(encoded.as_bytes())
            .ok_or_else(|| TokenizerError::UnknownInput(text.to_string()))
    }

    fn encode_sequence(
        &self,
        text: &str,
        on_token: &mut dyn FnMut(usize, TokenId),
    ) -> Result<(), TokenizerError> {
        let pretokens = self
            .pretokenizer
            .split(text)
            .map_err(|err| TokenizerError::InvalidFormat(crate::error::VocabError::InvalidLine(err.to_string())))?;

        for pretoken in pretokens {
            for id in self.encode_piece(pretoken.text)? {
                on_token(pretoken.start, id);
            }
        }

        Ok(())
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String, TokenizerError> {
        let mut buf = String::new();
        for &id in ids {
            buf.push_str(&self.get_token_str(id)?);
        }

        if self.is_byte_encoder_mode {
            let raw = self
                .alphabet
                .decode(&buf)
                .ok_or_else(|| TokenizerError::UnknownInput(buf.clone()))?;
            String::from_utf8(raw).map_err(|err| TokenizerError::InvalidUtf8(err.utf8_error()))
        } else {
            match self.prefix_sentinel {
                Some(prefix) => {
                    // Every pretoken that followed whitespace got the sentinel
                    // in place of its leading space (see `encode_pretoken_text`),
                    // not just the first one in the sequence, so every
                    // occurrence must turn back into a space; only the very
                    // first is sentence-initial and has no space to restore.
                    let starts_with_prefix = buf.starts_with(prefix);
                    let mut text = buf.replace(prefix, " ");
                    if starts_with_prefix {
                        text.remove(0);
                    }
                    Ok(text)
                }
                None => Ok(buf),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizers::Tokenizer;
    use std::io::Write;

    /// Build a vocab file from `entries` (token text, id) pairs in the hex
    /// format described in §4.1/§6, encoding each token's text through the
    /// standard byte alphabet first, the same way `original_source/scripts/convert.py`
    /// turns a `vocab.json` into the on-disk vocab format.
    fn write_vocab(entries: &[(&str, u32)]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (text, id) in entries {
            let hex: String = text.as_bytes().iter().map(|b| format!("0x{:02X}", b)).collect();
            writeln!(file, "{} == {}", hex, id).unwrap();
        }
        file.flush().unwrap();
        file
    }

    /// All 256 single-byte tokens plus a handful of merges, mimicking the
    /// first ~25 lines of the real GPT-2 merge list.
    fn mini_gpt2_vocab() -> tempfile::NamedTempFile {
        let mut entries: Vec<(&str, u32)> = Vec::new();
        let alphabet = ByteAlphabet::standard();
        static SINGLE_CHARS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        let singles = SINGLE_CHARS.get_or_init(|| (0..=255u8).map(|b| alphabet.encode_byte(b).to_string()).collect());
        for (i, s) in singles.iter().enumerate() {
            entries.push((s.as_str(), i as u32));
        }

        let merges: &[(&str, &str)] = &[
            ("\u{120}", "t"),
            ("\u{120}", "a"),
            ("h", "e"),
            ("i", "n"),
            ("r", "e"),
            ("o", "n"),
            ("\u{120}t", "he"),
            ("e", "r"),
            ("\u{120}", "s"),
            ("a", "t"),
            ("\u{120}", "w"),
            ("\u{120}", "o"),
            ("e", "n"),
            ("\u{120}", "c"),
            ("i", "t"),
            ("i", "s"),
            ("a", "n"),
            ("o", "r"),
            ("e", "s"),
            ("\u{120}", "b"),
            ("e", "d"),
            ("\u{120}", "f"),
            ("in", "g"),
        ];

        let mut next_id = 256u32;
        let mut merged_strs: Vec<String> = Vec::new();
        for (a, b) in merges {
            let merged = format!("{}{}", a, b);
            merged_strs.push(merged);
        }
        for merged in &merged_strs {
            entries.push((merged.as_str(), next_id));
            next_id += 1;
        }

        write_vocab(&entries)
    }

    fn config_for(file: &tempfile::NamedTempFile) -> TokenizerConfig {
        TokenizerConfig::byte_level(file.path())
    }

    #[test]
    fn encodes_using_minimum_rank_merges() {
        let file = mini_gpt2_vocab();
        let bpe = Bpe::new(&config_for(&file)).unwrap();
        let tokenizer = Tokenizer::new(bpe);

        let encoded = tokenizer.encode("the cat is in the bed", Default::default()).unwrap();
        let tokens = tokenizer.encoder().get_tokens(encoded.token_ids()).unwrap();

        assert_eq!(
            tokens,
            vec!["t", "he", "\u{120}c", "at", "\u{120}", "is", "\u{120}", "in", "\u{120}the", "\u{120}b", "ed"]
        );
    }

    #[test]
    fn repeated_merges_compound() {
        // Vocab only has "--" (256) and "----" (257), not six or eight dashes,
        // so encoding "------" (six dashes) must go through several rounds of
        // the merge loop rather than matching a single entry outright: pairs
        // of single dashes merge into "--" first, then pairs of "--" merge
        // into "----" wherever the lower-id merge is available, leaving a
        // final ["----", "--"] split that a single round of pairwise merging
        // could not produce.
        let alphabet = ByteAlphabet::standard();
        let mut entries: Vec<(String, u32)> = (0..=255u8)
            .map(|b| (alphabet.encode_byte(b).to_string(), b as u32))
            .collect();
        let mut next_id = 256u32;
        for merged in ["--", "----"] {
            entries.push((merged.to_string(), next_id));
            next_id += 1;
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (text, id) in &entries {
            let hex: String = text.as_bytes().iter().map(|b| format!("0x{:02X}", b)).collect();
            writeln!(file, "{} == {}", hex, id).unwrap();
        }
        file.flush().unwrap();

        let bpe = Bpe::new(&config_for(&file)).unwrap();
        let tokenizer = Tokenizer::new(bpe);
        let encoded = tokenizer.encode("------", Default::default()).unwrap();
        let tokens = tokenizer.encoder().get_tokens(encoded.token_ids()).unwrap();
        assert_eq!(tokens, vec!["----", "--"]);
    }

    #[test]
    fn decode_inverts_encode() {
        let file = mini_gpt2_vocab();
        let bpe = Bpe::new(&config_for(&file)).unwrap();
        let tokenizer = Tokenizer::new(bpe);

        let text = "the cat is in the bed";
        let encoded = tokenizer.encode(text, Default::default()).unwrap();
        let decoded = tokenizer.decode(encoded.token_ids()).unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn empty_input_round_trips() {
        let file = mini_gpt2_vocab();
        let bpe = Bpe::new(&config_for(&file)).unwrap();
        let tokenizer = Tokenizer::new(bpe);

        let encoded = tokenizer.encode("", Default::default()).unwrap();
        assert!(encoded.token_ids().is_empty());
        assert_eq!(tokenizer.decode(&[]).unwrap(), "");
    }

    #[test]
    fn decode_out_of_range_id_errors() {
        let file = mini_gpt2_vocab();
        let bpe = Bpe::new(&config_for(&file)).unwrap();
        let tokenizer = Tokenizer::new(bpe);

        let err = tokenizer.decode(&[999_999]).unwrap_err();
        assert_eq!(err.to_string(), "Element must be non-negative and less than vocab size.");
    }

    #[test]
    fn single_byte_not_in_overrides_is_one_token() {
        let file = mini_gpt2_vocab();
        let bpe = Bpe::new(&config_for(&file)).unwrap();
        let tokenizer = Tokenizer::new(bpe);

        let encoded = tokenizer.encode("Q", Default::default()).unwrap();
        assert_eq!(encoded.token_ids().len(), 1);
    }

    #[test]
    fn prefix_sentinel_is_detected_for_byte_level_vocab() {
        let file = mini_gpt2_vocab();
        let bpe = Bpe::new(&config_for(&file)).unwrap();
        assert_eq!(bpe.prefix_sentinel(), Some('\u{120}'));
    }

    #[test]
    fn non_byte_encoder_decode_restores_every_interior_sentinel() {
        // A non-byte-level vocabulary whose prefix sentinel is a literal
        // character rather than part of a byte-alphabet mapping: every
        // pretoken after the first gets the sentinel in place of its
        // absorbed space, and decode must restore all of them, not just a
        // single leading one.
        let entries: &[(&str, u32)] = &[("the", 0), ("\u{120}quick", 1), ("\u{120}fox", 2)];
        let file = write_vocab(entries);
        let mut config = TokenizerConfig::byte_level(file.path());
        config.is_byte_encoder = false;
        config.prefix = Some('\u{120}');
        let bpe = Bpe::new(&config).unwrap();
        let tokenizer = Tokenizer::new(bpe);

        let text = "the quick fox";
        let encoded = tokenizer.encode(text, Default::default()).unwrap();
        assert_eq!(encoded.token_ids(), &[0, 1, 2]);
        assert_eq!(tokenizer.decode(encoded.token_ids()).unwrap(), text);
    }
}
