//! The byte <-> printable-character bijection used by byte-level BPE
//! tokenizers (GPT-2 and its descendants), plus file-driven overrides for
//! bytes whose upstream tokenizer encodes differently.
//!
//! Based on the `bytes_to_unicode` function in the original GPT-2 encoder -
//! <https://github.com/openai/gpt-2/blob/master/src/encoder.py>.

use std::collections::HashMap;
use std::path::Path;

use crate::error::VocabError;

/// Return true if `c` is considered printable.
///
/// This matches the output of Python's `str.isprintable` for code points <
/// 256, except for ASCII space, which GPT-2 also treats as needing
/// remapping.
fn is_printable(c: char) -> bool {
    !c.is_control() && !c.is_whitespace() && c != '\u{ad}' /* soft hyphen */
}

/// The GPT-2 byte-to-unicode bijection: printable ASCII and Latin-1 bytes
/// map to themselves, the remaining 68 bytes map, in ascending byte order,
/// to the code points immediately above the Latin-1 range.
fn default_byte_to_char() -> [char; 256] {
    let mut table = ['\0'; 256];

    for b in 0..=255u8 {
        if is_printable(char::from(b)) {
            table[b as usize] = char::from(b);
        }
    }

    let mut n: u32 = 0;
    for b in 0..=255u8 {
        if !is_printable(char::from(b)) {
            table[b as usize] = char::from_u32(256 + n).expect("valid code point");
            n += 1;
        }
    }

    table
}

/// Bijection between raw byte values and the printable alphabet used as key
/// material for a byte-level vocabulary, with support for per-byte
/// overrides loaded from a special-characters file.
///
/// Most bytes map to a single printable character (`B(b)`). A byte with an
/// override installed may map to a multi-character string instead, mirroring
/// the upstream tokenizer's actual output for that byte.
#[derive(Debug, Clone)]
pub struct ByteAlphabet {
    encoder: [String; 256],
    decoder: HashMap<String, u8>,
    /// Override strings with length > 1 character, longest first, used to
    /// greedily match multi-character overrides during decode.
    long_overrides: Vec<String>,
}

impl ByteAlphabet {
    /// Build the alphabet using only the standard GPT-2 byte mapping.
    pub fn standard() -> ByteAlphabet {
        let chars = default_byte_to_char();
        Self::from_encoder(chars.map(|c| c.to_string()))
    }

    /// Build the alphabet from the standard mapping, with entries replaced
    /// by `overrides` (byte value -> replacement string).
    pub fn with_overrides(overrides: &HashMap<u8, String>) -> ByteAlphabet {
        let chars = default_byte_to_char();
        let mut encoder = chars.map(|c| c.to_string());
        for (&byte, replacement) in overrides {
            encoder[byte as usize] = replacement.clone();
        }
        Self::from_encoder(encoder)
    }

    fn from_encoder(encoder: [String; 256]) -> ByteAlphabet {
        let mut decoder = HashMap::with_capacity(256);
        let mut long_overrides = Vec::new();
        for (byte, s) in encoder.iter().enumerate() {
            decoder.insert(s.clone(), byte as u8);
            if s.chars().count() > 1 {
                long_overrides.push(s.clone());
            }
        }
        long_overrides.sort_by_key(|s| std::cmp::Reverse(s.len()));

        ByteAlphabet {
            encoder,
            decoder,
            long_overrides,
        }
    }

    /// Parse a special-characters override file: one `<decimal byte> ==
    /// <replacement>` entry per line, per §6 of the vocab/special-chars
    /// grammar. Blank lines are tolerated at EOF only; a blank line with
    /// further entries after it is a fatal [`VocabError::InvalidLine`].
    pub fn load_overrides(path: &Path) -> Result<HashMap<u8, String>, VocabError> {
        let contents = std::fs::read_to_string(path)?;
        let lines: Vec<&str> = contents.lines().collect();
        let last_entry_line = lines.iter().rposition(|line| !line.trim().is_empty());

        let mut overrides = HashMap::new();
        let Some(last) = last_entry_line else {
            return Ok(overrides);
        };

        for line in &lines[..=last] {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return Err(VocabError::InvalidLine(line.to_string()));
            }
            let (lhs, rhs) = trimmed
                .split_once(" == ")
                .ok_or_else(|| VocabError::InvalidLine(trimmed.to_string()))?;
            let byte: u16 = lhs
                .trim()
                .parse()
                .map_err(|_| VocabError::InvalidLine(trimmed.to_string()))?;
            if byte > 255 {
                return Err(VocabError::InvalidLine(trimmed.to_string()));
            }
            overrides.insert(byte as u8, rhs.to_string());
        }

        Ok(overrides)
    }

    /// Encode a raw byte as its printable-alphabet representation.
    pub fn encode_byte(&self, byte: u8) -> &str {
        &self.encoder[byte as usize]
    }

    /// Encode raw bytes into the printable alphabet, concatenating each
    /// byte's representation in order.
    pub fn encode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        for &b in bytes {
            out.push_str(self.encode_byte(b));
        }
        out
    }

    /// Invert an encoded string back into the raw bytes it represents.
    ///
    /// Matches the longest installed override first at each position,
    /// falling back to a single code point mapped through the default
    /// bijection.
    pub fn decode(&self, encoded: &str) -> Option<Vec<u8>> {
        let mut bytes = Vec::with_capacity(encoded.len());
        let mut rest = encoded;

        'outer: while !rest.is_empty() {
            for candidate in &self.long_overrides {
                if rest.starts_with(candidate.as_str()) {
                    bytes.push(*self.decoder.get(candidate)?);
                    rest = &rest[candidate.len()..];
                    continue 'outer;
                }
            }

            let ch = rest.chars().next()?;
            let ch_len = ch.len_utf8();
            let piece = &rest[..ch_len];
            bytes.push(*self.decoder.get(piece)?);
            rest = &rest[ch_len..];
        }

        Some(bytes)
    }
}

impl Default for ByteAlphabet {
    fn default() -> ByteAlphabet {
        ByteAlphabet::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_maps_to_prefix_sentinel() {
        let alphabet = ByteAlphabet::standard();
        assert_eq!(alphabet.encode_byte(b' '), "\u{120}");
    }

    #[test]
    fn ascii_letters_are_identity() {
        let alphabet = ByteAlphabet::standard();
        assert_eq!(alphabet.encode_byte(b'A'), "A");
        assert_eq!(alphabet.encode_byte(b'z'), "z");
    }

    #[test]
    fn round_trips_arbitrary_bytes() {
        let alphabet = ByteAlphabet::standard();
        let bytes: Vec<u8> = (0..=255u8).collect();
        let encoded = alphabet.encode(&bytes);
        assert_eq!(alphabet.decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn overrides_replace_default_entries() {
        let mut overrides = HashMap::new();
        overrides.insert(0u8, "<NUL>".to_string());
        let alphabet = ByteAlphabet::with_overrides(&overrides);
        assert_eq!(alphabet.encode_byte(0), "<NUL>");
        assert_eq!(alphabet.decode("<NUL>").unwrap(), vec![0u8]);
    }

    fn write_overrides(lines: &[&str]) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn load_overrides_parses_entries_from_file() {
        let file = write_overrides(&["0 == <NUL>", "10 == <NL>"]);
        let overrides = ByteAlphabet::load_overrides(file.path()).unwrap();
        assert_eq!(overrides.get(&0), Some(&"<NUL>".to_string()));
        assert_eq!(overrides.get(&10), Some(&"<NL>".to_string()));
    }

    #[test]
    fn load_overrides_tolerates_trailing_blank_lines() {
        let file = write_overrides(&["0 == <NUL>", "", ""]);
        let overrides = ByteAlphabet::load_overrides(file.path()).unwrap();
        assert_eq!(overrides.get(&0), Some(&"<NUL>".to_string()));
    }

    #[test]
    fn load_overrides_rejects_blank_line_followed_by_more_entries() {
        let file = write_overrides(&["0 == <NUL>", "", "10 == <NL>"]);
        assert!(matches!(
            ByteAlphabet::load_overrides(file.path()),
            Err(VocabError::InvalidLine(_))
        ));
    }
}
