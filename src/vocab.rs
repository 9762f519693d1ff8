//! The vocabulary store: an ordered, bidirectional mapping between token ids
//! and token byte-sequences, loaded from the hex-encoded vocab file format.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::VocabError;

/// A node in the trie used for [`Vocabulary::longest_prefix_token`].
///
/// `HashMap` stores its entries out-of-line, so this recursive type does not
/// need an explicit `Box` indirection.
#[derive(Default)]
struct TrieNode {
    children: FxHashMap<u8, TrieNode>,
    id: Option<u32>,
}

impl TrieNode {
    fn insert(&mut self, bytes: &[u8], id: u32) {
        let mut node = self;
        for &b in bytes {
            node = node.children.entry(b).or_default();
        }
        node.id = Some(id);
    }

    /// Return the id and byte-length of the longest entry that is a prefix
    /// of `buf`.
    fn longest_match(&self, buf: &[u8]) -> Option<(u32, usize)> {
        let mut node = self;
        let mut best = None;

        for (i, &b) in buf.iter().enumerate() {
            let Some(next) = node.children.get(&b) else {
                break;
            };
            node = next;
            if let Some(id) = node.id {
                best = Some((id, i + 1));
            }
        }

        best
    }
}

/// An ordered collection of tokens, indexed both by id and by byte sequence.
///
/// Ids are contiguous from 0. A vocab file need not list ids in order, but
/// gaps (an id with no corresponding entry) are tracked and reported as
/// absent by [`Vocabulary::bytes_of`].
pub struct Vocabulary {
    id_to_bytes: Vec<Vec<u8>>,
    present: Vec<bool>,
    bytes_to_id: FxHashMap<Vec<u8>, u32>,
    trie: TrieNode,
}

/// One parsed vocab-file line: the token's raw bytes and its id.
fn parse_vocab_line(line: &str) -> Result<(Vec<u8>, u32), VocabError> {
    let invalid = || VocabError::InvalidLine(line.to_string());

    let (hex_part, id_part) = line.split_once(" == ").ok_or_else(invalid)?;
    if hex_part.is_empty() {
        return Err(invalid());
    }

    let mut bytes = Vec::with_capacity(hex_part.len() / 4);
    let mut rest = hex_part;
    while !rest.is_empty() {
        let chunk = rest.get(..4).ok_or_else(invalid)?;
        if &chunk[..2] != "0x" {
            return Err(invalid());
        }
        let byte = u8::from_str_radix(&chunk[2..4], 16).map_err(|_| invalid())?;
        bytes.push(byte);
        rest = &rest[4..];
    }

    let id: u32 = id_part.trim().parse().map_err(|_| invalid())?;
    Ok((bytes, id))
}

impl Vocabulary {
    /// Load a vocabulary from its on-disk format: one entry per line,
    /// `0xHH0xHH…0xHH == <id>`, where each `0xHH` is an upper-case hex byte
    /// and the hex run is the token's raw bytes concatenated in order.
    ///
    /// Blank lines are tolerated at EOF only (a trailing newline or trailing
    /// run of empty lines); a blank line with further entries after it
    /// indicates a truncated or corrupted file and is a fatal
    /// [`VocabError::InvalidLine`]. Any non-blank line that doesn't match
    /// the grammar is likewise a fatal [`VocabError::InvalidLine`]; a file
    /// with no valid entries is a fatal [`VocabError::Empty`].
    pub fn load(path: &Path) -> Result<Vocabulary, VocabError> {
        let contents = std::fs::read_to_string(path)?;
        let lines: Vec<&str> = contents.lines().collect();
        let last_entry_line = lines.iter().rposition(|line| !line.trim().is_empty());

        let mut entries = Vec::new();
        if let Some(last) = last_entry_line {
            for line in &lines[..=last] {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return Err(VocabError::InvalidLine(line.to_string()));
                }
                entries.push(parse_vocab_line(trimmed)?);
            }
        }

        if entries.is_empty() {
            return Err(VocabError::Empty);
        }

        let max_id = entries.iter().map(|(_, id)| *id).max().unwrap();
        let size = max_id as usize + 1;

        let mut id_to_bytes = vec![Vec::new(); size];
        let mut present = vec![false; size];
        let mut bytes_to_id = FxHashMap::default();
        let mut trie = TrieNode::default();

        for (bytes, id) in entries {
            trie.insert(&bytes, id);
            bytes_to_id.insert(bytes.clone(), id);
            id_to_bytes[id as usize] = bytes;
            present[id as usize] = true;
        }

        log::info!(
            "loaded vocabulary from {}: {} ids ({} distinct byte sequences)",
            path.display(),
            size,
            bytes_to_id.len()
        );

        Ok(Vocabulary {
            id_to_bytes,
            present,
            bytes_to_id,
            trie,
        })
    }

    /// Number of ids in the dense id space, i.e. one past the highest id in
    /// the vocab file.
    pub fn len(&self) -> usize {
        self.id_to_bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_bytes.is_empty()
    }

    /// Look up the id of an exact token byte-sequence.
    pub fn id_of(&self, bytes: &[u8]) -> Option<u32> {
        self.bytes_to_id.get(bytes).copied()
    }

    /// Look up the byte-sequence for a token id.
    pub fn bytes_of(&self, id: u32) -> Option<&[u8]> {
        if *self.present.get(id as usize)? {
            self.id_to_bytes.get(id as usize).map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Find the longest vocabulary entry that is a prefix of `buf`, and its
    /// byte length. This supports a greedy longest-match tokenization
    /// strategy as an alternative to the rank-based BPE merge engine; the
    /// bit-exact `encode` path does not use it.
    pub fn longest_prefix_token(&self, buf: &[u8]) -> Option<(u32, usize)> {
        self.trie.longest_match(buf)
    }
}
