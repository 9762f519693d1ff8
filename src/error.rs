use std::error::Error;
use std::fmt;
use std::io;
use std::str::Utf8Error;

/// Errors produced while loading a vocabulary or special-character override
/// file from disk.
///
/// See the vocab file grammar documented on [`Vocabulary::load`](crate::vocab::Vocabulary::load).
#[derive(Debug)]
pub enum VocabError {
    /// A line did not match the `<hex-bytes> == <id>` (or, for the
    /// special-chars file, `<byte> == <replacement>`) grammar.
    InvalidLine(String),

    /// The file contained no entries that parsed successfully.
    Empty,

    /// The vocab or special-chars file could not be opened or read.
    Io(io::Error),
}

impl fmt::Display for VocabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabError::InvalidLine(_) => write!(f, "Invalid format in vocab file."),
            VocabError::Empty => write!(f, "Vocab file is empty or contains no valid entries."),
            VocabError::Io(err) => write!(f, "could not read vocab file: {}", err),
        }
    }
}

impl Error for VocabError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VocabError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for VocabError {
    fn from(err: io::Error) -> VocabError {
        VocabError::Io(err)
    }
}

/// Errors that can occur when initializing a [`Tokenizer`](crate::tokenizers::Tokenizer),
/// or encoding or decoding text with one.
#[derive(Debug)]
pub enum TokenizerError {
    /// `encode`/`decode` was called before `initialize`, or on a session
    /// that was never populated.
    NotInitialized,

    /// The vocab or special-chars file was malformed.
    InvalidFormat(VocabError),

    /// A token id passed to `decode` was negative or `>= vocab_size`.
    IdOutOfRange(i64),

    /// The vocab/special-chars file could not be opened or read.
    Io(io::Error),

    /// A byte sequence encountered during encoding has no representation in
    /// the loaded vocabulary. This should not happen for a byte-level
    /// encoder, whose base alphabet is total; it is reachable only for a
    /// non-byte-level vocabulary that is missing entries.
    UnknownInput(String),

    /// The concatenated token bytes produced by `decode` were not valid
    /// UTF-8.
    InvalidUtf8(Utf8Error),

    /// A feature the reference API exposes but which is out of scope for
    /// this crate (e.g. `bpe_train`).
    NotSupported(&'static str),
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::NotInitialized => write!(
                f,
                "Vocabulary is not initialized. Call `initialize` before encoding or decoding."
            ),
            TokenizerError::InvalidFormat(err) => write!(f, "{}", err),
            TokenizerError::IdOutOfRange(_) => {
                write!(f, "Element must be non-negative and less than vocab size.")
            }
            TokenizerError::Io(err) => write!(f, "{}", err),
            TokenizerError::UnknownInput(text) => {
                write!(f, "Invalid format in vocab file: no token for {:?}", text)
            }
            TokenizerError::InvalidUtf8(err) => write!(f, "decoded bytes are not valid UTF-8: {}", err),
            TokenizerError::NotSupported(what) => write!(f, "{} is not supported by this crate", what),
        }
    }
}

impl Error for TokenizerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TokenizerError::InvalidFormat(err) => Some(err),
            TokenizerError::Io(err) => Some(err),
            TokenizerError::InvalidUtf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VocabError> for TokenizerError {
    fn from(err: VocabError) -> TokenizerError {
        match err {
            VocabError::Io(err) => TokenizerError::Io(err),
            other => TokenizerError::InvalidFormat(other),
        }
    }
}

impl From<io::Error> for TokenizerError {
    fn from(err: io::Error) -> TokenizerError {
        TokenizerError::Io(err)
    }
}
