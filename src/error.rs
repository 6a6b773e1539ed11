//! Error types for tokenizer training, construction and persistence.
//!
//! Encoding and decoding are infallible: unknown symbols fall back to their
//! characters and unknown ids are skipped, so neither path appears here.

use indicatif::style::TemplateError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The persisted document failed structural validation.
    #[error("malformed tokenizer document: {0}")]
    MalformedDocument(String),

    /// The training corpus contained no usable characters.
    #[error("training corpus yields an empty vocabulary")]
    EmptyVocabulary,

    /// Filesystem failure during load or save, passed through untouched.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The tokenizer document could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A text normalization pattern failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] Box<fancy_regex::Error>),

    /// Progress bar template string was invalid.
    #[error("template parsing failed: {0}")]
    ProgressBarSetup(#[from] TemplateError),
}

impl From<fancy_regex::Error> for Error {
    fn from(e: fancy_regex::Error) -> Self {
        Self::InvalidPattern(Box::new(e))
    }
}

pub(crate) fn malformed<S: Into<String>>(msg: S) -> Error {
    Error::MalformedDocument(msg.into())
}
