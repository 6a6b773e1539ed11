//! JSON persistence of tokenizer state.
//!
//! The document carries exactly what is needed to rebuild identical ids:
//!
//! ```json
//! {
//!   "vocab": ["▁", "a", "▁a"],
//!   "merges": [["▁", "a"]],
//!   "specials": ["<NAME>"]
//! }
//! ```
//!
//! `vocab` may also be an object whose keys, in document order, are the
//! symbols (values are ignored); older tools wrote it that way.

use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, malformed},
    merges::MergeRule,
    types::Symbol,
};

/// Serialized tokenizer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerDocument {
    /// Symbols in id order.
    #[serde(deserialize_with = "vocab_field::deserialize")]
    pub vocab: Vec<Symbol>,
    /// Merge rules in rank order.
    pub merges: Vec<MergeRule>,
    pub specials: Vec<Symbol>,
}

mod vocab_field {
    use serde::{Deserialize, Deserializer};

    use crate::types::Symbol;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum VocabRepr {
        List(Vec<Symbol>),
        Keys(serde_json::Map<String, serde_json::Value>),
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Symbol>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match VocabRepr::deserialize(deserializer)? {
            VocabRepr::List(symbols) => symbols,
            VocabRepr::Keys(map) => map.into_iter().map(|(k, _)| k).collect(),
        })
    }
}

impl TokenizerDocument {
    /// Parses and validates a document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedDocument`] for invalid JSON, a missing or
    /// misshaped field, or a symbol listed twice in `vocab`.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a document from `path`.
    ///
    /// # Errors
    ///
    /// I/O failures are returned as [`crate::Error::Io`] unchanged; content
    /// problems as [`crate::Error::MalformedDocument`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Self::from_json(&raw)
    }

    /// Writes the document to `path`, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        ensure_unique_vocab(&self.vocab)
    }
}

/// Rejects a vocabulary that lists a symbol twice, since a symbol's id is its
/// position.
pub(crate) fn ensure_unique_vocab<S: AsRef<str>>(vocab: &[S]) -> Result<()> {
    let mut seen = HashSet::with_capacity(vocab.len());
    for (id, symbol) in vocab.iter().enumerate() {
        let symbol = symbol.as_ref();
        if !seen.insert(symbol) {
            return Err(malformed(format!(
                "vocab symbol {symbol:?} at position {id} is a duplicate"
            )));
        }
    }
    Ok(())
}
