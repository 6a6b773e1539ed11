//! Token↔ID codec - dense bidirectional mapping between symbols and ids.
//!
//! Ids follow vocabulary insertion order, then every special token that the
//! vocabulary does not already contain. Neither direction ever fails: encode
//! falls back to single characters and drops whatever is still unknown,
//! decode skips ids it does not know.

use std::collections::HashMap;

use fancy_regex::Regex;

use crate::{
    error::Result,
    segmenter::WORD_MARKER,
    types::{Symbol, TokenId},
};

/// Whitespace run followed by one of the marks that attach to the previous word.
const SPACE_BEFORE_PUNCT: &str = r"\s+([.,;:!?])";

#[derive(Debug, Clone)]
pub struct Codec {
    id_to_symbol: Vec<Symbol>,
    symbol_to_id: HashMap<Symbol, TokenId>,
    space_before_punct: Regex,
}

impl Codec {
    /// Assigns ids to `vocab` in order, then to each special not yet present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPattern`] if the punctuation pattern
    /// fails to compile.
    pub fn new<V, S>(vocab: &[V], specials: &[S]) -> Result<Self>
    where
        V: AsRef<str>,
        S: AsRef<str>,
    {
        let mut id_to_symbol = Vec::with_capacity(vocab.len() + specials.len());
        let mut symbol_to_id = HashMap::with_capacity(vocab.len() + specials.len());

        let all = vocab
            .iter()
            .map(AsRef::as_ref)
            .chain(specials.iter().map(AsRef::as_ref));
        for symbol in all {
            if symbol_to_id.contains_key(symbol) {
                continue;
            }
            symbol_to_id.insert(symbol.to_string(), id_to_symbol.len());
            id_to_symbol.push(symbol.to_string());
        }

        Ok(Self {
            id_to_symbol,
            symbol_to_id,
            space_before_punct: Regex::new(SPACE_BEFORE_PUNCT)?,
        })
    }

    /// Total number of ids, specials included.
    pub fn len(&self) -> usize {
        self.id_to_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_symbol.is_empty()
    }

    pub fn id_of(&self, symbol: &str) -> Option<TokenId> {
        self.symbol_to_id.get(symbol).copied()
    }

    pub fn symbol_of(&self, id: TokenId) -> Option<&str> {
        self.id_to_symbol.get(id).map(String::as_str)
    }

    /// Maps symbols to ids.
    ///
    /// A symbol without an id (only possible with corrupted state) is
    /// replaced by the ids of its characters; characters without an id are
    /// dropped.
    pub fn encode_symbols<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<TokenId> {
        let mut ids = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.as_ref();
            match self.id_of(symbol) {
                Some(id) => ids.push(id),
                None => {
                    let mut buf = [0u8; 4];
                    ids.extend(symbol.chars().filter_map(|c| self.id_of(c.encode_utf8(&mut buf))));
                }
            }
        }
        ids
    }

    /// Maps ids back to text.
    ///
    /// Unknown ids are skipped. Word markers become spaces, one leading space
    /// is trimmed and whitespace directly before `. , ; : ! ?` is removed.
    pub fn decode_ids(&self, ids: &[TokenId]) -> String {
        let joined: String = ids
            .iter()
            .filter_map(|&id| self.symbol_of(id))
            .collect();

        let spaced = joined.replace(WORD_MARKER, " ");
        let trimmed = spaced.strip_prefix(' ').unwrap_or(&spaced);

        self.space_before_punct.replace_all(trimmed, "$1").into_owned()
    }
}
