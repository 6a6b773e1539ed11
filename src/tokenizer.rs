//! This module provides the complete tokenizer pipeline:
//! 1. Literal special-token splitting.
//! 2. Whitespace word segmentation with a word-boundary marker.
//! 3. Rank-ordered BPE merges per word.
//! 4. Symbol ↔ id mapping.
//!
//! A [`Tokenizer`] never changes after construction. Retraining or loading
//! produces a new value, so any number of threads may encode and decode
//! through a shared reference; the batch helpers do exactly that via Rayon.

use std::path::Path;

use indicatif::ParallelProgressIterator;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    codec::Codec,
    config::TrainConfig,
    error::Result,
    merges::{MergeRule, RankTable},
    persistence::{self, TokenizerDocument},
    progress,
    segmenter::{self, Segment, WORD_MARKER, WordUnit},
    trainer,
    types::{Symbol, TokenId},
};

/// Output of [`Tokenizer::encode`].
///
/// `tokens` lists the symbols produced by segmentation and merging. `ids` is
/// usually parallel to it, except where a symbol had to fall back to its
/// characters (corrupted state only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub ids: Vec<TokenId>,
    pub tokens: Vec<Symbol>,
}

/// Size figures for an encoded text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodingStats {
    pub tokens: usize,
    /// Number of UTF-16 code units, the unit browsers and JSON clients count in.
    pub characters: usize,
    pub avg_chars_per_token: f64,
}

impl Encoding {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Counts for `text`, the input this encoding was produced from.
    pub fn stats(&self, text: &str) -> EncodingStats {
        let tokens = self.ids.len();
        let characters = text.encode_utf16().count();
        let avg_chars_per_token = if tokens == 0 {
            0.0
        } else {
            characters as f64 / tokens as f64
        };
        EncodingStats {
            tokens,
            characters,
            avg_chars_per_token,
        }
    }
}

/// Summary of a tokenizer's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenizerStats {
    /// Number of ids, specials included.
    pub vocab_size: usize,
    pub merges: usize,
    pub specials: Vec<Symbol>,
}

/// Trained BPE tokenizer state.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Vec<Symbol>,
    merges: Vec<MergeRule>,
    specials: Vec<Symbol>,
    ranks: RankTable,
    codec: Codec,
}

impl Tokenizer {
    /// Assembles a tokenizer from its parts and derives the rank table and
    /// id maps.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedDocument`] if `vocab` lists a symbol
    /// twice, or [`crate::Error::InvalidPattern`] if the decode normalization
    /// pattern fails to compile.
    pub fn new(vocab: Vec<Symbol>, merges: Vec<MergeRule>, specials: Vec<Symbol>) -> Result<Self> {
        persistence::ensure_unique_vocab(&vocab)?;
        let ranks = RankTable::new(&merges);
        let codec = Codec::new(&vocab, &specials)?;
        Ok(Self {
            vocab,
            merges,
            specials,
            ranks,
            codec,
        })
    }

    /// Learns a vocabulary and merge rules from `text`.
    ///
    /// Special tokens are cut out of the corpus before counting, so their
    /// characters never contribute to merges.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EmptyVocabulary`] if the corpus has no
    /// characters outside special tokens, or [`crate::Error::ProgressBarSetup`]
    /// if the progress bar fails to initialize.
    pub fn train(text: &str, config: &TrainConfig) -> Result<Self> {
        let words: Vec<Vec<char>> = segmenter::segment(text, &config.specials)
            .into_iter()
            .filter_map(|unit| match unit {
                WordUnit::Word(w) => Some(w.chars().collect()),
                WordUnit::Special(_) => None,
            })
            .collect();

        let learned = trainer::learn(&words, config.vocab_size, config.show_progress)?;
        Self::new(learned.vocab, learned.merges, config.specials.clone())
    }

    /// Encode text into ids and the symbols they stand for.
    ///
    /// Special tokens are emitted verbatim. When the text before a special
    /// ends with whitespace a standalone word marker is emitted ahead of it;
    /// text after a special gets no such marker because its first word
    /// already carries one.
    pub fn encode(&self, text: &str) -> Encoding {
        let segments = segmenter::split_on_specials(text, &self.specials);
        let mut tokens: Vec<Symbol> = Vec::with_capacity(text.len() / 2);

        for (i, segment) in segments.iter().enumerate() {
            match *segment {
                Segment::Special(special) => tokens.push(special.to_string()),
                Segment::Text(part) => {
                    for word in segmenter::marked_words(part) {
                        tokens.extend(self.merge_word(&word));
                    }
                    let next_is_special = matches!(segments.get(i + 1), Some(Segment::Special(_)));
                    if next_is_special && part.ends_with(char::is_whitespace) {
                        tokens.push(WORD_MARKER.to_string());
                    }
                }
            }
        }

        let ids = self.codec.encode_symbols(&tokens);
        Encoding { ids, tokens }
    }

    /// Decode ids back to text. Unknown ids are ignored.
    pub fn decode(&self, ids: &[TokenId]) -> String {
        self.codec.decode_ids(ids)
    }

    /// Encode many texts in parallel using Rayon.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ProgressBarSetup`] if the progress bar template
    /// fails to compile.
    pub fn encode_batch(&self, texts: &[&str], show_progress: bool) -> Result<Vec<Encoding>> {
        let pb = progress::optional(show_progress, texts.len() as u64, "Encoding texts")?;
        Ok(texts
            .par_iter()
            .progress_with(pb)
            .map(|text| self.encode(text))
            .collect())
    }

    /// Decode many id sequences in parallel using Rayon.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ProgressBarSetup`] if the progress bar template
    /// fails to compile.
    pub fn decode_batch(&self, id_seqs: &[&[TokenId]], show_progress: bool) -> Result<Vec<String>> {
        let pb = progress::optional(show_progress, id_seqs.len() as u64, "Decoding tokens")?;
        Ok(id_seqs
            .par_iter()
            .progress_with(pb)
            .map(|ids| self.decode(ids))
            .collect())
    }

    /// Applies the learned merges to one marked word.
    fn merge_word(&self, word: &str) -> Vec<Symbol> {
        let symbols: Vec<Symbol> = word.chars().map(String::from).collect();
        self.ranks.apply(symbols)
    }

    pub fn to_document(&self) -> TokenizerDocument {
        TokenizerDocument {
            vocab: self.vocab.clone(),
            merges: self.merges.clone(),
            specials: self.specials.clone(),
        }
    }

    pub fn from_document(doc: TokenizerDocument) -> Result<Self> {
        Self::new(doc.vocab, doc.merges, doc.specials)
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_document().to_json()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_document(TokenizerDocument::from_json(json)?)
    }

    /// Loads a tokenizer saved with [`Tokenizer::save`].
    ///
    /// # Errors
    ///
    /// [`crate::Error::Io`] if the file cannot be read,
    /// [`crate::Error::MalformedDocument`] if its content is not a valid
    /// tokenizer document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Self::from_document(TokenizerDocument::read(path)?)?;
        info!(
            "loaded tokenizer from {}: {} ids, {} merges",
            path.display(),
            tokenizer.codec.len(),
            tokenizer.merges.len()
        );
        Ok(tokenizer)
    }

    /// Writes the tokenizer document to `path`.
    ///
    /// Concurrent writers to the same path must be serialized by the caller.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_document().write(path)?;
        info!("saved tokenizer to {}", path.display());
        Ok(())
    }

    pub fn stats(&self) -> TokenizerStats {
        TokenizerStats {
            vocab_size: self.codec.len(),
            merges: self.merges.len(),
            specials: self.specials.clone(),
        }
    }

    /// Learned symbols in id order, specials excluded.
    pub fn vocab(&self) -> &[Symbol] {
        &self.vocab
    }

    pub fn merges(&self) -> &[MergeRule] {
        &self.merges
    }

    pub fn specials(&self) -> &[Symbol] {
        &self.specials
    }

    /// Number of ids, specials included.
    pub fn vocab_size(&self) -> usize {
        self.codec.len()
    }

    pub fn token_to_id(&self, symbol: &str) -> Option<TokenId> {
        self.codec.id_of(symbol)
    }

    pub fn id_to_token(&self, id: TokenId) -> Option<&str> {
        self.codec.symbol_of(id)
    }
}

/// Parses a list of token ids separated by commas and/or whitespace.
///
/// Entries that are not non-negative integers are skipped.
pub fn parse_token_ids(input: &str) -> Vec<TokenId> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}
