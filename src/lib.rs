//! Word-marker BPE tokenizer.
//!
//! Training segments a corpus into whitespace-delimited words, marks the
//! start of each word with `▁`, and learns merge rules by repeatedly merging
//! the most frequent adjacent symbol pair. Encoding applies those rules in
//! the order they were learned, keeping declared special tokens atomic;
//! decoding maps ids back to symbols and restores spacing.
//!
//! ```no_run
//! use bpe_playground::{TrainConfig, Tokenizer};
//!
//! # fn main() -> bpe_playground::Result<()> {
//! let cfg = TrainConfig::new(300).with_specials(["<NAME>", "<CITY>"]);
//! let tok = Tokenizer::train("Manoj lives in Maharashtra.", &cfg)?;
//! let enc = tok.encode("My name is <NAME> from <CITY>.");
//! assert_eq!(tok.decode(&enc.ids), "My name is <NAME> from <CITY>.");
//! tok.save("custom_tokenizer.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! Python bindings are available behind the `python` feature.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]

pub mod codec;
pub mod config;
pub mod error;
pub mod handle;
pub mod merges;
pub mod persistence;
pub mod segmenter;
pub mod tokenizer;
pub mod types;

mod progress;
mod trainer;

#[cfg(feature = "python")]
mod python;

pub use codec::Codec;
pub use config::{DEFAULT_VOCAB_SIZE, TrainConfig};
pub use error::{Error, Result};
pub use handle::SharedTokenizer;
pub use merges::{MergeRule, RankTable};
pub use persistence::TokenizerDocument;
pub use segmenter::WORD_MARKER;
pub use tokenizer::{Encoding, EncodingStats, Tokenizer, TokenizerStats, parse_token_ids};
pub use trainer::base_charset;
pub use types::{Symbol, TokenId};
