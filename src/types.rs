//! Type aliases and shared types for BPE training and encoding.
//!
//! These type aliases provide semantic clarity throughout the codebase.

/// Represents a token identifier in the vocabulary.
///
/// Ids are dense and assigned in vocabulary insertion order: characters and
/// learned subwords first, then any special token not already present.
pub type TokenId = usize;

/// An atomic vocabulary unit: a character, a merged subword or a special literal.
pub type Symbol = String;

/// Index of an interned symbol inside the trainer's symbol table.
pub(crate) type SymbolIdx = usize;

/// Position of a node in the flattened training corpus.
///
/// Used to index into the doubly-linked list structure during training.
pub(crate) type TextIdx = usize;

/// Frequency count for symbol pairs during training.
pub(crate) type PairFreq = usize;

/// Merge order indicates when a merge rule was learned during training.
///
/// Lower values represent earlier merges (e.g., 0 = first merge, 1 = second merge).
pub(crate) type MergeOrder = usize;
