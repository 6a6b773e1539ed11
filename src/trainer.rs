//! Vocabulary builder: learns ordered merge rules from a segmented corpus.
//!
//! Every training round merges the most frequent adjacent symbol pair.
//! Ties go to the pair whose first occurrence comes earliest in the current
//! corpus (earliest word, then earliest position inside it).
//!
//! Instead of recounting all pairs each round, the corpus is held as a
//! linked list over a node arena and pair statistics are patched around each
//! merged occurrence. A max-heap keyed on (frequency, first position) selects
//! the next pair; entries go stale as counts change and are discarded lazily.

use std::{
    cmp::Ordering,
    collections::{BTreeSet, BinaryHeap, HashMap},
    ops::ControlFlow,
};

use log::{debug, info, warn};

use crate::{
    error::{Error, Result},
    merges::MergeRule,
    progress,
    segmenter::WORD_MARKER,
    types::{PairFreq, Symbol, SymbolIdx, TextIdx},
};

/// Symbols that are always in a trained vocabulary, whether or not the corpus
/// contains them: printable ASCII, the word marker and a few currency signs.
pub fn base_charset() -> Vec<char> {
    let mut chars: Vec<char> = (0x20u8..=0x7E).map(char::from).collect();
    chars.push(WORD_MARKER);
    for c in ['₹', '€', '£', '$'] {
        if !chars.contains(&c) {
            chars.push(c);
        }
    }
    chars
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Learned {
    pub(crate) vocab: Vec<Symbol>,
    pub(crate) merges: Vec<MergeRule>,
}

/// Runs the merge loop over `words` until `|vocab| + |merges|` reaches
/// `target` or no adjacent pair is left.
///
/// A merge costs one slot for the rule plus one for its symbol when that
/// string is new; a merge that would overshoot `target` ends training.
///
/// # Errors
///
/// Returns [`Error::EmptyVocabulary`] if `words` holds no characters, or
/// [`Error::ProgressBarSetup`] if the progress bar template fails to compile.
pub(crate) fn learn(words: &[Vec<char>], target: usize, show_progress: bool) -> Result<Learned> {
    if words.iter().all(Vec::is_empty) {
        return Err(Error::EmptyVocabulary);
    }

    let mut trainer = BPETrainer::new(words);
    let seeded = trainer.symbols.len();
    if target <= seeded {
        warn!(
            "target vocab size {target} does not exceed the seeded vocabulary ({seeded}); no merges will be learned"
        );
    }

    let pb = progress::optional(
        show_progress,
        target.saturating_sub(seeded) as u64,
        "Learning merges",
    )?;

    let mut merges = Vec::new();
    while trainer.symbols.len() + merges.len() < target {
        let budget = target - trainer.symbols.len() - merges.len();
        let Some(rule) = trainer.merge_step(budget) else {
            debug!("training stopped after {} merges", merges.len());
            break;
        };
        merges.push(rule);
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "trained vocabulary: {} symbols, {} merges (target {target})",
        trainer.symbols.len(),
        merges.len()
    );

    Ok(Learned {
        vocab: trainer.symbols,
        merges,
    })
}

/// A pair of adjacent interned symbols.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
struct SymbolPair(SymbolIdx, SymbolIdx);

/// Node in the doubly-linked list representing one symbol of the corpus.
///
/// Links never cross word boundaries: the first symbol of a word has no
/// `prev_idx` and the last has no `next_idx`.
#[derive(Debug)]
struct Node {
    symbol: SymbolIdx,
    prev_idx: Option<TextIdx>,
    next_idx: Option<TextIdx>,
}

/// Item in the max heap.
///
/// Valid only while `freq` and `first_pos` still match the pair's live
/// statistics.
#[derive(Debug, PartialEq, Eq)]
struct HeapItem {
    freq: PairFreq,
    first_pos: TextIdx,
    pair: SymbolPair,
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Highest frequency on top; among equals the earliest first occurrence.
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.freq
            .cmp(&other.freq)
            .then_with(|| other.first_pos.cmp(&self.first_pos))
    }
}

/// BPE training structure.
///
/// Nodes live in a `Vec<Option<Node>>` arena: indices are stable, a deleted
/// node is `None`, and a merge keeps the left node's index. Index order is
/// therefore corpus order for the whole run, which is what makes the smallest
/// recorded position of a pair its first occurrence.
#[derive(Debug, Default)]
struct BPETrainer {
    nodes: Vec<Option<Node>>,

    /// Contains stale entries that need to be guarded against.
    heap: BinaryHeap<HeapItem>,

    /// pair -> positions of the left node of every occurrence.
    pair_positions: HashMap<SymbolPair, BTreeSet<TextIdx>>,

    /// Source of truth for pair frequencies.
    pair_freqs: HashMap<SymbolPair, PairFreq>,

    /// Interned symbols in vocabulary order.
    symbols: Vec<Symbol>,
    symbol_ids: HashMap<Symbol, SymbolIdx>,
}

impl BPETrainer {
    fn new(words: &[Vec<char>]) -> Self {
        let mut trainer = BPETrainer::default();

        for word in words {
            let start = trainer.nodes.len();
            let n = word.len();
            for (i, &c) in word.iter().enumerate() {
                let symbol = trainer.intern(c.to_string());
                trainer.nodes.push(Some(Node {
                    symbol,
                    prev_idx: (i > 0).then(|| start + i - 1),
                    next_idx: (i + 1 < n).then(|| start + i + 1),
                }));
            }
        }

        // base charset after corpus characters
        for c in base_charset() {
            trainer.intern(c.to_string());
        }

        trainer.build_initial_pairs();
        trainer
    }

    fn intern(&mut self, symbol: Symbol) -> SymbolIdx {
        if let Some(&idx) = self.symbol_ids.get(&symbol) {
            return idx;
        }
        let idx = self.symbols.len();
        self.symbol_ids.insert(symbol.clone(), idx);
        self.symbols.push(symbol);
        idx
    }

    /// Perform one merge operation if it fits in `budget` vocabulary slots.
    ///
    /// Returns the learned rule, or `None` if no pairs remain or the best
    /// merge does not fit.
    fn merge_step(&mut self, budget: usize) -> Option<MergeRule> {
        let (merge_pair, merge_freq) = self.get_max_pair()?;

        let rule = MergeRule::new(
            self.symbols[merge_pair.0].clone(),
            self.symbols[merge_pair.1].clone(),
        );
        let merged = rule.merged();
        let cost = if self.symbol_ids.contains_key(&merged) { 1 } else { 2 };
        if cost > budget {
            debug!("best merge needs {cost} slots, {budget} left");
            return None;
        }
        let new_symbol = self.intern(merged);

        debug!(
            "merging ({:?}, {:?}) x{merge_freq} -> symbol {new_symbol}",
            rule.left, rule.right
        );

        // ascending order gives left-to-right, non-overlapping rewrites
        let positions: Vec<TextIdx> = self
            .pair_positions
            .get(&merge_pair)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        for &pos in &positions {
            let (idx1, idx2) = match self.get_merge_idxs(merge_pair, pos) {
                ControlFlow::Continue(idxs) => idxs,
                ControlFlow::Break(()) => continue,
            };

            let cur_prev_idx = self.nodes[idx1].as_ref().and_then(|n| n.prev_idx);
            let new_next_idx = self.nodes[idx2].as_ref().and_then(|n| n.next_idx);

            self.remove_neighbours(merge_pair, idx1, idx2);
            self.merge_pair_in_list(new_next_idx, new_symbol, idx1, idx2);
            self.add_neighbours(new_symbol, idx1, cur_prev_idx, new_next_idx);
        }

        self.pair_freqs.remove(&merge_pair);
        self.pair_positions.remove(&merge_pair);

        Some(rule)
    }

    /// Build initial pair frequencies and positions in a single pass.
    fn build_initial_pairs(&mut self) {
        for idx in 0..self.nodes.len() {
            if let Some(node) = &self.nodes[idx]
                && let Some(next_idx) = node.next_idx
                && let Some(next_node) = &self.nodes[next_idx]
            {
                let pair = SymbolPair(node.symbol, next_node.symbol);
                *self.pair_freqs.entry(pair).or_insert(0) += 1;
                self.pair_positions.entry(pair).or_default().insert(idx);
            }
        }

        let pairs: Vec<SymbolPair> = self.pair_freqs.keys().copied().collect();
        for pair in pairs {
            self.push_live(pair);
        }
    }

    /// Pushes the pair's current statistics onto the heap.
    fn push_live(&mut self, pair: SymbolPair) {
        let freq = self.pair_freqs.get(&pair).copied().unwrap_or(0);
        let first = self
            .pair_positions
            .get(&pair)
            .and_then(|set| set.first().copied());
        if let Some(first_pos) = first
            && freq > 0
        {
            self.heap.push(HeapItem {
                freq,
                first_pos,
                pair,
            });
        }
    }

    /// Pop the best live (pair, freq), discarding stale heap entries.
    fn get_max_pair(&mut self) -> Option<(SymbolPair, PairFreq)> {
        while let Some(entry) = self.heap.pop() {
            let live_freq = self.pair_freqs.get(&entry.pair).copied();
            let live_first = self
                .pair_positions
                .get(&entry.pair)
                .and_then(|set| set.first().copied());
            if live_freq == Some(entry.freq) && live_first == Some(entry.first_pos) {
                return Some((entry.pair, entry.freq));
            }
        }
        None
    }

    /// Drop one occurrence of `pair` starting at `idx` from the statistics.
    /// The linked list itself is not modified.
    fn remove_pair_at(&mut self, idx: TextIdx, pair: SymbolPair) {
        let remaining = match self.pair_freqs.get_mut(&pair) {
            Some(freq) => {
                *freq = freq.saturating_sub(1);
                *freq
            }
            None => return,
        };
        if let Some(pos_set) = self.pair_positions.get_mut(&pair) {
            pos_set.remove(&idx);
        }

        if remaining == 0 {
            self.pair_freqs.remove(&pair);
            self.pair_positions.remove(&pair);
        } else {
            self.push_live(pair);
        }
    }

    /// Record one occurrence of `pair` starting at `idx`.
    /// The linked list itself is not modified.
    fn add_pair_at(&mut self, idx: TextIdx, pair: SymbolPair) {
        self.pair_positions.entry(pair).or_default().insert(idx);
        *self.pair_freqs.entry(pair).or_insert(0) += 1;
        self.push_live(pair);
    }

    fn add_neighbours(
        &mut self,
        new_symbol: SymbolIdx,
        idx1: TextIdx,
        cur_prev_idx: Option<TextIdx>,
        new_next_idx: Option<TextIdx>,
    ) {
        if let Some(prev_idx) = cur_prev_idx
            && let Some(prev_node) = &self.nodes[prev_idx]
        {
            let new_pair = SymbolPair(prev_node.symbol, new_symbol);
            self.add_pair_at(prev_idx, new_pair);
        }

        if let Some(next_idx) = new_next_idx
            && let Some(next_node) = &self.nodes[next_idx]
        {
            let new_pair = SymbolPair(new_symbol, next_node.symbol);
            self.add_pair_at(idx1, new_pair);
        }
    }

    fn merge_pair_in_list(
        &mut self,
        next_idx: Option<TextIdx>,
        symbol: SymbolIdx,
        idx1: TextIdx,
        idx2: TextIdx,
    ) {
        if let Some(node) = &mut self.nodes[idx1] {
            node.symbol = symbol;
            node.next_idx = next_idx;
        }

        if let Some(new_right_idx) = next_idx
            && let Some(new_right_node) = &mut self.nodes[new_right_idx]
        {
            new_right_node.prev_idx = Some(idx1);
        }

        self.nodes[idx2] = None;
    }

    /// Retire the pairs that straddle the left and right edges of a merge.
    fn remove_neighbours(&mut self, merge_pair: SymbolPair, idx1: TextIdx, idx2: TextIdx) {
        if let Some(prev_idx) = self.nodes[idx1].as_ref().and_then(|n| n.prev_idx)
            && let Some(prev_node) = &self.nodes[prev_idx]
        {
            let old_pair = SymbolPair(prev_node.symbol, merge_pair.0);
            self.remove_pair_at(prev_idx, old_pair);
        }

        if let Some(next_idx) = self.nodes[idx2].as_ref().and_then(|n| n.next_idx)
            && let Some(next_node) = &self.nodes[next_idx]
        {
            let old_pair = SymbolPair(merge_pair.1, next_node.symbol);
            self.remove_pair_at(idx2, old_pair);
        }
    }

    /// Extracts and verifies the indices of the two nodes holding `pair`
    /// at `self.nodes[pos]`.
    fn get_merge_idxs(&self, pair: SymbolPair, pos: TextIdx) -> ControlFlow<(), (TextIdx, TextIdx)> {
        let Some(node1) = &self.nodes[pos] else {
            // consumed by an earlier overlapping occurrence
            return ControlFlow::Break(());
        };
        let Some(idx2) = node1.next_idx else {
            return ControlFlow::Break(());
        };

        match &self.nodes[idx2] {
            Some(node2) if node1.symbol == pair.0 && node2.symbol == pair.1 => {
                ControlFlow::Continue((pos, idx2))
            }
            _ => ControlFlow::Break(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<Vec<char>> {
        ws.iter().map(|w| w.chars().collect()).collect()
    }

    fn pairs(merges: &[MergeRule]) -> Vec<(&str, &str)> {
        merges
            .iter()
            .map(|m| (m.left.as_str(), m.right.as_str()))
            .collect()
    }

    /// Reference trainer: full recount each round, first-occurrence tie-break.
    fn naive_merges(ws: &[&str], rounds: usize) -> Vec<(String, String)> {
        let mut corpus: Vec<Vec<String>> = ws
            .iter()
            .map(|w| w.chars().map(String::from).collect())
            .collect();
        let mut out = Vec::new();
        for _ in 0..rounds {
            let mut order: Vec<(String, String)> = Vec::new();
            let mut counts: HashMap<(String, String), usize> = HashMap::new();
            for w in &corpus {
                for p in w.windows(2) {
                    let key = (p[0].clone(), p[1].clone());
                    if !counts.contains_key(&key) {
                        order.push(key.clone());
                    }
                    *counts.entry(key).or_insert(0) += 1;
                }
            }
            let mut best: Option<((String, String), usize)> = None;
            for key in order {
                let c = counts[&key];
                if best.as_ref().is_none_or(|(_, bc)| c > *bc) {
                    best = Some((key, c));
                }
            }
            let Some(((a, b), _)) = best else { break };
            for w in corpus.iter_mut() {
                let mut merged = Vec::new();
                let mut i = 0;
                while i < w.len() {
                    if i + 1 < w.len() && w[i] == a && w[i + 1] == b {
                        merged.push(format!("{a}{b}"));
                        i += 2;
                    } else {
                        merged.push(w[i].clone());
                        i += 1;
                    }
                }
                *w = merged;
            }
            out.push((a, b));
        }
        out
    }

    #[test]
    fn test_base_charset_contents() {
        let base = base_charset();
        assert_eq!(base.len(), 95 + 1 + 3);
        assert_eq!(base[0], ' ');
        assert!(base.contains(&'~'));
        assert!(base.contains(&WORD_MARKER));
        assert!(base.contains(&'₹'));
        assert_eq!(base.iter().filter(|&&c| c == '$').count(), 1);
    }

    #[test]
    fn test_empty_corpus_errors() {
        assert!(matches!(learn(&[], 500, false), Err(Error::EmptyVocabulary)));
        assert!(matches!(
            learn(&[Vec::new()], 500, false),
            Err(Error::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_corpus_chars_come_first() {
        let learned = learn(&words(&["▁zé"]), 0, false).expect("training should succeed");
        assert_eq!(&learned.vocab[..3], &["▁", "z", "é"]);
        assert_eq!(learned.vocab[3], " ");
        assert!(learned.merges.is_empty());
    }

    #[test]
    fn test_degenerate_target_converges_at_floor() {
        let learned = learn(&words(&["▁abab"]), 10, false).expect("training should succeed");
        assert!(learned.merges.is_empty());
        assert_eq!(learned.vocab.len(), base_charset().len());
    }

    #[test]
    fn test_highest_frequency_pair_first() {
        let floor = base_charset().len();
        let learned = learn(&words(&["abab", "ab", "cd"]), floor + 2, false)
            .expect("training should succeed");
        assert_eq!(pairs(&learned.merges), vec![("a", "b")]);
        assert!(learned.vocab.contains(&"ab".to_string()));
    }

    #[test]
    fn test_tie_broken_by_first_occurrence() {
        let floor = base_charset().len();
        // "xy" and "cd" both occur twice; "cd" appears first
        let learned = learn(&words(&["cd", "xy", "xy", "cd"]), floor + 2, false)
            .expect("training should succeed");
        assert_eq!(pairs(&learned.merges), vec![("c", "d")]);
    }

    #[test]
    fn test_overlapping_pair_rewrites_left_to_right() {
        let floor = base_charset().len();
        let learned =
            learn(&words(&["aaaaa"]), floor + 10, false).expect("training should succeed");
        // aaaaa -> aa aa a -> aaaa a -> aaaaa
        assert_eq!(
            pairs(&learned.merges),
            vec![("a", "a"), ("aa", "aa"), ("aaaa", "a")]
        );
    }

    #[test]
    fn test_merge_that_would_overshoot_is_not_taken() {
        let floor = base_charset().len();
        let learned = learn(&words(&["abab"]), floor + 1, false).expect("training should succeed");
        assert!(learned.merges.is_empty());
        assert_eq!(learned.vocab.len(), floor);
    }

    #[test]
    fn test_pairs_do_not_cross_words() {
        let floor = base_charset().len();
        let learned = learn(&words(&["a", "b", "a", "b"]), floor + 5, false)
            .expect("training should succeed");
        assert!(learned.merges.is_empty());
    }

    #[test]
    fn test_budget_respected() {
        let floor = base_charset().len();
        let corpus = words(&["▁lowest", "▁lower", "▁newest", "▁widest", "▁low"]);
        for extra in 0..12 {
            let target = floor + 5 + extra;
            let learned = learn(&corpus, target, false).expect("training should succeed");
            assert!(learned.vocab.len() + learned.merges.len() <= target);
        }
    }

    #[test]
    fn test_matches_naive_trainer() {
        let ws = [
            "▁Manoj",
            "▁lives",
            "▁in",
            "▁Maharashtra.",
            "▁Manoj",
            "▁codes",
            "▁a",
            "▁lot.",
            "▁Maharashtra",
            "▁is",
            "▁big.",
        ];
        let learned = learn(&words(&ws), 10_000, false).expect("training should succeed");
        let expected = naive_merges(&ws, 10_000);
        let got: Vec<(String, String)> = learned
            .merges
            .iter()
            .map(|m| (m.left.clone(), m.right.clone()))
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_deterministic() {
        let corpus = words(&["▁the", "▁then", "▁there", "▁other", "▁the"]);
        let a = learn(&corpus, 130, false).expect("training should succeed");
        let b = learn(&corpus, 130, false).expect("training should succeed");
        assert_eq!(a, b);
    }
}
