//! Merge rules and the rank-based applier used at encode time.
//!
//! The applier repeatedly merges the adjacent pair whose rule was learned
//! earliest, leftmost first on equal rank. Rather than rescanning the word
//! after every merge it keeps a min-heap of candidates and discards stale
//! entries when they surface, which yields the same merge sequence.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use serde::{Deserialize, Serialize};

use crate::types::{MergeOrder, Symbol};

/// A learned merge: `left` followed by `right` becomes `left + right`.
///
/// Serialized as a two-element array, matching the persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[Symbol; 2]", into = "[Symbol; 2]")]
pub struct MergeRule {
    pub left: Symbol,
    pub right: Symbol,
}

impl MergeRule {
    pub fn new(left: impl Into<Symbol>, right: impl Into<Symbol>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// The symbol produced by this merge.
    pub fn merged(&self) -> Symbol {
        let mut s = String::with_capacity(self.left.len() + self.right.len());
        s.push_str(&self.left);
        s.push_str(&self.right);
        s
    }
}

impl From<[Symbol; 2]> for MergeRule {
    fn from([left, right]: [Symbol; 2]) -> Self {
        Self { left, right }
    }
}

impl From<MergeRule> for [Symbol; 2] {
    fn from(rule: MergeRule) -> Self {
        [rule.left, rule.right]
    }
}

/// Item in the priority queue for merge ordering.
///
/// Candidates are ordered by merge order (earliest first) with position
/// as a tiebreaker.
#[derive(Debug, PartialEq, Eq)]
struct MergeCandidate {
    merge_order: MergeOrder,
    /// Slot of the left symbol of the pair.
    position: usize,
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed to get min-heap behaviour out of BinaryHeap
        other
            .merge_order
            .cmp(&self.merge_order)
            .then_with(|| other.position.cmp(&self.position))
    }
}

/// Index from `(left, right)` to the position of that rule in the merge list.
///
/// Derived from the merges on construction and never persisted.
#[derive(Debug, Clone, Default)]
pub struct RankTable {
    ranks: HashMap<Symbol, HashMap<Symbol, MergeOrder>>,
    len: usize,
}

impl RankTable {
    /// Builds the table. If a pair is listed twice the earlier rank is kept.
    pub fn new<'a>(merges: impl IntoIterator<Item = &'a MergeRule>) -> Self {
        let mut ranks: HashMap<Symbol, HashMap<Symbol, MergeOrder>> = HashMap::new();
        let mut len = 0;
        for (order, rule) in merges.into_iter().enumerate() {
            let slot = ranks.entry(rule.left.clone()).or_default();
            if !slot.contains_key(&rule.right) {
                slot.insert(rule.right.clone(), order);
                len += 1;
            }
        }
        Self { ranks, len }
    }

    /// Returns the rank of `(left, right)`, if such a merge was learned.
    pub fn rank(&self, left: &str, right: &str) -> Option<MergeOrder> {
        self.ranks.get(left)?.get(right).copied()
    }

    /// Number of distinct ranked pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Applies the ranked merges to one word's symbol sequence.
    ///
    /// # Example
    ///
    /// ```
    /// use bpe_playground::{MergeRule, RankTable};
    ///
    /// let merges = vec![MergeRule::new("a", "b"), MergeRule::new("ab", "c")];
    /// let table = RankTable::new(&merges);
    /// assert_eq!(table.apply(vec!["a".into(), "b".into(), "c".into()]), vec!["abc"]);
    /// ```
    pub fn apply(&self, symbols: Vec<Symbol>) -> Vec<Symbol> {
        if symbols.len() < 2 || self.is_empty() {
            return symbols;
        }

        let mut heap = BinaryHeap::new();
        // slots[i] = None once the symbol was absorbed by its left neighbour
        let mut slots: Vec<Option<Symbol>> = symbols.into_iter().map(Some).collect();

        for i in 0..slots.len() - 1 {
            self.push_candidate(&mut heap, &slots, i, i + 1);
        }

        while let Some(candidate) = heap.pop() {
            let pos = candidate.position;
            let Some(right_idx) = next_live(&slots, pos) else {
                continue;
            };

            // the pair at pos may have changed since the candidate was pushed
            let live_order = match (&slots[pos], &slots[right_idx]) {
                (Some(left), Some(right)) => self.rank(left, right),
                _ => None,
            };
            if live_order != Some(candidate.merge_order) {
                continue;
            }

            let right = slots[right_idx].take().unwrap_or_default();
            if let Some(left) = slots[pos].as_mut() {
                left.push_str(&right);
            }

            if let Some(prev) = prev_live(&slots, pos) {
                self.push_candidate(&mut heap, &slots, prev, pos);
            }
            if let Some(next) = next_live(&slots, pos) {
                self.push_candidate(&mut heap, &slots, pos, next);
            }
        }

        slots.into_iter().flatten().collect()
    }

    fn push_candidate(
        &self,
        heap: &mut BinaryHeap<MergeCandidate>,
        slots: &[Option<Symbol>],
        left_idx: usize,
        right_idx: usize,
    ) {
        if let (Some(Some(left)), Some(Some(right))) = (slots.get(left_idx), slots.get(right_idx))
            && let Some(merge_order) = self.rank(left, right)
        {
            heap.push(MergeCandidate {
                merge_order,
                position: left_idx,
            });
        }
    }
}

fn next_live(slots: &[Option<Symbol>], pos: usize) -> Option<usize> {
    if slots.get(pos)?.is_none() {
        return None;
    }
    (pos + 1..slots.len()).find(|&i| slots[i].is_some())
}

fn prev_live(slots: &[Option<Symbol>], pos: usize) -> Option<usize> {
    (0..pos).rev().find(|&i| slots[i].is_some())
}
