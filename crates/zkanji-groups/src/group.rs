//! Leaf groups: ordered, duplicate-free lists of dictionary entry indices.
//!
//! A [`Group`] is read through shared references. Changes go through
//! [`GroupMut`](crate::GroupMut), obtained from the owning tree, so that the
//! tree can keep its reverse index in step and announce every change.

use std::collections::HashMap;

use crate::kind::{GroupKind, Kanji, Words};
use crate::tree::CategoryId;

/// A named list of entry indices.
///
/// Order is the user's display order. An index appears at most once.
#[derive(Debug, Clone)]
pub struct Group<K: GroupKind> {
    pub(crate) name: String,
    pub(crate) parent: CategoryId,
    pub(crate) list: Vec<K::Index>,
}

/// A group of word indices.
pub type WordGroup = Group<Words>;

/// A group of kanji indices.
pub type KanjiGroup = Group<Kanji>;

impl<K: GroupKind> Group<K> {
    pub(crate) fn new(name: String, parent: CategoryId) -> Self {
        Self {
            name,
            parent,
            list: Vec::new(),
        }
    }

    /// The group's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The category directly holding this group.
    pub fn parent(&self) -> CategoryId {
        self.parent
    }

    /// The entry indices in display order.
    pub fn indexes(&self) -> &[K::Index] {
        &self.list
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` when the group holds no entries.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns `true` if `value` is in the group.
    pub fn contains(&self, value: K::Index) -> bool {
        self.list.contains(&value)
    }

    /// Position of `value` in the group.
    pub fn index_of(&self, value: K::Index) -> Option<usize> {
        self.list.iter().position(|&v| v == value)
    }

    /// Positions of those `values` that are in the group, in ascending order.
    ///
    /// Values not in the group are skipped. Duplicates in `values` produce a
    /// single position.
    pub fn index_of_many(&self, values: &[K::Index]) -> Vec<usize> {
        let lookup = self.position_map();
        let mut positions: Vec<usize> = values
            .iter()
            .filter_map(|v| lookup.get(v).copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    pub(crate) fn position_map(&self) -> HashMap<K::Index, usize> {
        self.list
            .iter()
            .enumerate()
            .map(|(pos, &v)| (v, pos))
            .collect()
    }
}

/// Result of a batch insertion into a group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InsertOutcome {
    /// How many entries were new to the group.
    pub added: usize,
    /// Final position of every requested entry, one per input value,
    /// sorted ascending. Entries already in the group report where they
    /// stand after the insertion; repeated inputs repeat their position.
    pub positions: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(values: &[i32]) -> WordGroup {
        let mut group = WordGroup::new("test".into(), CategoryId::default());
        group.list = values.to_vec();
        group
    }

    #[test]
    fn test_index_of() {
        let g = group(&[9, 4, 7]);
        assert_eq!(g.index_of(4), Some(1));
        assert_eq!(g.index_of(5), None);
        assert!(g.contains(7));
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn test_index_of_many_sorted_and_skips_missing() {
        let g = group(&[9, 4, 7, 2]);
        assert_eq!(g.index_of_many(&[2, 100, 9, 7, 9]), vec![0, 2, 3]);
        assert!(g.index_of_many(&[]).is_empty());
    }
}
