//! Operations that only make sense for one kind of tree.
//!
//! Word trees keep a reverse index from word to the groups holding it, and
//! follow the dictionary when words are removed or renumbered. Kanji trees
//! keep no index and answer membership by scanning.

use std::collections::{HashMap, HashSet};

use crate::kind::{Kanji, Words};
use crate::tree::{GroupId, GroupTree};

/// The word group tree of a dictionary.
pub type WordGroups = GroupTree<Words>;

/// The kanji group tree of a dictionary.
pub type KanjiGroups = GroupTree<Kanji>;

impl GroupTree<Words> {
    /// Groups holding word `windex`.
    ///
    /// Creates an empty entry for the word when it has none yet. Prefer
    /// [`word_groups`](Self::word_groups) or
    /// [`word_has_groups`](Self::word_has_groups) for plain queries.
    pub fn groups_of_word(&mut self, windex: i32) -> &[GroupId] {
        self.reverse.entry(windex).or_default()
    }

    /// Groups holding word `windex`, without side effects.
    pub fn word_groups(&self, windex: i32) -> &[GroupId] {
        self.reverse.get(&windex).map_or(&[][..], Vec::as_slice)
    }

    /// Returns `true` if any group holds word `windex`.
    pub fn word_has_groups(&self, windex: i32) -> bool {
        self.reverse.get(&windex).is_some_and(|groups| !groups.is_empty())
    }

    /// Rebuilds the word-to-groups index from the group lists.
    pub fn fix_words_groups(&mut self) {
        self.rebuild_reverse_index();
        tracing::debug!(
            target: "zkanji_groups::tree",
            words = self.reverse.len(),
            "word index rebuilt"
        );
    }

    /// Follows the removal of word `windex` from the dictionary.
    ///
    /// The word is dropped from every group holding it and every stored
    /// index above it moves down by one.
    pub fn process_removed_word(&mut self, windex: i32) {
        let holders: Vec<GroupId> = self.word_groups(windex).to_vec();
        for id in holders {
            if let Some(mut group) = self.group_mut(id) {
                if let Err(err) = group.remove_values(&[windex]) {
                    tracing::warn!(
                        target: "zkanji_groups::tree",
                        %err,
                        windex,
                        "failed to drop removed word"
                    );
                }
            }
        }

        let ids: Vec<GroupId> = self
            .groups_iter()
            .filter(|(_, g)| g.indexes().iter().any(|&w| w > windex))
            .map(|(id, _)| id)
            .collect();
        for id in &ids {
            if let Some(mut group) = self.group_mut(*id) {
                let list = group
                    .group()
                    .indexes()
                    .iter()
                    .map(|&w| if w > windex { w - 1 } else { w })
                    .collect();
                group.replace_list(list);
            }
        }

        self.rebuild_reverse_index();
        tracing::debug!(
            target: "zkanji_groups::tree",
            windex,
            renumbered = ids.len(),
            "removed word processed"
        );
    }

    /// Renumbers words after the dictionary changed.
    ///
    /// `changes` maps old indices to new ones. A negative new index means the
    /// word is gone and is dropped from its groups. Indices not in the map are
    /// unchanged. A group whose list changes is announced with
    /// `items_changed`.
    pub fn apply_changes(&mut self, changes: &HashMap<i32, i32>) {
        if changes.is_empty() {
            return;
        }

        let affected: Vec<GroupId> = self
            .groups_iter()
            .filter(|(_, g)| g.indexes().iter().any(|w| changes.contains_key(w)))
            .map(|(id, _)| id)
            .collect();
        for id in &affected {
            if let Some(mut group) = self.group_mut(*id) {
                let mut seen = HashSet::new();
                let list = group
                    .group()
                    .indexes()
                    .iter()
                    .map(|w| changes.get(w).copied().unwrap_or(*w))
                    .filter(|&w| w >= 0 && seen.insert(w))
                    .collect();
                group.replace_list(list);
            }
        }

        self.rebuild_reverse_index();
        tracing::debug!(
            target: "zkanji_groups::tree",
            changed = affected.len(),
            "word changes applied"
        );
    }
}

impl GroupTree<Kanji> {
    /// Returns `true` if any group holds kanji `kindex`.
    pub fn kanji_has_groups(&self, kindex: u16) -> bool {
        self.groups_iter().any(|(_, g)| g.contains(kindex))
    }

    /// Groups holding kanji `kindex`, in walk order.
    pub fn kanji_groups(&self, kindex: u16) -> Vec<GroupId> {
        let mut found = Vec::new();
        self.walk_groups(self.root(), |id, g| {
            if g.contains(kindex) {
                found.push(id);
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_groups(lists: &[&[i32]]) -> (WordGroups, Vec<GroupId>) {
        let mut tree = WordGroups::new();
        let root = tree.root();
        let mut ids = Vec::new();
        for (n, list) in lists.iter().enumerate() {
            let index = tree.add_group(root, &format!("G{n}")).unwrap();
            let id = tree.group_at(root, index).unwrap();
            tree.group_mut(id).unwrap().add_many(list);
            ids.push(id);
        }
        (tree, ids)
    }

    #[test]
    fn test_reverse_index_follows_items() {
        let (mut tree, ids) = tree_with_groups(&[&[1, 2], &[2, 3]]);
        assert_eq!(tree.word_groups(2), &[ids[0], ids[1]]);
        assert!(tree.word_has_groups(1));
        assert!(!tree.word_has_groups(9));

        tree.group_mut(ids[0]).unwrap().remove_values(&[2]).unwrap();
        assert_eq!(tree.word_groups(2), &[ids[1]]);

        tree.delete_group(tree.root(), 1).unwrap();
        assert!(!tree.word_has_groups(2));
        assert!(!tree.word_has_groups(3));
    }

    #[test]
    fn test_groups_of_word_creates_empty_entry() {
        let (mut tree, _) = tree_with_groups(&[&[1]]);
        assert!(tree.groups_of_word(40).is_empty());
        assert!(tree.reverse.contains_key(&40));
        assert!(!tree.word_has_groups(40));
    }

    #[test]
    fn test_process_removed_word() {
        let (mut tree, ids) = tree_with_groups(&[&[3, 1, 4, 5], &[9, 2]]);
        tree.process_removed_word(4);

        assert_eq!(tree.group(ids[0]).unwrap().indexes(), &[3, 1, 4]);
        assert_eq!(tree.group(ids[1]).unwrap().indexes(), &[8, 2]);
        assert_eq!(tree.word_groups(4), &[ids[0]]);
        assert!(!tree.word_has_groups(5));
        assert!(!tree.word_has_groups(9));
        assert!(tree.word_has_groups(8));
    }

    #[test]
    fn test_apply_changes() {
        let (mut tree, ids) = tree_with_groups(&[&[1, 2, 3]]);
        let changes = HashMap::from([(1, 3), (2, -1), (3, 7)]);
        tree.apply_changes(&changes);

        assert_eq!(tree.group(ids[0]).unwrap().indexes(), &[3, 7]);
        assert!(!tree.word_has_groups(1));
        assert!(tree.word_has_groups(7));
    }

    #[test]
    fn test_apply_changes_merges_collisions() {
        let (mut tree, ids) = tree_with_groups(&[&[1, 2]]);
        tree.apply_changes(&HashMap::from([(2, 1)]));
        assert_eq!(tree.group(ids[0]).unwrap().indexes(), &[1]);
    }

    #[test]
    fn test_kanji_membership() {
        let mut tree = KanjiGroups::new();
        let root = tree.root();
        tree.add_group(root, "Radicals").unwrap();
        let id = tree.group_at(root, 0).unwrap();
        tree.group_mut(id).unwrap().add(120);

        assert!(tree.kanji_has_groups(120));
        assert!(!tree.kanji_has_groups(121));
        assert_eq!(tree.kanji_groups(120), vec![id]);
    }
}
