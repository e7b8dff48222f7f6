//! The per-dictionary aggregate of the word and kanji trees.

use crate::config::GroupSettings;
use crate::kind::{GroupKind, GroupType};
use crate::tree::{GroupId, GroupTree};
use crate::words::{KanjiGroups, WordGroups};

/// What the group trees need to know about their dictionary.
pub trait Dictionary {
    /// Number of words. Valid word indices are `0..word_count()`.
    fn word_count(&self) -> usize;

    /// Number of kanji. Valid kanji indices are `0..kanji_count()`.
    fn kanji_count(&self) -> usize;
}

/// Shared access to either root of a [`Groups`].
#[derive(Debug, Clone, Copy)]
pub enum GroupRootRef<'a> {
    /// The word tree.
    Words(&'a WordGroups),
    /// The kanji tree.
    Kanji(&'a KanjiGroups),
}

impl GroupRootRef<'_> {
    /// Which tree this is.
    pub fn group_type(&self) -> GroupType {
        match self {
            Self::Words(_) => GroupType::Words,
            Self::Kanji(_) => GroupType::Kanji,
        }
    }

    /// Number of groups in the tree.
    pub fn group_count(&self) -> usize {
        match self {
            Self::Words(tree) => tree.group_count(),
            Self::Kanji(tree) => tree.group_count(),
        }
    }

    /// Number of categories below the root.
    pub fn category_count(&self) -> usize {
        match self {
            Self::Words(tree) => tree.category_count(),
            Self::Kanji(tree) => tree.category_count(),
        }
    }
}

/// Exclusive access to either root of a [`Groups`].
#[derive(Debug)]
pub enum GroupRootMut<'a> {
    /// The word tree.
    Words(&'a mut WordGroups),
    /// The kanji tree.
    Kanji(&'a mut KanjiGroups),
}

impl GroupRootMut<'_> {
    /// Which tree this is.
    pub fn group_type(&self) -> GroupType {
        match self {
            Self::Words(_) => GroupType::Words,
            Self::Kanji(_) => GroupType::Kanji,
        }
    }

    /// Removes every category and group from the tree.
    pub fn clear(&mut self) {
        match self {
            Self::Words(tree) => tree.clear(),
            Self::Kanji(tree) => tree.clear(),
        }
    }
}

/// A dictionary's word groups and kanji groups.
#[derive(Debug, Default)]
pub struct Groups {
    words: WordGroups,
    kanji: KanjiGroups,
}

impl Groups {
    /// Creates empty word and kanji trees.
    pub fn new() -> Self {
        Self::default()
    }

    /// The word tree.
    pub fn words(&self) -> &WordGroups {
        &self.words
    }

    /// The word tree, mutably.
    pub fn words_mut(&mut self) -> &mut WordGroups {
        &mut self.words
    }

    /// The kanji tree.
    pub fn kanji(&self) -> &KanjiGroups {
        &self.kanji
    }

    /// The kanji tree, mutably.
    pub fn kanji_mut(&mut self) -> &mut KanjiGroups {
        &mut self.kanji
    }

    /// The tree of the given type.
    pub fn root(&self, group_type: GroupType) -> GroupRootRef<'_> {
        match group_type {
            GroupType::Words => GroupRootRef::Words(&self.words),
            GroupType::Kanji => GroupRootRef::Kanji(&self.kanji),
        }
    }

    /// The tree of the given type, mutably.
    pub fn root_mut(&mut self, group_type: GroupType) -> GroupRootMut<'_> {
        match group_type {
            GroupType::Words => GroupRootMut::Words(&mut self.words),
            GroupType::Kanji => GroupRootMut::Kanji(&mut self.kanji),
        }
    }

    /// Empties both trees.
    pub fn clear(&mut self) {
        self.words.clear();
        self.kanji.clear();
    }

    /// Replaces both trees with copies of `other`'s.
    pub fn copy_from(&mut self, other: &Groups) {
        self.words.copy_from(&other.words);
        self.kanji.copy_from(&other.kanji);
    }

    /// Applies user settings to both trees.
    pub fn apply_settings(&mut self, settings: &GroupSettings) {
        self.words.set_remember_last(settings.remember_last);
        self.kanji.set_remember_last(settings.remember_last);
    }

    /// Drops every stored index the dictionary does not have. Returns how
    /// many were dropped.
    pub fn validate(&mut self, dictionary: &dyn Dictionary) -> usize {
        let dropped = drop_invalid(&mut self.words, dictionary.word_count())
            + drop_invalid(&mut self.kanji, dictionary.kanji_count());
        if dropped > 0 {
            self.words.fix_words_groups();
        }
        dropped
    }
}

fn drop_invalid<K: GroupKind>(tree: &mut GroupTree<K>, count: usize) -> usize {
    let is_valid = |v: K::Index| K::position(v).is_some_and(|pos| pos < count);
    let bad: Vec<(GroupId, Vec<K::Index>)> = tree
        .groups_iter()
        .filter_map(|(id, g)| {
            let invalid: Vec<K::Index> =
                g.indexes().iter().copied().filter(|v| !is_valid(*v)).collect();
            (!invalid.is_empty()).then_some((id, invalid))
        })
        .collect();

    let mut dropped = 0;
    for (id, values) in bad {
        let name = tree.full_encoded_name(id.into()).unwrap_or_default();
        tracing::warn!(
            target: "zkanji_groups::tree",
            kind = %K::TYPE,
            group = %name,
            count = values.len(),
            "dropping indices missing from the dictionary"
        );
        if let Some(mut group) = tree.group_mut(id) {
            match group.remove_values(&values) {
                Ok(n) => dropped += n,
                Err(err) => tracing::warn!(
                    target: "zkanji_groups::tree",
                    %err,
                    "failed to drop indices"
                ),
            }
        }
    }
    dropped
}
