//! Change notifications emitted by a group tree.
//!
//! Every structural signal names the *direct* parent category and the index
//! of the affected child within that parent at the time of the event:
//! pre-removal indices for deletions, post-insertion indices for additions.
//! Move destinations are given in coordinates before the moved items are
//! taken out, so a forward move within one parent ends up one slot earlier
//! than its destination (see [`zkanji_core::range::adjusted_destination`]).
//!
//! Mutators emit their signals synchronously and in a fixed order:
//! `*_about_to_*` before the change, the change itself, then the past-tense
//! signal. Handlers receive event data only; they cannot reach back into the
//! tree while it is being changed.

use zkanji_core::{Interval, Range, Signal};

use crate::tree::{CategoryId, GroupId};

/// Collection of signals emitted by a [`GroupTree`](crate::GroupTree).
pub struct GroupSignals {
    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------
    /// A category was appended.
    /// Args: (parent, index, new category)
    pub category_added: Signal<(CategoryId, usize, CategoryId)>,

    /// A category and its subtree are about to be deleted.
    /// Args: (parent, index, category)
    pub category_about_to_be_deleted: Signal<(CategoryId, usize, CategoryId)>,

    /// A category and its subtree were deleted.
    /// Args: (parent, index it had, category id that is now stale)
    pub category_deleted: Signal<(CategoryId, usize, CategoryId)>,

    /// A category was renamed.
    /// Args: (parent, index)
    pub category_renamed: Signal<(CategoryId, usize)>,

    /// A single category is about to move.
    /// Args: (source parent, source index, destination parent, destination index, category)
    pub category_about_to_move: Signal<(CategoryId, usize, CategoryId, usize, CategoryId)>,

    /// A single category moved.
    /// Args: (source parent, source index, destination parent, destination index, category)
    pub category_moved: Signal<(CategoryId, usize, CategoryId, usize, CategoryId)>,

    /// Several categories of one parent are about to move together.
    /// Args: (source parent, source ranges, destination parent, destination index, categories)
    pub categories_about_to_move:
        Signal<(CategoryId, Vec<Range>, CategoryId, usize, Vec<CategoryId>)>,

    /// Several categories of one parent moved together.
    /// Args: (source parent, source ranges, destination parent, destination index, categories)
    pub categories_moved: Signal<(CategoryId, Vec<Range>, CategoryId, usize, Vec<CategoryId>)>,

    // -------------------------------------------------------------------------
    // Groups
    // -------------------------------------------------------------------------
    /// A group was appended.
    /// Args: (parent, index, new group)
    pub group_added: Signal<(CategoryId, usize, GroupId)>,

    /// A group is about to be deleted.
    ///
    /// The parent is `None` when the group goes away because a category
    /// above it is being deleted; the index is then its index within its own
    /// (also disappearing) parent.
    /// Args: (parent, index, group)
    pub group_about_to_be_deleted: Signal<(Option<CategoryId>, usize, GroupId)>,

    /// A group was deleted. Same arguments as `group_about_to_be_deleted`.
    pub group_deleted: Signal<(Option<CategoryId>, usize, GroupId)>,

    /// A group was renamed.
    /// Args: (parent, index)
    pub group_renamed: Signal<(CategoryId, usize)>,

    /// A single group is about to move.
    /// Args: (source parent, source index, destination parent, destination index, group)
    pub group_about_to_move: Signal<(CategoryId, usize, CategoryId, usize, GroupId)>,

    /// A single group moved.
    pub group_moved: Signal<(CategoryId, usize, CategoryId, usize, GroupId)>,

    /// Several groups of one parent are about to move together.
    pub groups_about_to_move: Signal<(CategoryId, Vec<Range>, CategoryId, usize, Vec<GroupId>)>,

    /// Several groups of one parent moved together.
    pub groups_moved: Signal<(CategoryId, Vec<Range>, CategoryId, usize, Vec<GroupId>)>,

    // -------------------------------------------------------------------------
    // Group items
    // -------------------------------------------------------------------------
    /// Entries are about to be inserted into a group.
    /// Args: (group, positions they will occupy)
    pub items_about_to_be_inserted: Signal<(GroupId, Interval)>,

    /// Entries were inserted into a group.
    pub items_inserted: Signal<(GroupId, Interval)>,

    /// Entries are about to be removed from a group.
    /// Args: (group, positions before removal)
    pub items_about_to_be_removed: Signal<(GroupId, Vec<Range>)>,

    /// Entries were removed from a group.
    pub items_removed: Signal<(GroupId, Vec<Range>)>,

    /// Entries are about to move within a group.
    /// Args: (group, moved ranges, destination before removal)
    pub items_about_to_move: Signal<(GroupId, Vec<Range>, usize)>,

    /// Entries moved within a group.
    pub items_moved: Signal<(GroupId, Vec<Range>, usize)>,

    /// A group's entry list was rewritten as a whole, for example after the
    /// dictionary renumbered its entries.
    pub items_changed: Signal<GroupId>,

    // -------------------------------------------------------------------------
    // Reset
    // -------------------------------------------------------------------------
    /// The whole tree is about to be replaced.
    pub groups_about_to_reset: Signal<()>,

    /// The whole tree was replaced (load, copy or clear).
    pub groups_reset: Signal<()>,
}

impl Default for GroupSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupSignals {
    /// Creates a new set of group signals.
    pub fn new() -> Self {
        Self {
            category_added: Signal::new(),
            category_about_to_be_deleted: Signal::new(),
            category_deleted: Signal::new(),
            category_renamed: Signal::new(),
            category_about_to_move: Signal::new(),
            category_moved: Signal::new(),
            categories_about_to_move: Signal::new(),
            categories_moved: Signal::new(),
            group_added: Signal::new(),
            group_about_to_be_deleted: Signal::new(),
            group_deleted: Signal::new(),
            group_renamed: Signal::new(),
            group_about_to_move: Signal::new(),
            group_moved: Signal::new(),
            groups_about_to_move: Signal::new(),
            groups_moved: Signal::new(),
            items_about_to_be_inserted: Signal::new(),
            items_inserted: Signal::new(),
            items_about_to_be_removed: Signal::new(),
            items_removed: Signal::new(),
            items_about_to_move: Signal::new(),
            items_moved: Signal::new(),
            items_changed: Signal::new(),
            groups_about_to_reset: Signal::new(),
            groups_reset: Signal::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_signals_start_disconnected() {
        let signals = GroupSignals::new();
        assert_eq!(signals.category_added.connection_count(), 0);
        assert_eq!(signals.groups_reset.connection_count(), 0);
    }

    #[test]
    fn test_group_deleted_carries_optional_parent() {
        let signals = GroupSignals::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        signals.group_deleted.connect(move |(parent, index, _)| {
            seen_clone.lock().push((parent.is_some(), *index));
        });

        signals.group_deleted.emit((None, 3, GroupId::default()));
        assert_eq!(*seen.lock(), vec![(false, 3)]);
    }
}
