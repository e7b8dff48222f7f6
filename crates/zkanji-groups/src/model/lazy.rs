//! A tree model that materialises rows on demand.
//!
//! [`LazyTreeModel`] sits between a domain that can be browsed by key (a
//! [`TreeSource`]) and a tree view. The children of a row are read from the
//! source the first time the view asks for them, and from then on kept in a
//! cache of [`TreeItems`]. The domain reports its changes with bracket calls
//! (`insert_rows`, `remove_rows`, `move_rows`, `move_ranges`, `reset`); the
//! model applies them to the cache and forwards them to views as
//! [`ModelSignals`]. Changes under rows that were never expanded only touch
//! the cache when there is something cached to update.
//!
//! Query methods take the source explicitly, so the model never holds a
//! reference into the domain and can be updated from the domain's own change
//! notifications.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use parking_lot::Mutex;
use slotmap::{new_key_type, Key, KeyData, SlotMap};
use zkanji_core::range::{self, Range};

use super::index::ModelIndex;
use super::role::{ItemData, ItemRole};
use super::traits::{ItemFlags, ModelSignals};

new_key_type! {
    /// Identifies a cached row.
    pub struct ItemId;
}

/// A domain that can be browsed by key.
///
/// `None` as a parent stands for the invisible root above the top-level rows.
pub trait TreeSource {
    /// Identifies one row of the domain. Keys must be unique in the tree.
    type Key: Copy + Eq + Hash + Debug;

    /// Number of rows under `parent`.
    fn child_count(&self, parent: Option<Self::Key>) -> usize;

    /// Key of the row at `row` under `parent`.
    fn child_key(&self, parent: Option<Self::Key>, row: usize) -> Option<Self::Key>;

    /// Keys of every row under `parent`, in order.
    fn children(&self, parent: Option<Self::Key>) -> Vec<Self::Key> {
        (0..self.child_count(parent))
            .filter_map(|row| self.child_key(parent, row))
            .collect()
    }

    /// Returns `true` if the row has any children. Should not be more
    /// expensive than [`child_count`](Self::child_count).
    fn has_children(&self, key: Self::Key) -> bool {
        self.child_count(Some(key)) > 0
    }

    /// Data of a row for a role.
    fn data(&self, key: Self::Key, role: ItemRole) -> ItemData;

    /// What a view may do with a row.
    fn flags(&self, _key: Self::Key) -> ItemFlags {
        ItemFlags::new()
    }
}

#[derive(Debug)]
struct TreeItem<K> {
    key: K,
    parent: Option<ItemId>,
    /// `None` until the children were requested.
    children: Option<Vec<ItemId>>,
}

/// The cache behind a [`LazyTreeModel`].
///
/// Bracket methods return `false` and change nothing when the parent was never
/// materialised or the rows do not match the cache.
#[derive(Debug)]
pub struct TreeItems<K> {
    items: SlotMap<ItemId, TreeItem<K>>,
    top: Option<Vec<ItemId>>,
    by_key: HashMap<K, ItemId>,
}

impl<K: Copy + Eq + Hash> Default for TreeItems<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> TreeItems<K> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            top: None,
            by_key: HashMap::new(),
        }
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn children(&self, parent: Option<ItemId>) -> Option<&Vec<ItemId>> {
        match parent {
            None => self.top.as_ref(),
            Some(id) => self.items.get(id)?.children.as_ref(),
        }
    }

    fn children_mut(&mut self, parent: Option<ItemId>) -> Option<&mut Vec<ItemId>> {
        match parent {
            None => self.top.as_mut(),
            Some(id) => self.items.get_mut(id)?.children.as_mut(),
        }
    }

    /// Returns `true` if the children of `parent` are cached.
    pub fn is_materialized(&self, parent: Option<ItemId>) -> bool {
        self.children(parent).is_some()
    }

    /// Cached children of `parent`; empty when not materialised.
    pub fn child_items(&self, parent: Option<ItemId>) -> &[ItemId] {
        self.children(parent).map_or(&[][..], Vec::as_slice)
    }

    /// Key of a cached row.
    pub fn key(&self, item: ItemId) -> Option<K> {
        self.items.get(item).map(|i| i.key)
    }

    /// Parent row, `None` for top-level rows and unknown ids.
    pub fn parent_of(&self, item: ItemId) -> Option<ItemId> {
        self.items.get(item)?.parent
    }

    /// The cached row for `key`.
    pub fn item_for_key(&self, key: K) -> Option<ItemId> {
        self.by_key.get(&key).copied()
    }

    /// Returns `true` if `item` is a cached row.
    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains_key(item)
    }

    /// Row of a cached item under its parent.
    pub fn row_of(&self, item: ItemId) -> Option<usize> {
        let parent = self.items.get(item)?.parent;
        self.children(parent)?.iter().position(|c| *c == item)
    }

    /// Reads the children of `parent` from `source` unless already cached.
    /// Returns `false` for an unknown parent.
    pub fn materialize<S>(&mut self, source: &S, parent: Option<ItemId>) -> bool
    where
        S: TreeSource<Key = K> + ?Sized,
    {
        if self.is_materialized(parent) {
            return true;
        }
        let parent_key = match parent {
            None => None,
            Some(id) => match self.items.get(id) {
                Some(item) => Some(item.key),
                None => return false,
            },
        };

        let ids: Vec<ItemId> = source
            .children(parent_key)
            .into_iter()
            .map(|key| self.create(key, parent))
            .collect();
        match parent {
            None => self.top = Some(ids),
            Some(id) => self.items[id].children = Some(ids),
        }
        true
    }

    fn create(&mut self, key: K, parent: Option<ItemId>) -> ItemId {
        let id = self.items.insert(TreeItem {
            key,
            parent,
            children: None,
        });
        self.by_key.insert(key, id);
        id
    }

    fn free(&mut self, id: ItemId) {
        let Some(item) = self.items.remove(id) else {
            return;
        };
        if self.by_key.get(&item.key) == Some(&id) {
            self.by_key.remove(&item.key);
        }
        for child in item.children.into_iter().flatten() {
            self.free(child);
        }
    }

    /// Inserts rows for `keys` before row `first`.
    pub fn insert_rows(&mut self, parent: Option<ItemId>, first: usize, keys: &[K]) -> bool {
        let Some(len) = self.children(parent).map(Vec::len) else {
            return false;
        };
        if first > len {
            return false;
        }
        let ids: Vec<ItemId> = keys.iter().map(|&key| self.create(key, parent)).collect();
        if let Some(children) = self.children_mut(parent) {
            children.splice(first..first, ids);
        }
        true
    }

    /// Removes rows `first..=last` and everything cached below them.
    pub fn remove_rows(&mut self, parent: Option<ItemId>, first: usize, last: usize) -> bool {
        let Some(children) = self.children_mut(parent) else {
            return false;
        };
        if first > last || last >= children.len() {
            return false;
        }
        let removed: Vec<ItemId> = children.drain(first..=last).collect();
        for id in removed {
            self.free(id);
        }
        true
    }

    /// Moves the rows at `ranges` under `src` in front of row `dest_row`
    /// under `dest`. `dest_row` counts rows before the moved ones are taken
    /// out, so within one parent a forward move lands `moved_before` rows
    /// earlier.
    ///
    /// `keys` are the keys of the moved rows, used when only the destination
    /// is materialised.
    pub fn move_ranges(
        &mut self,
        src: Option<ItemId>,
        ranges: &[Range],
        dest: Option<ItemId>,
        dest_row: usize,
        keys: &[K],
    ) -> bool {
        let src_ready = self.is_materialized(src);
        let dest_ready = self.is_materialized(dest);
        if src_ready {
            let len = self.child_items(src).len();
            if range::validate_ranges(ranges, len).is_err() {
                return false;
            }
        }

        let moved = match self.children_mut(src) {
            Some(children) if src_ready => range::remove_ranges(children, ranges),
            _ => Vec::new(),
        };
        if !dest_ready {
            for id in moved {
                self.free(id);
            }
            return src_ready;
        }

        let ids = if src_ready {
            moved
        } else {
            keys.iter().map(|&key| self.create(key, dest)).collect()
        };
        for id in &ids {
            if let Some(item) = self.items.get_mut(*id) {
                item.parent = dest;
            }
        }
        let target = if src == dest {
            dest_row - range::moved_before(ranges, dest_row)
        } else {
            dest_row
        };
        if let Some(children) = self.children_mut(dest) {
            let target = target.min(children.len());
            children.splice(target..target, ids);
        }
        true
    }

    /// Drops every cached row.
    pub fn reset(&mut self) {
        self.items.clear();
        self.by_key.clear();
        self.top = None;
    }
}

fn item_id(index: &ModelIndex) -> ItemId {
    ItemId::from(KeyData::from_ffi(index.internal_id()))
}

/// Lazily materialised tree model over a [`TreeSource`] keyed by `K`.
pub struct LazyTreeModel<K> {
    items: Mutex<TreeItems<K>>,
    signals: ModelSignals,
}

impl<K: Copy + Eq + Hash + Debug> Default for LazyTreeModel<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash + Debug> LazyTreeModel<K> {
    /// A model with nothing cached.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(TreeItems::new()),
            signals: ModelSignals::new(),
        }
    }

    /// The model's change notifications.
    pub fn signals(&self) -> &ModelSignals {
        &self.signals
    }

    /// Number of cached rows.
    pub fn cached_len(&self) -> usize {
        self.items.lock().len()
    }

    /// `Some(None)` for the invalid index, `Some(Some(id))` for a cached row.
    fn resolve(items: &TreeItems<K>, index: &ModelIndex) -> Option<Option<ItemId>> {
        if !index.is_valid() {
            return Some(None);
        }
        let id = item_id(index);
        items.contains(id).then_some(Some(id))
    }

    fn parent_item(items: &TreeItems<K>, parent: Option<K>) -> Option<Option<ItemId>> {
        match parent {
            None => Some(None),
            Some(key) => items.item_for_key(key).map(Some),
        }
    }

    fn make_index(items: &TreeItems<K>, id: ItemId) -> ModelIndex {
        let Some(row) = items.row_of(id) else {
            return ModelIndex::invalid();
        };
        let parent = items
            .parent_of(id)
            .map_or_else(ModelIndex::invalid, |p| Self::make_index(items, p));
        ModelIndex::new(row, parent, id.data().as_ffi())
    }

    fn make_parent_index(items: &TreeItems<K>, parent: Option<ItemId>) -> ModelIndex {
        parent.map_or_else(ModelIndex::invalid, |p| Self::make_index(items, p))
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Number of rows under `parent`, materialising them.
    pub fn row_count<S>(&self, source: &S, parent: &ModelIndex) -> usize
    where
        S: TreeSource<Key = K> + ?Sized,
    {
        let mut items = self.items.lock();
        let Some(parent) = Self::resolve(&items, parent) else {
            return 0;
        };
        items.materialize(source, parent);
        items.child_items(parent).len()
    }

    /// Index of the row at `row` under `parent`.
    pub fn index<S>(&self, source: &S, row: usize, parent: &ModelIndex) -> ModelIndex
    where
        S: TreeSource<Key = K> + ?Sized,
    {
        let mut items = self.items.lock();
        let Some(parent) = Self::resolve(&items, parent) else {
            return ModelIndex::invalid();
        };
        items.materialize(source, parent);
        match items.child_items(parent).get(row) {
            Some(&id) => Self::make_index(&items, id),
            None => ModelIndex::invalid(),
        }
    }

    /// Current parent of a row.
    pub fn parent(&self, index: &ModelIndex) -> ModelIndex {
        let items = self.items.lock();
        match Self::resolve(&items, index) {
            Some(Some(id)) => Self::make_parent_index(&items, items.parent_of(id)),
            _ => ModelIndex::invalid(),
        }
    }

    /// Key of the row at `index`.
    pub fn key(&self, index: &ModelIndex) -> Option<K> {
        let items = self.items.lock();
        match Self::resolve(&items, index)? {
            Some(id) => items.key(id),
            None => None,
        }
    }

    /// Data of a row for a role.
    pub fn data<S>(&self, source: &S, index: &ModelIndex, role: ItemRole) -> ItemData
    where
        S: TreeSource<Key = K> + ?Sized,
    {
        self.key(index)
            .map_or(ItemData::None, |key| source.data(key, role))
    }

    /// Flags of a row.
    pub fn flags<S>(&self, source: &S, index: &ModelIndex) -> ItemFlags
    where
        S: TreeSource<Key = K> + ?Sized,
    {
        self.key(index)
            .map_or_else(ItemFlags::default, |key| source.flags(key))
    }

    /// Returns `true` if `parent` has rows below it, without materialising
    /// them.
    pub fn has_children<S>(&self, source: &S, parent: &ModelIndex) -> bool
    where
        S: TreeSource<Key = K> + ?Sized,
    {
        let items = self.items.lock();
        match Self::resolve(&items, parent) {
            None => false,
            Some(item) if items.is_materialized(item) => !items.child_items(item).is_empty(),
            Some(None) => source.child_count(None) > 0,
            Some(Some(id)) => items.key(id).is_some_and(|key| source.has_children(key)),
        }
    }

    /// Index of the cached row for `key`; invalid when it is not cached.
    pub fn index_of_key(&self, key: K) -> ModelIndex {
        let items = self.items.lock();
        items
            .item_for_key(key)
            .map_or_else(ModelIndex::invalid, |id| Self::make_index(&items, id))
    }

    /// Keys of the cached children of `parent`, `None` when they were never
    /// requested.
    pub fn cached_children(&self, parent: Option<K>) -> Option<Vec<K>> {
        let items = self.items.lock();
        let parent = Self::parent_item(&items, parent)?;
        let children = items.children(parent)?;
        Some(children.iter().filter_map(|id| items.key(*id)).collect())
    }

    // -------------------------------------------------------------------------
    // Bracket calls
    // -------------------------------------------------------------------------

    /// Rows for `keys` were inserted before row `first` under `parent`.
    pub fn insert_rows(&self, parent: Option<K>, first: usize, keys: &[K]) {
        if keys.is_empty() {
            return;
        }
        let (parent_item, parent_index) = {
            let items = self.items.lock();
            let Some(parent_item) = Self::parent_item(&items, parent) else {
                return;
            };
            let parent_index = Self::make_parent_index(&items, parent_item);
            if !items.is_materialized(parent_item) {
                drop(items);
                // The row may have gained its first child.
                if parent_index.is_valid() {
                    self.signals
                        .emit_data_changed_single(parent_index, Vec::new());
                }
                return;
            }
            if first > items.child_items(parent_item).len() {
                tracing::warn!(target: "zkanji_groups::model", first, "row insertion out of range");
                return;
            }
            (parent_item, parent_index)
        };

        let last = first + keys.len() - 1;
        self.signals
            .emit_rows_inserted(parent_index, first, last, || {
                self.items.lock().insert_rows(parent_item, first, keys);
            });
    }

    /// Rows `first..=last` under `parent` were removed.
    pub fn remove_rows(&self, parent: Option<K>, first: usize, last: usize) {
        let (parent_item, parent_index) = {
            let items = self.items.lock();
            let Some(parent_item) = Self::parent_item(&items, parent) else {
                return;
            };
            if !items.is_materialized(parent_item) {
                return;
            }
            if first > last || last >= items.child_items(parent_item).len() {
                tracing::warn!(
                    target: "zkanji_groups::model",
                    first,
                    last,
                    "row removal out of range"
                );
                return;
            }
            (parent_item, Self::make_parent_index(&items, parent_item))
        };

        self.signals
            .emit_rows_removed(parent_index, first, last, || {
                self.items.lock().remove_rows(parent_item, first, last);
            });
    }

    /// Rows `first..=last` under `src` moved in front of row `dest_row` under
    /// `dest`, with `dest_row` counted before removal.
    pub fn move_rows(
        &self,
        src: Option<K>,
        first: usize,
        last: usize,
        dest: Option<K>,
        dest_row: usize,
        keys: &[K],
    ) {
        self.move_ranges(src, &[Range::new(first, last)], dest, dest_row, keys);
    }

    /// Several blocks of rows under `src` moved together in front of row
    /// `dest_row` under `dest`.
    ///
    /// A single block is reported as a row move; several blocks as a layout
    /// change.
    pub fn move_ranges(
        &self,
        src: Option<K>,
        ranges: &[Range],
        dest: Option<K>,
        dest_row: usize,
        keys: &[K],
    ) {
        let Some(&first_range) = ranges.first() else {
            return;
        };
        let (src_item, dest_item, src_index, dest_index, src_ready, dest_ready) = {
            let items = self.items.lock();
            let src_item = Self::parent_item(&items, src);
            let dest_item = Self::parent_item(&items, dest);
            let src_ready = src_item.is_some_and(|p| items.is_materialized(p));
            let dest_ready = dest_item.is_some_and(|p| items.is_materialized(p));
            (
                src_item.flatten(),
                dest_item.flatten(),
                src_item.map_or_else(ModelIndex::invalid, |p| Self::make_parent_index(&items, p)),
                dest_item.map_or_else(ModelIndex::invalid, |p| Self::make_parent_index(&items, p)),
                src_ready,
                dest_ready,
            )
        };

        match (src_ready, dest_ready) {
            (true, true) if ranges.len() == 1 => {
                self.signals.emit_rows_moved(
                    (src_index, first_range.first, first_range.last),
                    (dest_index, dest_row),
                    || {
                        self.items
                            .lock()
                            .move_ranges(src_item, ranges, dest_item, dest_row, keys);
                    },
                );
            }
            (true, true) => {
                self.signals.emit_layout_changed(|| {
                    self.items
                        .lock()
                        .move_ranges(src_item, ranges, dest_item, dest_row, keys);
                });
            }
            (true, false) => {
                for r in ranges.iter().rev() {
                    self.remove_rows(src, r.first, r.last);
                }
                if dest_index.is_valid() {
                    self.signals.emit_data_changed_single(dest_index, Vec::new());
                }
            }
            (false, true) => self.insert_rows(dest, dest_row, keys),
            (false, false) => {}
        }
    }

    /// The row for `key` changed its data.
    pub fn data_changed(&self, key: K, roles: Vec<ItemRole>) {
        let index = self.index_of_key(key);
        if index.is_valid() {
            self.signals.emit_data_changed_single(index, roles);
        }
    }

    /// Everything changed; drops the cache.
    pub fn reset(&self) {
        self.signals.emit_reset(|| self.items.lock().reset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Rows keyed by number; children listed per parent.
    struct Source {
        children: HashMap<Option<u32>, Vec<u32>>,
    }

    impl Source {
        fn new(entries: Vec<(Option<u32>, Vec<u32>)>) -> Self {
            Self {
                children: entries.into_iter().collect(),
            }
        }
    }

    impl TreeSource for Source {
        type Key = u32;

        fn child_count(&self, parent: Option<u32>) -> usize {
            self.children.get(&parent).map_or(0, Vec::len)
        }

        fn child_key(&self, parent: Option<u32>, row: usize) -> Option<u32> {
            self.children.get(&parent)?.get(row).copied()
        }

        fn data(&self, key: u32, role: ItemRole) -> ItemData {
            match role {
                ItemRole::Display => ItemData::from(format!("item {key}")),
                _ => ItemData::None,
            }
        }
    }

    fn rows(model: &LazyTreeModel<u32>, source: &Source, parent: &ModelIndex) -> Vec<u32> {
        (0..model.row_count(source, parent))
            .filter_map(|row| model.key(&model.index(source, row, parent)))
            .collect()
    }

    #[test]
    fn test_materializes_on_demand() {
        let source = Source::new(vec![(None, vec![1, 2]), (Some(1), vec![10, 11, 12])]);
        let model = LazyTreeModel::new();
        assert_eq!(model.cached_len(), 0);

        let root = ModelIndex::invalid();
        assert!(model.has_children(&source, &root));
        assert_eq!(model.row_count(&source, &root), 2);
        assert_eq!(model.cached_len(), 2);

        let first = model.index(&source, 0, &root);
        assert!(model.has_children(&source, &first));
        assert_eq!(model.cached_len(), 2);
        assert_eq!(rows(&model, &source, &first), vec![10, 11, 12]);
        assert_eq!(model.cached_len(), 5);

        let child = model.index(&source, 2, &first);
        assert_eq!(model.parent(&child), first);
        assert_eq!(
            model.data(&source, &child, ItemRole::Display).as_string(),
            Some("item 12")
        );
        assert!(!model.index(&source, 5, &first).is_valid());
    }

    #[test]
    fn test_changes_under_unexpanded_rows_are_ignored() {
        let source = Source::new(vec![(None, vec![1, 2]), (Some(1), vec![10])]);
        let model = LazyTreeModel::new();
        model.row_count(&source, &ModelIndex::invalid());

        let inserted = Arc::new(Mutex::new(0));
        let counter = inserted.clone();
        model
            .signals()
            .rows_inserted
            .connect(move |_| *counter.lock() += 1);

        model.insert_rows(Some(1), 1, &[11]);
        model.insert_rows(Some(99), 0, &[12]);
        assert_eq!(*inserted.lock(), 0);
        assert_eq!(model.cached_len(), 2);
        assert_eq!(model.cached_children(Some(1)), None);
    }

    #[test]
    fn test_move_rows_forward_within_parent() {
        let source = Source::new(vec![(None, vec![1, 2, 3, 4])]);
        let model = LazyTreeModel::new();
        let root = ModelIndex::invalid();
        model.row_count(&source, &root);

        let moves = Arc::new(Mutex::new(Vec::new()));
        let log = moves.clone();
        model
            .signals()
            .rows_moved
            .connect(move |(_, first, last, _, dest)| log.lock().push((*first, *last, *dest)));

        model.move_rows(None, 0, 0, None, 3, &[1]);
        assert_eq!(model.cached_children(None), Some(vec![2, 3, 1, 4]));
        assert_eq!(*moves.lock(), vec![(0, 0, 3)]);
    }

    #[test]
    fn test_move_ranges_between_parents() {
        let source = Source::new(vec![(None, vec![1, 2, 3, 4, 5]), (Some(5), vec![50])]);
        let model = LazyTreeModel::new();
        let root = ModelIndex::invalid();
        model.row_count(&source, &root);
        let five = model.index(&source, 4, &root);
        model.row_count(&source, &five);

        let layouts = Arc::new(Mutex::new(0));
        let counter = layouts.clone();
        model
            .signals()
            .layout_changed
            .connect(move |_| *counter.lock() += 1);

        let ranges = [Range::single(0), Range::new(2, 3)];
        model.move_ranges(None, &ranges, Some(5), 1, &[1, 3, 4]);
        assert_eq!(model.cached_children(None), Some(vec![2, 5]));
        assert_eq!(model.cached_children(Some(5)), Some(vec![50, 1, 3, 4]));
        assert_eq!(*layouts.lock(), 1);

        let moved = model.index_of_key(3);
        assert_eq!(moved.row(), 2);
        assert_eq!(model.parent(&moved).row(), 1);
    }

    #[test]
    fn test_move_into_unexpanded_parent_removes_rows() {
        let source = Source::new(vec![(None, vec![1, 2]), (Some(2), vec![20])]);
        let model = LazyTreeModel::new();
        model.row_count(&source, &ModelIndex::invalid());

        model.move_rows(None, 0, 0, Some(2), 0, &[1]);
        assert_eq!(model.cached_children(None), Some(vec![2]));
        assert!(!model.index_of_key(1).is_valid());
    }

    #[test]
    fn test_remove_rows_frees_subtree() {
        let source = Source::new(vec![(None, vec![1, 2]), (Some(1), vec![10, 11])]);
        let model = LazyTreeModel::new();
        let root = ModelIndex::invalid();
        let first = model.index(&source, 0, &root);
        model.row_count(&source, &first);
        assert_eq!(model.cached_len(), 4);

        model.remove_rows(None, 0, 0);
        assert_eq!(model.cached_len(), 1);
        assert!(!model.index_of_key(10).is_valid());
        assert_eq!(model.index_of_key(2).row(), 0);

        model.reset();
        assert_eq!(model.cached_len(), 0);
    }
}
