//! The category/group tree.
//!
//! A [`GroupTree`] is the root category of one dictionary's word groups or
//! kanji groups. It owns every category and group below it in two arenas;
//! categories list their children by id, in display order, and every node
//! knows its parent. Removing a node drops its whole subtree at once.
//!
//! Sibling names are unique within their own namespace (categories against
//! categories, groups against groups), compared case-insensitively. The root
//! category has an empty name and can be neither renamed, moved nor deleted.
//!
//! # Example
//!
//! ```
//! use zkanji_groups::WordGroups;
//!
//! let mut tree = WordGroups::new();
//! let root = tree.root();
//!
//! let index = tree.add_category(root, "JLPT").unwrap();
//! let jlpt = tree.category_at(root, index).unwrap();
//! let index = tree.add_group(jlpt, "N5").unwrap();
//! let n5 = tree.group_at(jlpt, index).unwrap();
//!
//! tree.group_mut(n5).unwrap().add_many(&[10, 4, 10]);
//! assert_eq!(tree.group(n5).unwrap().indexes(), &[10, 4]);
//! assert_eq!(tree.full_encoded_name(n5.into()).as_deref(), Some("JLPT/N5"));
//! ```

use std::collections::{HashMap, HashSet};

use slotmap::{new_key_type, SlotMap};
use zkanji_core::range::{self, Interval, Range};
use zkanji_core::RangeError;

use crate::encoding::{decode_path, encode_path};
use crate::error::{GroupError, Result};
use crate::group::{Group, InsertOutcome};
use crate::kind::{GroupKind, GroupType};
use crate::signals::GroupSignals;

new_key_type! {
    /// Identifies a category within one [`GroupTree`].
    pub struct CategoryId;

    /// Identifies a group within one [`GroupTree`].
    pub struct GroupId;
}

/// Either kind of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// A category (branch).
    Category(CategoryId),
    /// A group (leaf).
    Group(GroupId),
}

impl From<CategoryId> for NodeRef {
    fn from(id: CategoryId) -> Self {
        Self::Category(id)
    }
}

impl From<GroupId> for NodeRef {
    fn from(id: GroupId) -> Self {
        Self::Group(id)
    }
}

/// A named branch holding sub-categories and groups.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    parent: Option<CategoryId>,
    categories: Vec<CategoryId>,
    groups: Vec<GroupId>,
}

impl Category {
    fn new(name: String, parent: Option<CategoryId>) -> Self {
        Self {
            name,
            parent,
            categories: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// The category's name. Empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The category holding this one, `None` for the root.
    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
    }

    /// Child categories in display order.
    pub fn categories(&self) -> &[CategoryId] {
        &self.categories
    }

    /// Child groups in display order.
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// Returns `true` for the root category.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` when the category has neither sub-categories nor groups.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.groups.is_empty()
    }
}

/// Case-insensitive name comparison.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GroupError::InvalidName);
    }
    Ok(name.to_string())
}

/// The root category of a word or kanji group hierarchy.
pub struct GroupTree<K: GroupKind> {
    root: CategoryId,
    categories: SlotMap<CategoryId, Category>,
    groups: SlotMap<GroupId, Group<K>>,
    /// Entry index to the groups holding it. Kept only when
    /// `K::REVERSE_INDEX` is set.
    pub(crate) reverse: HashMap<K::Index, Vec<GroupId>>,
    last: Option<GroupId>,
    remember_last: bool,
    signals: GroupSignals,
}

impl<K: GroupKind> Default for GroupTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: GroupKind> std::fmt::Debug for GroupTree<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupTree")
            .field("type", &K::TYPE)
            .field("categories", &self.category_count())
            .field("groups", &self.group_count())
            .finish()
    }
}

impl<K: GroupKind> GroupTree<K> {
    /// Creates a tree holding only the unnamed root category.
    pub fn new() -> Self {
        let mut categories = SlotMap::with_key();
        let root = categories.insert(Category::new(String::new(), None));
        Self {
            root,
            categories,
            groups: SlotMap::with_key(),
            reverse: HashMap::new(),
            last: None,
            remember_last: true,
            signals: GroupSignals::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The root category.
    pub fn root(&self) -> CategoryId {
        self.root
    }

    /// Whether this tree holds word or kanji groups.
    pub fn group_type(&self) -> GroupType {
        K::TYPE
    }

    /// The tree's change notifications.
    pub fn signals(&self) -> &GroupSignals {
        &self.signals
    }

    /// Looks up a category.
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(id)
    }

    /// Looks up a group.
    pub fn group(&self, id: GroupId) -> Option<&Group<K>> {
        self.groups.get(id)
    }

    /// Returns `true` if the node belongs to this tree.
    pub fn contains(&self, node: NodeRef) -> bool {
        match node {
            NodeRef::Category(id) => self.categories.contains_key(id),
            NodeRef::Group(id) => self.groups.contains_key(id),
        }
    }

    /// Name of a category or group.
    pub fn name(&self, node: NodeRef) -> Option<&str> {
        match node {
            NodeRef::Category(id) => self.categories.get(id).map(Category::name),
            NodeRef::Group(id) => self.groups.get(id).map(Group::name),
        }
    }

    /// Parent category of a node. `None` for the root or an unknown node.
    pub fn parent(&self, node: NodeRef) -> Option<CategoryId> {
        match node {
            NodeRef::Category(id) => self.categories.get(id).and_then(Category::parent),
            NodeRef::Group(id) => self.groups.get(id).map(Group::parent),
        }
    }

    /// Child categories of `category`. Empty for an unknown id.
    pub fn categories(&self, category: CategoryId) -> &[CategoryId] {
        self.categories
            .get(category)
            .map_or(&[][..], |c| c.categories.as_slice())
    }

    /// Child groups of `category`. Empty for an unknown id.
    pub fn groups(&self, category: CategoryId) -> &[GroupId] {
        self.categories
            .get(category)
            .map_or(&[][..], |c| c.groups.as_slice())
    }

    /// Number of categories below the root.
    pub fn category_count(&self) -> usize {
        self.categories.len() - 1
    }

    /// Number of groups in the tree.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` when the root holds nothing.
    pub fn is_empty(&self) -> bool {
        self.categories.len() == 1 && self.groups.is_empty()
    }

    /// Child category of `parent` at `index`.
    pub fn category_at(&self, parent: CategoryId, index: usize) -> Option<CategoryId> {
        self.categories.get(parent)?.categories.get(index).copied()
    }

    /// Child group of `parent` at `index`.
    pub fn group_at(&self, parent: CategoryId, index: usize) -> Option<GroupId> {
        self.categories.get(parent)?.groups.get(index).copied()
    }

    /// Index of the child category of `parent` called `name` (any case).
    pub fn category_index(&self, parent: CategoryId, name: &str) -> Option<usize> {
        let name = name.trim();
        let parent = self.categories.get(parent)?;
        parent.categories.iter().position(|id| {
            self.categories
                .get(*id)
                .is_some_and(|c| names_match(&c.name, name))
        })
    }

    /// Index of the child group of `parent` called `name` (any case).
    pub fn group_index(&self, parent: CategoryId, name: &str) -> Option<usize> {
        let name = name.trim();
        let parent = self.categories.get(parent)?;
        parent.groups.iter().position(|id| {
            self.groups
                .get(*id)
                .is_some_and(|g| names_match(&g.name, name))
        })
    }

    /// Index of a category within its parent.
    pub fn category_position(&self, id: CategoryId) -> Option<usize> {
        let parent = self.categories.get(id)?.parent?;
        self.categories[parent]
            .categories
            .iter()
            .position(|c| *c == id)
    }

    /// Index of a group within its parent.
    pub fn group_position(&self, id: GroupId) -> Option<usize> {
        let parent = self.groups.get(id)?.parent;
        self.categories
            .get(parent)?
            .groups
            .iter()
            .position(|g| *g == id)
    }

    /// Returns `true` if `parent` already has a category called `name`.
    pub fn category_name_taken(&self, parent: CategoryId, name: &str) -> bool {
        self.category_index(parent, name).is_some()
    }

    /// Returns `true` if `parent` already has a group called `name`.
    pub fn group_name_taken(&self, parent: CategoryId, name: &str) -> bool {
        self.group_index(parent, name).is_some()
    }

    /// Returns `true` if `node` is inside `category`: a direct child, or any
    /// descendant when `recursive` is set.
    pub fn is_child(&self, category: CategoryId, node: NodeRef, recursive: bool) -> bool {
        if recursive {
            self.is_descendant(category, node)
        } else {
            self.parent(node) == Some(category)
        }
    }

    fn is_descendant(&self, ancestor: CategoryId, node: NodeRef) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.categories.get(id).and_then(Category::parent);
        }
        false
    }

    /// Visits every group under `category`, depth first.
    ///
    /// Sub-categories are visited (recursively, in order) before the
    /// category's own groups.
    pub fn walk_groups<F>(&self, category: CategoryId, mut f: F)
    where
        F: FnMut(GroupId, &Group<K>),
    {
        self.walk_inner(category, &mut f);
    }

    fn walk_inner<F>(&self, category: CategoryId, f: &mut F)
    where
        F: FnMut(GroupId, &Group<K>),
    {
        let Some(cat) = self.categories.get(category) else {
            return;
        };
        for sub in &cat.categories {
            self.walk_inner(*sub, f);
        }
        for id in &cat.groups {
            if let Some(group) = self.groups.get(*id) {
                f(*id, group);
            }
        }
    }

    /// Every group in walk order.
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids = Vec::with_capacity(self.groups.len());
        self.walk_groups(self.root, |id, _| ids.push(id));
        ids
    }

    /// Groups below `category` with their parent and index, in walk order.
    fn subtree_groups(&self, category: CategoryId) -> Vec<(usize, GroupId)> {
        let mut found = Vec::new();
        self.walk_groups(category, |id, group| {
            let index = self.categories[group.parent]
                .groups
                .iter()
                .position(|g| *g == id)
                .unwrap_or_default();
            found.push((index, id));
        });
        found
    }

    // -------------------------------------------------------------------------
    // Creation and renaming
    // -------------------------------------------------------------------------

    /// Appends a category called `name` to `parent` and returns its index.
    pub fn add_category(&mut self, parent: CategoryId, name: &str) -> Result<usize> {
        let name = clean_name(name)?;
        if !self.categories.contains_key(parent) {
            return Err(GroupError::NoSuchCategory);
        }
        if self.category_name_taken(parent, &name) {
            tracing::debug!(target: "zkanji_groups::tree", %name, "category name taken");
            return Err(GroupError::name_taken(name));
        }

        let id = self.categories.insert(Category::new(name, Some(parent)));
        let siblings = &mut self.categories[parent].categories;
        siblings.push(id);
        let index = siblings.len() - 1;

        tracing::debug!(target: "zkanji_groups::tree", ?parent, index, "category added");
        self.signals.category_added.emit((parent, index, id));
        Ok(index)
    }

    /// Appends a group called `name` to `parent` and returns its index.
    pub fn add_group(&mut self, parent: CategoryId, name: &str) -> Result<usize> {
        let name = clean_name(name)?;
        if !self.categories.contains_key(parent) {
            return Err(GroupError::NoSuchCategory);
        }
        if self.group_name_taken(parent, &name) {
            tracing::debug!(target: "zkanji_groups::tree", %name, "group name taken");
            return Err(GroupError::name_taken(name));
        }

        let id = self.groups.insert(Group::new(name, parent));
        let siblings = &mut self.categories[parent].groups;
        siblings.push(id);
        let index = siblings.len() - 1;

        tracing::debug!(target: "zkanji_groups::tree", ?parent, index, "group added");
        self.signals.group_added.emit((parent, index, id));
        Ok(index)
    }

    /// Renames a category. Fails if a sibling category already uses the name.
    pub fn rename_category(&mut self, id: CategoryId, name: &str) -> Result<()> {
        let name = clean_name(name)?;
        let parent = self
            .categories
            .get(id)
            .ok_or(GroupError::NoSuchCategory)?
            .parent
            .ok_or(GroupError::RootImmutable)?;
        let index = self.category_position(id).ok_or(GroupError::NoSuchCategory)?;
        if self
            .category_index(parent, &name)
            .is_some_and(|other| other != index)
        {
            return Err(GroupError::name_taken(name));
        }

        self.categories[id].name = name;
        self.signals.category_renamed.emit((parent, index));
        Ok(())
    }

    /// Renames a group. Fails if a sibling group already uses the name.
    pub fn rename_group(&mut self, id: GroupId, name: &str) -> Result<()> {
        let name = clean_name(name)?;
        let parent = self.groups.get(id).ok_or(GroupError::NoSuchGroup)?.parent;
        let index = self.group_position(id).ok_or(GroupError::NoSuchGroup)?;
        if self
            .group_index(parent, &name)
            .is_some_and(|other| other != index)
        {
            return Err(GroupError::name_taken(name));
        }

        self.groups[id].name = name;
        self.signals.group_renamed.emit((parent, index));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------------

    /// Deletes the child category of `parent` at `index` with everything in it.
    ///
    /// Every group inside the category is announced with its own
    /// `group_about_to_be_deleted` / `group_deleted` pair, parent `None`,
    /// between the category's own pair.
    pub fn delete_category(&mut self, parent: CategoryId, index: usize) -> Result<()> {
        let len = self
            .categories
            .get(parent)
            .ok_or(GroupError::NoSuchCategory)?
            .categories
            .len();
        let id = self
            .category_at(parent, index)
            .ok_or(GroupError::out_of_range(index, len))?;
        let inner = self.subtree_groups(id);

        self.signals
            .category_about_to_be_deleted
            .emit((parent, index, id));
        for &(group_index, group) in &inner {
            self.signals
                .group_about_to_be_deleted
                .emit((None, group_index, group));
        }

        self.categories[parent].categories.remove(index);
        self.drop_subtree(id);
        tracing::debug!(
            target: "zkanji_groups::tree",
            ?parent,
            index,
            groups = inner.len(),
            "category deleted"
        );

        for &(group_index, group) in &inner {
            self.signals.group_deleted.emit((None, group_index, group));
        }
        self.signals.category_deleted.emit((parent, index, id));
        Ok(())
    }

    /// Deletes the child group of `parent` at `index`.
    pub fn delete_group(&mut self, parent: CategoryId, index: usize) -> Result<()> {
        let len = self
            .categories
            .get(parent)
            .ok_or(GroupError::NoSuchCategory)?
            .groups
            .len();
        let id = self
            .group_at(parent, index)
            .ok_or(GroupError::out_of_range(index, len))?;

        self.signals
            .group_about_to_be_deleted
            .emit((Some(parent), index, id));
        self.categories[parent].groups.remove(index);
        self.drop_group(id);
        tracing::debug!(target: "zkanji_groups::tree", ?parent, index, "group deleted");
        self.signals.group_deleted.emit((Some(parent), index, id));
        Ok(())
    }

    /// Deletes a mixed selection of categories and groups.
    ///
    /// Nodes whose ancestor category is also selected are skipped, since
    /// deleting the ancestor takes them along.
    pub fn remove(&mut self, nodes: &[NodeRef]) -> Result<()> {
        for &node in nodes {
            if node == NodeRef::Category(self.root) {
                return Err(GroupError::RootImmutable);
            }
            if !self.contains(node) {
                return Err(match node {
                    NodeRef::Category(_) => GroupError::NoSuchCategory,
                    NodeRef::Group(_) => GroupError::NoSuchGroup,
                });
            }
        }

        let selected: HashSet<CategoryId> = nodes
            .iter()
            .filter_map(|n| match n {
                NodeRef::Category(id) => Some(*id),
                NodeRef::Group(_) => None,
            })
            .collect();
        let mut seen = HashSet::new();
        let top: Vec<NodeRef> = nodes
            .iter()
            .copied()
            .filter(|n| seen.insert(*n))
            .filter(|n| !selected.iter().any(|c| self.is_descendant(*c, *n)))
            .collect();

        for node in top {
            match node {
                NodeRef::Category(id) => {
                    let parent = self.parent(node).ok_or(GroupError::RootImmutable)?;
                    let index = self.category_position(id).ok_or(GroupError::NoSuchCategory)?;
                    self.delete_category(parent, index)?;
                }
                NodeRef::Group(id) => {
                    let parent = self.parent(node).ok_or(GroupError::NoSuchGroup)?;
                    let index = self.group_position(id).ok_or(GroupError::NoSuchGroup)?;
                    self.delete_group(parent, index)?;
                }
            }
        }
        Ok(())
    }

    fn drop_subtree(&mut self, id: CategoryId) {
        let Some(category) = self.categories.remove(id) else {
            return;
        };
        for sub in category.categories {
            self.drop_subtree(sub);
        }
        for group in category.groups {
            self.drop_group(group);
        }
    }

    fn drop_group(&mut self, id: GroupId) {
        if let Some(group) = self.groups.remove(id) {
            self.unindex(id, &group.list);
            if self.last == Some(id) {
                self.last = None;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Moving
    // -------------------------------------------------------------------------

    /// Moves a category under `dest`, in front of the child currently at
    /// `dest_index` (or last when `dest_index` equals the child count).
    ///
    /// Within the same parent, a forward move lands at `dest_index - 1`.
    /// Moving to the category's own slot, or the slot right after it, is a
    /// no-op. Fails without changes if `dest` already has a category with the
    /// same name or is the category itself or one of its descendants.
    pub fn move_category(
        &mut self,
        what: CategoryId,
        dest: CategoryId,
        dest_index: usize,
    ) -> Result<()> {
        let src = self
            .categories
            .get(what)
            .ok_or(GroupError::NoSuchCategory)?
            .parent
            .ok_or(GroupError::RootImmutable)?;
        let dest_len = self
            .categories
            .get(dest)
            .ok_or(GroupError::NoSuchCategory)?
            .categories
            .len();
        if dest_index > dest_len {
            return Err(GroupError::out_of_range(dest_index, dest_len));
        }
        if dest == what || self.is_descendant(what, NodeRef::Category(dest)) {
            return Err(GroupError::CircularMove);
        }
        let src_index = self.category_position(what).ok_or(GroupError::NoSuchCategory)?;

        if src == dest {
            if dest_index == src_index || dest_index == src_index + 1 {
                return Ok(());
            }
        } else {
            let name = self.categories[what].name.clone();
            if self.category_name_taken(dest, &name) {
                return Err(GroupError::name_taken(name));
            }
        }

        let event = (src, src_index, dest, dest_index, what);
        self.signals.category_about_to_move.emit(event);

        self.categories[src].categories.remove(src_index);
        let target = if src == dest {
            range::adjusted_destination(src_index, dest_index)
        } else {
            dest_index
        };
        self.categories[dest].categories.insert(target, what);
        self.categories[what].parent = Some(dest);

        tracing::debug!(target: "zkanji_groups::tree", src_index, target, "category moved");
        self.signals.category_moved.emit(event);
        Ok(())
    }

    /// Moves a group under `dest`, with the same index rules as
    /// [`move_category`](Self::move_category).
    pub fn move_group(&mut self, what: GroupId, dest: CategoryId, dest_index: usize) -> Result<()> {
        let src = self.groups.get(what).ok_or(GroupError::NoSuchGroup)?.parent;
        let dest_len = self
            .categories
            .get(dest)
            .ok_or(GroupError::NoSuchCategory)?
            .groups
            .len();
        if dest_index > dest_len {
            return Err(GroupError::out_of_range(dest_index, dest_len));
        }
        let src_index = self.group_position(what).ok_or(GroupError::NoSuchGroup)?;

        if src == dest {
            if dest_index == src_index || dest_index == src_index + 1 {
                return Ok(());
            }
        } else {
            let name = self.groups[what].name.clone();
            if self.group_name_taken(dest, &name) {
                return Err(GroupError::name_taken(name));
            }
        }

        let event = (src, src_index, dest, dest_index, what);
        self.signals.group_about_to_move.emit(event);

        self.categories[src].groups.remove(src_index);
        let target = if src == dest {
            range::adjusted_destination(src_index, dest_index)
        } else {
            dest_index
        };
        self.categories[dest].groups.insert(target, what);
        self.groups[what].parent = dest;

        tracing::debug!(target: "zkanji_groups::tree", src_index, target, "group moved");
        self.signals.group_moved.emit(event);
        Ok(())
    }

    /// Moves several categories of one parent to `dest` as a single block.
    ///
    /// Names are not checked; use
    /// [`category_name_taken`](Self::category_name_taken) first when moving
    /// to another parent. Within the same parent `dest_index` may not point
    /// at one of the moved categories.
    pub fn move_categories(
        &mut self,
        what: &[CategoryId],
        dest: CategoryId,
        dest_index: usize,
    ) -> Result<()> {
        let Some(&first) = what.first() else {
            return Ok(());
        };
        let src = self
            .categories
            .get(first)
            .ok_or(GroupError::NoSuchCategory)?
            .parent
            .ok_or(GroupError::RootImmutable)?;
        for &id in what {
            let parent = self.categories.get(id).ok_or(GroupError::NoSuchCategory)?.parent;
            if parent != Some(src) {
                return Err(GroupError::MixedParents);
            }
            if dest == id || self.is_descendant(id, NodeRef::Category(dest)) {
                return Err(GroupError::CircularMove);
            }
        }
        let dest_len = self
            .categories
            .get(dest)
            .ok_or(GroupError::NoSuchCategory)?
            .categories
            .len();

        let siblings = &self.categories[src].categories;
        let positions: Vec<usize> = what
            .iter()
            .filter_map(|id| siblings.iter().position(|c| c == id))
            .collect();
        let ranges = range::ranges_from_positions(&positions);
        let ids: Vec<CategoryId> = ranges
            .iter()
            .flat_map(|r| r.first..=r.last)
            .map(|pos| siblings[pos])
            .collect();
        let target = batch_target(&ranges, src == dest, dest_index, dest_len)?;

        let event = (src, ranges, dest, dest_index, ids);
        self.signals.categories_about_to_move.emit(event.clone());

        let moved = range::remove_ranges(&mut self.categories[src].categories, &event.1);
        self.categories[dest]
            .categories
            .splice(target..target, moved);
        for id in &event.4 {
            self.categories[*id].parent = Some(dest);
        }

        tracing::debug!(
            target: "zkanji_groups::tree",
            count = event.4.len(),
            target,
            "categories moved"
        );
        self.signals.categories_moved.emit(event);
        Ok(())
    }

    /// Moves several groups of one parent to `dest` as a single block, with
    /// the same rules as [`move_categories`](Self::move_categories).
    pub fn move_groups(
        &mut self,
        what: &[GroupId],
        dest: CategoryId,
        dest_index: usize,
    ) -> Result<()> {
        let Some(&first) = what.first() else {
            return Ok(());
        };
        let src = self.groups.get(first).ok_or(GroupError::NoSuchGroup)?.parent;
        for &id in what {
            let parent = self.groups.get(id).ok_or(GroupError::NoSuchGroup)?.parent;
            if parent != src {
                return Err(GroupError::MixedParents);
            }
        }
        let dest_len = self
            .categories
            .get(dest)
            .ok_or(GroupError::NoSuchCategory)?
            .groups
            .len();

        let siblings = &self.categories[src].groups;
        let positions: Vec<usize> = what
            .iter()
            .filter_map(|id| siblings.iter().position(|g| g == id))
            .collect();
        let ranges = range::ranges_from_positions(&positions);
        let ids: Vec<GroupId> = ranges
            .iter()
            .flat_map(|r| r.first..=r.last)
            .map(|pos| siblings[pos])
            .collect();
        let target = batch_target(&ranges, src == dest, dest_index, dest_len)?;

        let event = (src, ranges, dest, dest_index, ids);
        self.signals.groups_about_to_move.emit(event.clone());

        let moved = range::remove_ranges(&mut self.categories[src].groups, &event.1);
        self.categories[dest].groups.splice(target..target, moved);
        for id in &event.4 {
            self.groups[*id].parent = dest;
        }

        tracing::debug!(
            target: "zkanji_groups::tree",
            count = event.4.len(),
            target,
            "groups moved"
        );
        self.signals.groups_moved.emit(event);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Encoded names
    // -------------------------------------------------------------------------

    /// The `/`-separated path from the root to `node`, with `/`, `^` and `[`
    /// escaped by `^` inside names. The root's path is empty.
    pub fn full_encoded_name(&self, node: NodeRef) -> Option<String> {
        let mut names: Vec<&str> = Vec::new();
        let mut current = match node {
            NodeRef::Category(id) => {
                if id == self.root {
                    return self.categories.contains_key(id).then(String::new);
                }
                let category = self.categories.get(id)?;
                names.push(&category.name);
                category.parent
            }
            NodeRef::Group(id) => {
                let group = self.groups.get(id)?;
                names.push(&group.name);
                Some(group.parent)
            }
        };
        while let Some(id) = current {
            if id == self.root {
                break;
            }
            let category = self.categories.get(id)?;
            names.push(&category.name);
            current = category.parent;
        }
        names.reverse();
        Some(encode_path(names))
    }

    /// Finds the category at an encoded `path` relative to `category`.
    /// An empty path is `category` itself.
    pub fn find_category_by_encoded_name(
        &self,
        category: CategoryId,
        path: &str,
    ) -> Option<CategoryId> {
        let mut current = category;
        self.categories.get(current)?;
        for segment in decode_path(path) {
            let index = self.category_index(current, &segment)?;
            current = self.categories[current].categories[index];
        }
        Some(current)
    }

    /// Finds the group at an encoded `path` relative to `category`.
    pub fn find_group_by_encoded_name(&self, category: CategoryId, path: &str) -> Option<GroupId> {
        let segments = decode_path(path);
        let (last, dirs) = segments.split_last()?;
        let mut current = category;
        self.categories.get(current)?;
        for segment in dirs {
            let index = self.category_index(current, segment)?;
            current = self.categories[current].categories[index];
        }
        let index = self.group_index(current, last)?;
        Some(self.categories[current].groups[index])
    }

    /// Resolves an encoded category path, creating missing categories when
    /// `create` is set.
    ///
    /// A path with an empty or blank segment resolves to `None` without
    /// creating anything.
    pub fn category_from_encoded_name(
        &mut self,
        category: CategoryId,
        path: &str,
        create: bool,
    ) -> Option<CategoryId> {
        if !create {
            return self.find_category_by_encoded_name(category, path);
        }
        let segments = decode_path(path);
        self.categories.get(category)?;
        if !segments.iter().all(|s| clean_name(s).is_ok()) {
            return None;
        }
        let mut current = category;
        for segment in &segments {
            current = self.child_category_or_create(current, segment)?;
        }
        Some(current)
    }

    /// Resolves an encoded group path, creating missing categories and the
    /// group itself when `create` is set. Nothing is created when any
    /// segment is blank.
    ///
    /// For every group `g` of the tree,
    /// `group_from_encoded_name(root, &full_encoded_name(g), false) == Some(g)`.
    pub fn group_from_encoded_name(
        &mut self,
        category: CategoryId,
        path: &str,
        create: bool,
    ) -> Option<GroupId> {
        if !create {
            return self.find_group_by_encoded_name(category, path);
        }
        let segments = decode_path(path);
        let (last, dirs) = segments.split_last()?;
        self.categories.get(category)?;
        if !segments.iter().all(|s| clean_name(s).is_ok()) {
            return None;
        }
        let mut current = category;
        for segment in dirs {
            current = self.child_category_or_create(current, segment)?;
        }
        let index = match self.group_index(current, last) {
            Some(index) => index,
            None => self.add_group(current, last).ok()?,
        };
        Some(self.categories[current].groups[index])
    }

    fn child_category_or_create(&mut self, parent: CategoryId, name: &str) -> Option<CategoryId> {
        let index = match self.category_index(parent, name) {
            Some(index) => index,
            None => self.add_category(parent, name).ok()?,
        };
        Some(self.categories[parent].categories[index])
    }

    // -------------------------------------------------------------------------
    // Last used group
    // -------------------------------------------------------------------------

    /// The group most recently used as an "add to group" destination.
    pub fn last_selected(&self) -> Option<GroupId> {
        self.last.filter(|id| self.groups.contains_key(*id))
    }

    /// Remembers `group` as the last used destination.
    ///
    /// Ignored while remembering is switched off.
    pub fn set_last_selected(&mut self, group: Option<GroupId>) {
        if self.remember_last {
            self.last = group.filter(|id| self.groups.contains_key(*id));
        }
    }

    /// Remembers the group at an encoded path (relative to the root). The
    /// group is not created; an unknown path clears the remembered group.
    pub fn set_last_selected_name(&mut self, path: &str) -> Option<GroupId> {
        if !self.remember_last {
            return None;
        }
        self.last = self.find_group_by_encoded_name(self.root, path);
        self.last
    }

    /// Turns remembering of the last used group on or off.
    pub fn set_remember_last(&mut self, remember: bool) {
        self.remember_last = remember;
        if !remember {
            self.last = None;
        }
    }

    /// Whether the last used group is remembered.
    pub fn remember_last(&self) -> bool {
        self.remember_last
    }

    // -------------------------------------------------------------------------
    // Whole-tree operations
    // -------------------------------------------------------------------------

    /// Removes every category and group.
    ///
    /// Ids of the removed nodes never resolve again. The root keeps its id.
    pub fn clear(&mut self) {
        self.adopt(&Self::new());
    }

    /// Replaces this tree's content with a deep copy of `other`.
    ///
    /// The copies get ids of this tree; ids of `other` and ids this tree
    /// handed out before do not resolve to them. Connections to this tree's
    /// signals are kept.
    pub fn copy_from(&mut self, other: &GroupTree<K>) {
        self.adopt(other);
        tracing::debug!(target: "zkanji_groups::tree", groups = self.groups.len(), "tree copied");
    }

    /// Takes over the content of a freshly read tree, keeping this tree's
    /// signal connections and settings.
    pub(crate) fn replace_with(&mut self, other: GroupTree<K>) {
        self.adopt(&other);
    }

    fn adopt(&mut self, other: &GroupTree<K>) {
        self.signals.groups_about_to_reset.emit(());

        // Removing in place bumps every slot version.
        let root = self.root;
        self.categories.retain(|id, _| id == root);
        self.groups.clear();
        if let Some(category) = self.categories.get_mut(root) {
            category.categories.clear();
            category.groups.clear();
        }

        let mut remap = HashMap::new();
        self.copy_children(other, other.root, root, &mut remap);
        self.last = other
            .last
            .filter(|_| self.remember_last)
            .and_then(|id| remap.get(&id).copied());
        self.rebuild_reverse_index();

        self.signals.groups_reset.emit(());
    }

    /// Copies the children of `from` in `other` below `to`, depth first.
    fn copy_children(
        &mut self,
        other: &GroupTree<K>,
        from: CategoryId,
        to: CategoryId,
        remap: &mut HashMap<GroupId, GroupId>,
    ) {
        let Some(source) = other.categories.get(from) else {
            return;
        };
        for &child in &source.categories {
            let Some(category) = other.categories.get(child) else {
                continue;
            };
            let id = self
                .categories
                .insert(Category::new(category.name.clone(), Some(to)));
            self.categories[to].categories.push(id);
            self.copy_children(other, child, id, remap);
        }
        for &old in &source.groups {
            let Some(group) = other.groups.get(old) else {
                continue;
            };
            let mut copy = Group::new(group.name.clone(), to);
            copy.list.clone_from(&group.list);
            let id = self.groups.insert(copy);
            self.categories[to].groups.push(id);
            remap.insert(old, id);
        }
    }

    /// Recomputes the entry-to-groups index from the group lists.
    pub(crate) fn rebuild_reverse_index(&mut self) {
        self.reverse.clear();
        if !K::REVERSE_INDEX {
            return;
        }
        for (id, group) in &self.groups {
            for value in &group.list {
                self.reverse.entry(*value).or_default().push(id);
            }
        }
    }

    fn index_values(&mut self, id: GroupId, values: &[K::Index]) {
        if !K::REVERSE_INDEX {
            return;
        }
        for value in values {
            self.reverse.entry(*value).or_default().push(id);
        }
    }

    fn unindex(&mut self, id: GroupId, values: &[K::Index]) {
        if !K::REVERSE_INDEX {
            return;
        }
        for value in values {
            if let Some(holders) = self.reverse.get_mut(value) {
                holders.retain(|g| *g != id);
                if holders.is_empty() {
                    self.reverse.remove(value);
                }
            }
        }
    }

    /// Mutable access to a group's entry list.
    pub fn group_mut(&mut self, id: GroupId) -> Option<GroupMut<'_, K>> {
        if self.groups.contains_key(id) {
            Some(GroupMut { tree: self, id })
        } else {
            None
        }
    }

    pub(crate) fn groups_iter(&self) -> impl Iterator<Item = (GroupId, &Group<K>)> {
        self.groups.iter()
    }
}

/// Where a batch of sibling moves lands once the ranges are taken out.
fn batch_target(
    ranges: &[Range],
    same_parent: bool,
    dest_index: usize,
    dest_len: usize,
) -> Result<usize> {
    if dest_index > dest_len {
        return Err(GroupError::out_of_range(dest_index, dest_len));
    }
    if !same_parent {
        return Ok(dest_index);
    }
    if ranges.iter().any(|r| r.contains(dest_index)) {
        return Err(RangeError::DestinationInside(dest_index).into());
    }
    Ok(dest_index - range::moved_before(ranges, dest_index))
}

/// Changes one group's entries, keeping the tree's bookkeeping and
/// notifications in step.
pub struct GroupMut<'a, K: GroupKind> {
    tree: &'a mut GroupTree<K>,
    id: GroupId,
}

impl<K: GroupKind> GroupMut<'_, K> {
    /// The group being changed.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Read access to the group.
    pub fn group(&self) -> &Group<K> {
        &self.tree.groups[self.id]
    }

    /// Appends `value` unless it is already present. Returns its position.
    pub fn add(&mut self, value: K::Index) -> usize {
        if let Some(pos) = self.group().index_of(value) {
            return pos;
        }
        let pos = self.group().len();
        self.insert_block(pos, vec![value]);
        pos
    }

    /// Inserts `value` before position `pos` (`None` appends) unless it is
    /// already present. Returns its position.
    pub fn insert(&mut self, value: K::Index, pos: Option<usize>) -> Result<usize> {
        let len = self.group().len();
        let pos = pos.unwrap_or(len);
        if pos > len {
            return Err(GroupError::out_of_range(pos, len));
        }
        if let Some(existing) = self.group().index_of(value) {
            return Ok(existing);
        }
        self.insert_block(pos, vec![value]);
        Ok(pos)
    }

    /// Appends every value not yet in the group.
    pub fn add_many(&mut self, values: &[K::Index]) -> InsertOutcome {
        let len = self.group().len();
        self.insert_many_at(values, len)
    }

    /// Inserts every value not yet in the group as one block before `pos`
    /// (`None` appends). Values already present stay where they are.
    pub fn insert_many(
        &mut self,
        values: &[K::Index],
        pos: Option<usize>,
    ) -> Result<InsertOutcome> {
        let len = self.group().len();
        let pos = pos.unwrap_or(len);
        if pos > len {
            return Err(GroupError::out_of_range(pos, len));
        }
        Ok(self.insert_many_at(values, pos))
    }

    fn insert_many_at(&mut self, values: &[K::Index], pos: usize) -> InsertOutcome {
        let present = self.group().position_map();
        let mut seen = HashSet::new();
        let fresh: Vec<K::Index> = values
            .iter()
            .copied()
            .filter(|v| !present.contains_key(v) && seen.insert(*v))
            .collect();
        let added = fresh.len();
        if added > 0 {
            self.insert_block(pos, fresh);
        }

        let lookup = self.group().position_map();
        let mut positions: Vec<usize> = values
            .iter()
            .filter_map(|v| lookup.get(v).copied())
            .collect();
        positions.sort_unstable();
        InsertOutcome { added, positions }
    }

    fn insert_block(&mut self, pos: usize, fresh: Vec<K::Index>) {
        let span = Interval::new(pos, fresh.len());
        self.tree
            .signals
            .items_about_to_be_inserted
            .emit((self.id, span));
        self.tree.index_values(self.id, &fresh);
        self.tree.groups[self.id].list.splice(pos..pos, fresh);
        tracing::trace!(target: "zkanji_groups::tree", pos, count = span.count, "items inserted");
        self.tree.signals.items_inserted.emit((self.id, span));
    }

    /// Removes the entries at `ranges`, which must be sorted, disjoint and
    /// non-adjacent. Returns the number of entries removed.
    pub fn remove(&mut self, ranges: &[Range]) -> Result<usize> {
        range::validate_ranges(ranges, self.group().len())?;
        if ranges.is_empty() {
            return Ok(0);
        }

        self.tree
            .signals
            .items_about_to_be_removed
            .emit((self.id, ranges.to_vec()));
        let removed = range::remove_ranges(&mut self.tree.groups[self.id].list, ranges);
        self.tree.unindex(self.id, &removed);
        tracing::trace!(target: "zkanji_groups::tree", count = removed.len(), "items removed");
        self.tree
            .signals
            .items_removed
            .emit((self.id, ranges.to_vec()));
        Ok(removed.len())
    }

    /// Removes the given values. Values not in the group are ignored.
    pub fn remove_values(&mut self, values: &[K::Index]) -> Result<usize> {
        let positions = self.group().index_of_many(values);
        let ranges = range::ranges_from_positions(&positions);
        self.remove(&ranges)
    }

    /// Moves the entries at `ranges` in front of the entry currently at
    /// `pos`, or to the end when `pos` is `None`. Returns where the block
    /// ended up.
    pub fn move_items(&mut self, ranges: &[Range], pos: Option<usize>) -> Result<Interval> {
        let len = self.group().len();
        let dest = match pos {
            Some(p) if p >= len => return Err(GroupError::out_of_range(p, len)),
            Some(p) => p,
            None => len,
        };
        range::validate_ranges(ranges, len)?;
        if ranges.iter().any(|r| r.contains(dest)) {
            return Err(RangeError::DestinationInside(dest).into());
        }
        if ranges.is_empty() {
            return Ok(Interval::new(dest, 0));
        }

        self.tree
            .signals
            .items_about_to_move
            .emit((self.id, ranges.to_vec(), dest));
        let block = range::move_ranges(&mut self.tree.groups[self.id].list, ranges, dest)?;
        tracing::trace!(
            target: "zkanji_groups::tree",
            index = block.index,
            count = block.count,
            "items moved"
        );
        self.tree
            .signals
            .items_moved
            .emit((self.id, ranges.to_vec(), dest));
        Ok(block)
    }

    /// Removes every entry.
    pub fn clear(&mut self) -> usize {
        let len = self.group().len();
        if len == 0 {
            return 0;
        }
        let all = vec![Range::new(0, len - 1)];
        self.tree
            .signals
            .items_about_to_be_removed
            .emit((self.id, all.clone()));
        let removed = std::mem::take(&mut self.tree.groups[self.id].list);
        self.tree.unindex(self.id, &removed);
        self.tree.signals.items_removed.emit((self.id, all));
        len
    }

    /// Renames the group.
    pub fn rename(&mut self, name: &str) -> Result<()> {
        self.tree.rename_group(self.id, name)
    }

    /// Replaces the whole list, announcing it with `items_changed`.
    pub(crate) fn replace_list(&mut self, list: Vec<K::Index>) {
        let old = std::mem::replace(&mut self.tree.groups[self.id].list, list);
        self.tree.unindex(self.id, &old);
        let fresh = self.tree.groups[self.id].list.clone();
        self.tree.index_values(self.id, &fresh);
        self.tree.signals.items_changed.emit(self.id);
    }
}
