//! Tree models projecting a group tree into rows.
//!
//! [`GroupTreeModel`] shows the categories below one category of a
//! [`GroupTree`], optionally with their groups, as a lazily materialised
//! tree. Each category's rows are its sub-categories, then its groups, then
//! the "add new" placeholder rows. The model listens to the tree's
//! [`GroupSignals`](crate::GroupSignals) and turns every structural change
//! into row insertions, removals and moves. While a name filter is set or
//! empty categories are hidden, row positions no longer follow tree indices
//! and any structural change resets the model instead.
//!
//! [`CheckedGroupTreeModel`] adds a checkbox to every category and group.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use zkanji_core::{ConnectionGuard, Range};

use super::index::ModelIndex;
use super::lazy::{LazyTreeModel, TreeSource};
use super::role::{CheckState, ItemData, ItemRole};
use super::traits::{ItemFlags, ModelSignals};
use crate::config::GroupSettings;
use crate::kind::GroupKind;
use crate::tree::{CategoryId, GroupId, GroupTree, NodeRef};

/// What a row of a [`GroupTreeModel`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupNode {
    /// A category.
    Category(CategoryId),
    /// A group.
    Group(GroupId),
    /// Placeholder for creating a category in the given category.
    NewCategory(CategoryId),
    /// Placeholder for creating a group in the given category.
    NewGroup(CategoryId),
}

impl GroupNode {
    /// The tree node behind the row, `None` for placeholders.
    pub fn node(self) -> Option<NodeRef> {
        match self {
            GroupNode::Category(id) => Some(NodeRef::Category(id)),
            GroupNode::Group(id) => Some(NodeRef::Group(id)),
            GroupNode::NewCategory(_) | GroupNode::NewGroup(_) => None,
        }
    }

    /// Returns `true` for "add new" rows.
    pub fn is_placeholder(self) -> bool {
        matches!(self, GroupNode::NewCategory(_) | GroupNode::NewGroup(_))
    }
}

impl From<NodeRef> for GroupNode {
    fn from(node: NodeRef) -> Self {
        match node {
            NodeRef::Category(id) => GroupNode::Category(id),
            NodeRef::Group(id) => GroupNode::Group(id),
        }
    }
}

#[derive(Debug, Clone)]
struct ModelOptions {
    show_groups: bool,
    hide_empty: bool,
    show_placeholders: bool,
    category_text: String,
    group_text: String,
    /// Lowercase.
    filter: Option<String>,
}

impl ModelOptions {
    fn new(settings: &GroupSettings, show_groups: bool) -> Self {
        Self {
            show_groups,
            hide_empty: settings.hide_empty_categories,
            show_placeholders: settings.show_placeholders,
            category_text: settings.placeholder_category_text.clone(),
            group_text: settings.placeholder_group_text.clone(),
            filter: None,
        }
    }

    fn rows_follow_tree(&self) -> bool {
        self.filter.is_none() && !self.hide_empty
    }

    fn shows_placeholders(&self) -> bool {
        self.show_placeholders && self.filter.is_none()
    }
}

/// A group tree seen through the model's options.
struct GroupSource<'a, K: GroupKind> {
    tree: &'a GroupTree<K>,
    top: CategoryId,
    options: &'a ModelOptions,
}

impl<K: GroupKind> GroupSource<'_, K> {
    fn category_of(&self, parent: Option<GroupNode>) -> Option<CategoryId> {
        match parent {
            None => Some(self.top),
            Some(GroupNode::Category(id)) => Some(id),
            Some(_) => None,
        }
    }

    fn name_matches(&self, name: &str) -> bool {
        self.options
            .filter
            .as_deref()
            .is_none_or(|filter| name.to_lowercase().contains(filter))
    }

    fn has_groups(&self, category: CategoryId) -> bool {
        let mut found = false;
        self.tree.walk_groups(category, |_, _| found = true);
        found
    }

    fn group_visible(&self, id: GroupId) -> bool {
        self.tree
            .group(id)
            .is_some_and(|group| self.name_matches(group.name()))
    }

    fn category_visible(&self, id: CategoryId) -> bool {
        if self.options.hide_empty && !self.has_groups(id) {
            return false;
        }
        self.options.filter.is_none() || self.subtree_matches(id)
    }

    fn subtree_matches(&self, id: CategoryId) -> bool {
        self.tree
            .name(id.into())
            .is_some_and(|name| self.name_matches(name))
            || self
                .tree
                .categories(id)
                .iter()
                .any(|&sub| self.subtree_matches(sub))
            || (self.options.show_groups
                && self
                    .tree
                    .groups(id)
                    .iter()
                    .any(|&group| self.group_visible(group)))
    }

    fn rows(&self, parent: Option<GroupNode>) -> Vec<GroupNode> {
        let Some(category) = self.category_of(parent) else {
            return Vec::new();
        };
        if !self.tree.contains(category.into()) {
            return Vec::new();
        }

        let mut rows: Vec<GroupNode> = self
            .tree
            .categories(category)
            .iter()
            .filter(|&&id| self.category_visible(id))
            .map(|&id| GroupNode::Category(id))
            .collect();
        if self.options.show_groups {
            rows.extend(
                self.tree
                    .groups(category)
                    .iter()
                    .filter(|&&id| self.group_visible(id))
                    .map(|&id| GroupNode::Group(id)),
            );
        }
        if self.options.shows_placeholders() {
            rows.push(GroupNode::NewCategory(category));
            if self.options.show_groups {
                rows.push(GroupNode::NewGroup(category));
            }
        }
        rows
    }
}

impl<K: GroupKind> TreeSource for GroupSource<'_, K> {
    type Key = GroupNode;

    fn child_count(&self, parent: Option<GroupNode>) -> usize {
        self.rows(parent).len()
    }

    fn child_key(&self, parent: Option<GroupNode>, row: usize) -> Option<GroupNode> {
        self.rows(parent).get(row).copied()
    }

    fn children(&self, parent: Option<GroupNode>) -> Vec<GroupNode> {
        self.rows(parent)
    }

    fn has_children(&self, key: GroupNode) -> bool {
        match key {
            GroupNode::Category(_) if self.options.shows_placeholders() => true,
            GroupNode::Category(_) => !self.rows(Some(key)).is_empty(),
            _ => false,
        }
    }

    fn data(&self, key: GroupNode, role: ItemRole) -> ItemData {
        match (key, role) {
            (GroupNode::NewCategory(_), ItemRole::Display) => {
                ItemData::from(self.options.category_text.as_str())
            }
            (GroupNode::NewGroup(_), ItemRole::Display) => {
                ItemData::from(self.options.group_text.as_str())
            }
            (GroupNode::NewCategory(_) | GroupNode::NewGroup(_), ItemRole::Edit) => {
                ItemData::from("")
            }
            (GroupNode::Category(_) | GroupNode::Group(_), ItemRole::Display | ItemRole::Edit) => {
                key.node()
                    .and_then(|node| self.tree.name(node))
                    .map_or(ItemData::None, ItemData::from)
            }
            (GroupNode::Category(id), ItemRole::ToolTip) => {
                ItemData::from(self.tree.full_encoded_name(id.into()))
            }
            (GroupNode::Group(id), ItemRole::ToolTip) => {
                let path = self.tree.full_encoded_name(id.into());
                let len = self.tree.group(id).map_or(0, |g| g.len());
                ItemData::from(path.map(|path| format!("{path} ({len})")))
            }
            _ => ItemData::None,
        }
    }

    fn flags(&self, key: GroupNode) -> ItemFlags {
        match key {
            GroupNode::Category(_) => ItemFlags::editable().with_drag(true).with_drop(true),
            GroupNode::Group(_) => ItemFlags::editable()
                .with_drag(true)
                .with_never_has_children(true),
            GroupNode::NewCategory(_) | GroupNode::NewGroup(_) => {
                ItemFlags::editable().with_never_has_children(true)
            }
        }
    }
}

/// State shared between a model and its tree signal handlers.
struct Shared {
    top: CategoryId,
    lazy: LazyTreeModel<GroupNode>,
    options: Mutex<ModelOptions>,
}

impl Shared {
    fn parent_key(&self, category: CategoryId) -> Option<GroupNode> {
        (category != self.top).then_some(GroupNode::Category(category))
    }

    /// Resets the model when rows cannot be mapped to tree indices. Returns
    /// `true` if it did.
    fn reset_if_projected(&self) -> bool {
        let follows = self.options.lock().rows_follow_tree();
        if !follows {
            self.lazy.reset();
        }
        !follows
    }

    fn show_groups(&self) -> bool {
        self.options.lock().show_groups
    }

    /// Row of the first group under `category`.
    fn group_offset(&self, category: CategoryId) -> usize {
        self.lazy
            .cached_children(self.parent_key(category))
            .map_or(0, |rows| {
                rows.iter()
                    .filter(|row| matches!(row, GroupNode::Category(_)))
                    .count()
            })
    }

    fn cached_row(&self, parent: CategoryId, row: usize) -> Option<GroupNode> {
        self.lazy
            .cached_children(self.parent_key(parent))?
            .get(row)
            .copied()
    }

    fn category_added(&self, parent: CategoryId, index: usize, id: CategoryId) {
        if self.reset_if_projected() {
            return;
        }
        self.lazy
            .insert_rows(self.parent_key(parent), index, &[GroupNode::Category(id)]);
    }

    fn category_deleted(&self, parent: CategoryId, index: usize, id: CategoryId) {
        if id == self.top {
            self.lazy.reset();
            return;
        }
        if self.reset_if_projected() {
            return;
        }
        self.lazy.remove_rows(self.parent_key(parent), index, index);
    }

    fn category_renamed(&self, parent: CategoryId, index: usize) {
        if self.reset_if_projected() {
            return;
        }
        if let Some(key) = self.cached_row(parent, index) {
            self.lazy
                .data_changed(key, vec![ItemRole::Display, ItemRole::Edit, ItemRole::ToolTip]);
        }
    }

    fn category_moved(
        &self,
        src: CategoryId,
        index: usize,
        dest: CategoryId,
        dest_index: usize,
        id: CategoryId,
    ) {
        if self.reset_if_projected() {
            return;
        }
        self.lazy.move_rows(
            self.parent_key(src),
            index,
            index,
            self.parent_key(dest),
            dest_index,
            &[GroupNode::Category(id)],
        );
    }

    fn categories_moved(
        &self,
        src: CategoryId,
        ranges: &[Range],
        dest: CategoryId,
        dest_index: usize,
        ids: &[CategoryId],
    ) {
        if self.reset_if_projected() {
            return;
        }
        let keys: Vec<GroupNode> = ids.iter().map(|&id| GroupNode::Category(id)).collect();
        self.lazy.move_ranges(
            self.parent_key(src),
            ranges,
            self.parent_key(dest),
            dest_index,
            &keys,
        );
    }

    fn group_added(&self, parent: CategoryId, index: usize, id: GroupId) {
        if self.reset_if_projected() || !self.show_groups() {
            return;
        }
        let row = self.group_offset(parent) + index;
        self.lazy
            .insert_rows(self.parent_key(parent), row, &[GroupNode::Group(id)]);
    }

    fn group_deleted(&self, parent: CategoryId, index: usize) {
        if self.reset_if_projected() || !self.show_groups() {
            return;
        }
        let row = self.group_offset(parent) + index;
        self.lazy.remove_rows(self.parent_key(parent), row, row);
    }

    fn group_renamed(&self, parent: CategoryId, index: usize) {
        if self.reset_if_projected() || !self.show_groups() {
            return;
        }
        let row = self.group_offset(parent) + index;
        if let Some(key) = self.cached_row(parent, row) {
            self.lazy
                .data_changed(key, vec![ItemRole::Display, ItemRole::Edit, ItemRole::ToolTip]);
        }
    }

    fn group_moved(
        &self,
        src: CategoryId,
        index: usize,
        dest: CategoryId,
        dest_index: usize,
        id: GroupId,
    ) {
        if self.reset_if_projected() || !self.show_groups() {
            return;
        }
        let row = self.group_offset(src) + index;
        self.lazy.move_rows(
            self.parent_key(src),
            row,
            row,
            self.parent_key(dest),
            self.group_offset(dest) + dest_index,
            &[GroupNode::Group(id)],
        );
    }

    fn groups_moved(
        &self,
        src: CategoryId,
        ranges: &[Range],
        dest: CategoryId,
        dest_index: usize,
        ids: &[GroupId],
    ) {
        if self.reset_if_projected() || !self.show_groups() {
            return;
        }
        let offset = self.group_offset(src);
        let rows: Vec<Range> = ranges
            .iter()
            .map(|r| Range::new(r.first + offset, r.last + offset))
            .collect();
        let keys: Vec<GroupNode> = ids.iter().map(|&id| GroupNode::Group(id)).collect();
        self.lazy.move_ranges(
            self.parent_key(src),
            &rows,
            self.parent_key(dest),
            self.group_offset(dest) + dest_index,
            &keys,
        );
    }

    fn items_changed(&self, id: GroupId) {
        self.lazy.data_changed(GroupNode::Group(id), vec![ItemRole::ToolTip]);
    }
}

fn connect<K: GroupKind>(tree: &GroupTree<K>, shared: &Arc<Shared>) -> Vec<ConnectionGuard> {
    let signals = tree.signals();
    let mut guards = Vec::new();

    let s = shared.clone();
    guards.push(
        signals
            .category_added
            .connect_scoped(move |&(parent, index, id)| s.category_added(parent, index, id)),
    );
    let s = shared.clone();
    guards.push(
        signals
            .category_deleted
            .connect_scoped(move |&(parent, index, id)| s.category_deleted(parent, index, id)),
    );
    let s = shared.clone();
    guards.push(
        signals
            .category_renamed
            .connect_scoped(move |&(parent, index)| s.category_renamed(parent, index)),
    );
    let s = shared.clone();
    guards.push(signals.category_moved.connect_scoped(
        move |&(src, index, dest, dest_index, id)| {
            s.category_moved(src, index, dest, dest_index, id)
        },
    ));
    let s = shared.clone();
    guards.push(signals.categories_moved.connect_scoped(
        move |(src, ranges, dest, dest_index, ids)| {
            s.categories_moved(*src, ranges, *dest, *dest_index, ids)
        },
    ));

    let s = shared.clone();
    guards.push(
        signals
            .group_added
            .connect_scoped(move |&(parent, index, id)| s.group_added(parent, index, id)),
    );
    let s = shared.clone();
    guards.push(signals.group_deleted.connect_scoped(move |&(parent, index, _)| {
        // Groups inside a deleted category go with their category row.
        if let Some(parent) = parent {
            s.group_deleted(parent, index);
        }
    }));
    let s = shared.clone();
    guards.push(
        signals
            .group_renamed
            .connect_scoped(move |&(parent, index)| s.group_renamed(parent, index)),
    );
    let s = shared.clone();
    guards.push(signals.group_moved.connect_scoped(
        move |&(src, index, dest, dest_index, id)| s.group_moved(src, index, dest, dest_index, id),
    ));
    let s = shared.clone();
    guards.push(signals.groups_moved.connect_scoped(
        move |(src, ranges, dest, dest_index, ids)| {
            s.groups_moved(*src, ranges, *dest, *dest_index, ids)
        },
    ));

    let s = shared.clone();
    guards.push(
        signals
            .items_inserted
            .connect_scoped(move |(id, _)| s.items_changed(*id)),
    );
    let s = shared.clone();
    guards.push(
        signals
            .items_removed
            .connect_scoped(move |(id, _)| s.items_changed(*id)),
    );
    let s = shared.clone();
    guards.push(signals.items_changed.connect_scoped(move |id| s.items_changed(*id)));

    let s = shared.clone();
    guards.push(signals.groups_reset.connect_scoped(move |_| s.lazy.reset()));

    guards
}

/// Categories (and optionally groups) below one category of a group tree.
///
/// The model does not borrow the tree; queries take it as an argument and
/// must be given the tree the model was created for. The model stops
/// following the tree when dropped.
pub struct GroupTreeModel<K: GroupKind> {
    shared: Arc<Shared>,
    _connections: Vec<ConnectionGuard>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: GroupKind> GroupTreeModel<K> {
    /// A model over the whole tree.
    pub fn new(tree: &GroupTree<K>, settings: &GroupSettings, show_groups: bool) -> Self {
        Self::with_root(tree, tree.root(), settings, show_groups)
    }

    /// A model whose top-level rows are the children of `top`.
    pub fn with_root(
        tree: &GroupTree<K>,
        top: CategoryId,
        settings: &GroupSettings,
        show_groups: bool,
    ) -> Self {
        let shared = Arc::new(Shared {
            top,
            lazy: LazyTreeModel::new(),
            options: Mutex::new(ModelOptions::new(settings, show_groups)),
        });
        let connections = connect(tree, &shared);
        tracing::debug!(
            target: "zkanji_groups::model",
            ?top,
            show_groups,
            "group tree model created"
        );
        Self {
            shared,
            _connections: connections,
            _kind: PhantomData,
        }
    }

    /// The model's change notifications.
    pub fn signals(&self) -> &ModelSignals {
        self.shared.lazy.signals()
    }

    /// The category whose children are the top-level rows.
    pub fn top(&self) -> CategoryId {
        self.shared.top
    }

    /// Returns `true` if groups are shown as rows.
    pub fn shows_groups(&self) -> bool {
        self.shared.show_groups()
    }

    /// The current name filter, lowercase.
    pub fn filter(&self) -> Option<String> {
        self.shared.options.lock().filter.clone()
    }

    /// Shows only rows whose name contains `filter`, ignoring case, and the
    /// categories above them. An empty filter shows everything.
    pub fn set_filter(&self, filter: Option<&str>) {
        let filter = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);
        {
            let mut options = self.shared.options.lock();
            if options.filter == filter {
                return;
            }
            options.filter = filter;
        }
        self.shared.lazy.reset();
    }

    /// Applies the model-related parts of `settings`.
    pub fn apply_settings(&self, settings: &GroupSettings) {
        {
            let mut options = self.shared.options.lock();
            let show_groups = options.show_groups;
            let filter = options.filter.take();
            *options = ModelOptions {
                filter,
                ..ModelOptions::new(settings, show_groups)
            };
        }
        self.shared.lazy.reset();
    }

    fn with_source<R>(&self, tree: &GroupTree<K>, f: impl FnOnce(&GroupSource<'_, K>) -> R) -> R {
        let options = self.shared.options.lock().clone();
        f(&GroupSource {
            tree,
            top: self.shared.top,
            options: &options,
        })
    }

    /// Number of rows under `parent`.
    pub fn row_count(&self, tree: &GroupTree<K>, parent: &ModelIndex) -> usize {
        self.with_source(tree, |source| self.shared.lazy.row_count(source, parent))
    }

    /// Index of the row at `row` under `parent`.
    pub fn index(&self, tree: &GroupTree<K>, row: usize, parent: &ModelIndex) -> ModelIndex {
        self.with_source(tree, |source| self.shared.lazy.index(source, row, parent))
    }

    /// Parent of a row.
    pub fn parent(&self, index: &ModelIndex) -> ModelIndex {
        self.shared.lazy.parent(index)
    }

    /// Data of a row for a role.
    pub fn data(&self, tree: &GroupTree<K>, index: &ModelIndex, role: ItemRole) -> ItemData {
        self.with_source(tree, |source| self.shared.lazy.data(source, index, role))
    }

    /// Flags of a row.
    pub fn flags(&self, tree: &GroupTree<K>, index: &ModelIndex) -> ItemFlags {
        self.with_source(tree, |source| self.shared.lazy.flags(source, index))
    }

    /// Returns `true` if `parent` has rows below it.
    pub fn has_children(&self, tree: &GroupTree<K>, parent: &ModelIndex) -> bool {
        self.with_source(tree, |source| self.shared.lazy.has_children(source, parent))
    }

    /// What the row at `index` shows.
    pub fn node_at(&self, index: &ModelIndex) -> Option<GroupNode> {
        self.shared.lazy.key(index)
    }

    /// Index of the row showing `node`, materialising the rows above it.
    /// Invalid when the node is not below the model's top category or is
    /// filtered out.
    pub fn index_of(&self, tree: &GroupTree<K>, node: GroupNode) -> ModelIndex {
        let mut chain = vec![node];
        let mut category = match node {
            GroupNode::Category(id) => tree.parent(id.into()),
            GroupNode::Group(id) => tree.parent(id.into()),
            GroupNode::NewCategory(id) | GroupNode::NewGroup(id) => Some(id),
        };
        loop {
            match category {
                Some(id) if id == self.shared.top => break,
                Some(id) => {
                    chain.push(GroupNode::Category(id));
                    category = tree.parent(id.into());
                }
                None => return ModelIndex::invalid(),
            }
        }

        let mut index = ModelIndex::invalid();
        for key in chain.into_iter().rev() {
            self.row_count(tree, &index);
            index = self.shared.lazy.index_of_key(key);
            if !index.is_valid() {
                break;
            }
        }
        index
    }
}

/// A [`GroupTreeModel`] with a checkbox on every category and group.
///
/// Groups keep their own state. A category is checked when every group below
/// it is, partially checked when some are, and checking it checks every group
/// below it.
pub struct CheckedGroupTreeModel<K: GroupKind> {
    inner: GroupTreeModel<K>,
    checked: Arc<Mutex<HashSet<GroupId>>>,
    _connections: Vec<ConnectionGuard>,
}

impl<K: GroupKind> CheckedGroupTreeModel<K> {
    /// A checkable model over the whole tree.
    pub fn new(tree: &GroupTree<K>, settings: &GroupSettings, show_groups: bool) -> Self {
        Self::with_root(tree, tree.root(), settings, show_groups)
    }

    /// A checkable model whose top-level rows are the children of `top`.
    pub fn with_root(
        tree: &GroupTree<K>,
        top: CategoryId,
        settings: &GroupSettings,
        show_groups: bool,
    ) -> Self {
        let inner = GroupTreeModel::with_root(tree, top, settings, show_groups);
        let checked = Arc::new(Mutex::new(HashSet::new()));

        let state = checked.clone();
        let deleted = tree
            .signals()
            .group_deleted
            .connect_scoped(move |(_, _, id)| {
                state.lock().remove(id);
            });
        let state = checked.clone();
        let reset = tree
            .signals()
            .groups_reset
            .connect_scoped(move |_| state.lock().clear());

        Self {
            inner,
            checked,
            _connections: vec![deleted, reset],
        }
    }

    /// The unchecked model underneath.
    pub fn model(&self) -> &GroupTreeModel<K> {
        &self.inner
    }

    /// The model's change notifications.
    pub fn signals(&self) -> &ModelSignals {
        self.inner.signals()
    }

    /// Number of rows under `parent`.
    pub fn row_count(&self, tree: &GroupTree<K>, parent: &ModelIndex) -> usize {
        self.inner.row_count(tree, parent)
    }

    /// Index of the row at `row` under `parent`.
    pub fn index(&self, tree: &GroupTree<K>, row: usize, parent: &ModelIndex) -> ModelIndex {
        self.inner.index(tree, row, parent)
    }

    /// Parent of a row.
    pub fn parent(&self, index: &ModelIndex) -> ModelIndex {
        self.inner.parent(index)
    }

    /// What the row at `index` shows.
    pub fn node_at(&self, index: &ModelIndex) -> Option<GroupNode> {
        self.inner.node_at(index)
    }

    /// Index of the row showing `node`.
    pub fn index_of(&self, tree: &GroupTree<K>, node: GroupNode) -> ModelIndex {
        self.inner.index_of(tree, node)
    }

    /// Data of a row; answers [`ItemRole::CheckState`] for categories and
    /// groups.
    pub fn data(&self, tree: &GroupTree<K>, index: &ModelIndex, role: ItemRole) -> ItemData {
        if role != ItemRole::CheckState {
            return self.inner.data(tree, index, role);
        }
        match self.node_at(index) {
            Some(node @ (GroupNode::Category(_) | GroupNode::Group(_))) => {
                ItemData::from(self.check_state(tree, node))
            }
            _ => ItemData::None,
        }
    }

    /// Flags of a row.
    pub fn flags(&self, tree: &GroupTree<K>, index: &ModelIndex) -> ItemFlags {
        let flags = self.inner.flags(tree, index);
        match self.node_at(index) {
            Some(GroupNode::Category(_)) => flags.with_checkable(true).with_tristate(true),
            Some(GroupNode::Group(_)) => flags.with_checkable(true),
            _ => flags,
        }
    }

    /// Returns `true` if the row has rows below it.
    pub fn has_children(&self, tree: &GroupTree<K>, parent: &ModelIndex) -> bool {
        self.inner.has_children(tree, parent)
    }

    /// Checkbox state of a category or group.
    pub fn check_state(&self, tree: &GroupTree<K>, node: GroupNode) -> CheckState {
        let checked = self.checked.lock();
        match node {
            GroupNode::Group(id) if checked.contains(&id) => CheckState::Checked,
            GroupNode::Category(id) => {
                let (mut total, mut on) = (0usize, 0usize);
                tree.walk_groups(id, |group, _| {
                    total += 1;
                    on += usize::from(checked.contains(&group));
                });
                match on {
                    0 => CheckState::Unchecked,
                    n if n == total => CheckState::Checked,
                    _ => CheckState::PartiallyChecked,
                }
            }
            _ => CheckState::Unchecked,
        }
    }

    /// Returns `true` if the group is checked.
    pub fn is_checked(&self, group: GroupId) -> bool {
        self.checked.lock().contains(&group)
    }

    /// Checked groups below the model's top category, in walk order.
    pub fn checked_groups(&self, tree: &GroupTree<K>) -> Vec<GroupId> {
        let checked = self.checked.lock();
        let mut groups = Vec::new();
        tree.walk_groups(self.inner.top(), |id, _| {
            if checked.contains(&id) {
                groups.push(id);
            }
        });
        groups
    }

    /// Checks or unchecks a group, or every group below a category. Returns
    /// `false` for placeholders and nodes not in the tree.
    pub fn set_checked(&self, tree: &GroupTree<K>, node: GroupNode, checked: bool) -> bool {
        let Some(tree_node) = node.node().filter(|n| tree.contains(*n)) else {
            return false;
        };

        let mut changed = Vec::new();
        {
            let mut state = self.checked.lock();
            let mut apply = |id: GroupId| {
                let flipped = if checked {
                    state.insert(id)
                } else {
                    state.remove(&id)
                };
                if flipped {
                    changed.push(id);
                }
            };
            match node {
                GroupNode::Group(id) => apply(id),
                GroupNode::Category(id) => tree.walk_groups(id, |group, _| apply(group)),
                _ => {}
            }
        }
        if changed.is_empty() {
            return true;
        }

        let lazy = &self.inner.shared.lazy;
        let roles = || vec![ItemRole::CheckState];
        if let GroupNode::Category(id) = node {
            for category in subtree_categories(tree, id) {
                lazy.data_changed(GroupNode::Category(category), roles());
            }
        }
        for id in changed {
            lazy.data_changed(GroupNode::Group(id), roles());
        }
        let mut parent = tree.parent(tree_node);
        while let Some(category) = parent.filter(|c| *c != self.inner.top()) {
            lazy.data_changed(GroupNode::Category(category), roles());
            parent = tree.parent(category.into());
        }
        true
    }
}

fn subtree_categories<K: GroupKind>(tree: &GroupTree<K>, category: CategoryId) -> Vec<CategoryId> {
    let mut found = vec![category];
    let mut next = 0;
    while let Some(&id) = found.get(next) {
        found.extend_from_slice(tree.categories(id));
        next += 1;
    }
    found
}
