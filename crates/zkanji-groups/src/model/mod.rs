//! Tree models that present group trees to views.
//!
//! The types here follow the model/view split: a model answers row queries
//! by [`ModelIndex`] and reports changes through [`ModelSignals`], a view
//! draws whatever the model reports.
//!
//! - [`LazyTreeModel`]: a generic tree model over any [`TreeSource`], whose
//!   rows are read the first time they are needed
//! - [`GroupTreeModel`]: categories and groups of a [`GroupTree`], kept in
//!   sync with the tree's signals
//! - [`CheckedGroupTreeModel`]: the same with checkboxes
//!
//! # Example
//!
//! ```
//! use zkanji_groups::model::{GroupTreeModel, ItemRole, ModelIndex};
//! use zkanji_groups::{GroupSettings, WordGroups};
//!
//! let mut tree = WordGroups::new();
//! let root = tree.root();
//! tree.add_category(root, "JLPT").unwrap();
//!
//! let settings = GroupSettings { show_placeholders: false, ..Default::default() };
//! let model = GroupTreeModel::new(&tree, &settings, true);
//! assert_eq!(model.row_count(&tree, &ModelIndex::invalid()), 1);
//!
//! tree.add_group(root, "Food").unwrap();
//! let food = model.index(&tree, 1, &ModelIndex::invalid());
//! assert_eq!(model.data(&tree, &food, ItemRole::Display).as_string(), Some("Food"));
//! ```
//!
//! [`GroupTree`]: crate::GroupTree

mod group_model;
mod index;
mod lazy;
mod role;
mod traits;

pub use group_model::{CheckedGroupTreeModel, GroupNode, GroupTreeModel};
pub use index::ModelIndex;
pub use lazy::{ItemId, LazyTreeModel, TreeItems, TreeSource};
pub use role::{CheckState, ItemData, ItemRole};
pub use traits::{ItemFlags, ModelSignals};
