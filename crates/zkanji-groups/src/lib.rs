//! Word and kanji groups for the zkanji dictionary.
//!
//! Users collect dictionary words and kanji into named groups, and file the
//! groups into a tree of named categories. This crate holds that tree:
//!
//! - **Trees**: [`GroupTree`] owns the categories and groups of one
//!   dictionary, as [`WordGroups`] or [`KanjiGroups`]; [`Groups`] bundles
//!   both
//! - **Groups**: ordered, duplicate-free index lists edited through
//!   [`GroupMut`]
//! - **Signals**: every change is announced through [`GroupSignals`], before
//!   and after it happens
//! - **Paths**: nodes can be named by their `/`-separated full encoded name
//! - **Files**: binary group files with legacy support, and TOML settings
//! - **Models**: lazily materialised tree models for views, in [`model`]
//!
//! # Example
//!
//! ```
//! use zkanji_groups::WordGroups;
//!
//! let mut tree = WordGroups::new();
//! let root = tree.root();
//! tree.add_category(root, "JLPT").unwrap();
//! let jlpt = tree.category_at(root, 0).unwrap();
//! tree.add_group(jlpt, "N5").unwrap();
//!
//! let n5 = tree.group_from_encoded_name(root, "JLPT/N5", false).unwrap();
//! tree.group_mut(n5).unwrap().add_many(&[3, 1, 4, 1, 5]);
//!
//! assert_eq!(tree.group(n5).unwrap().indexes(), &[3, 1, 4, 5]);
//! assert_eq!(tree.word_groups(4), &[n5]);
//! ```

mod config;
mod encoding;
mod error;
mod file;
mod group;
mod groups;
mod kind;
mod persist;
mod signals;
mod tree;
mod words;

pub mod debug;
pub mod model;

pub use config::GroupSettings;
pub use encoding::{decode_path, encode_path, escape_segment};
pub use error::{GroupError, Result};
pub use file::AtomicWriter;
pub use group::{Group, InsertOutcome, KanjiGroup, WordGroup};
pub use groups::{Dictionary, GroupRootMut, GroupRootRef, Groups};
pub use kind::{GroupKind, GroupType, Kanji, Words};
pub use signals::GroupSignals;
pub use tree::{Category, CategoryId, GroupId, GroupMut, GroupTree, NodeRef};
pub use words::{KanjiGroups, WordGroups};
