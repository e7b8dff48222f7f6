//! Text rendering of group trees for diagnostics and tests.
//!
//! ```
//! use zkanji_groups::debug::{GroupTreeDebug, TreeFormatOptions, TreeStyle};
//! use zkanji_groups::WordGroups;
//!
//! let mut tree = WordGroups::new();
//! let root = tree.root();
//! tree.add_category(root, "JLPT").unwrap();
//! tree.add_group(root, "Food").unwrap();
//!
//! let debug = GroupTreeDebug::with_options(TreeFormatOptions {
//!     style: TreeStyle::Ascii,
//!     ..TreeFormatOptions::default()
//! });
//! assert_eq!(debug.format(&tree), "words\n+-- JLPT/\n`-- Food [0]\n");
//! ```

use crate::kind::GroupKind;
use crate::tree::{CategoryId, GroupTree, NodeRef};

/// Connector characters used when drawing a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Indentation and a dash only.
    Compact,
}

impl TreeStyle {
    /// (vertical, branch, last branch)
    fn parts(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Ascii => ("|", "+--", "`--"),
            Self::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            Self::Compact => (" ", "-", "-"),
        }
    }
}

/// Configuration for [`GroupTreeDebug`].
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// Connector characters.
    pub style: TreeStyle,
    /// Append the entry count to every group.
    pub show_counts: bool,
    /// Deepest level printed; the root's children are level 1.
    pub max_depth: Option<usize>,
    /// Spaces after a vertical connector.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_counts: true,
            max_depth: None,
            indent_size: 3,
        }
    }
}

impl TreeFormatOptions {
    /// Names only.
    pub fn minimal() -> Self {
        Self {
            show_counts: false,
            ..Default::default()
        }
    }
}

/// Renders a [`GroupTree`] as indented text.
///
/// Categories are printed with a trailing `/`, before the groups of the same
/// parent.
#[derive(Debug, Clone, Default)]
pub struct GroupTreeDebug {
    options: TreeFormatOptions,
}

impl GroupTreeDebug {
    /// A renderer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Renders the whole tree, headed by its type.
    pub fn format<K: GroupKind>(&self, tree: &GroupTree<K>) -> String {
        let mut output = format!("{}\n", tree.group_type());
        self.format_children(tree, tree.root(), 1, &mut String::new(), &mut output);
        output
    }

    /// Renders the subtree under `category`, headed by its encoded path.
    pub fn format_subtree<K: GroupKind>(
        &self,
        tree: &GroupTree<K>,
        category: CategoryId,
    ) -> String {
        let mut output = tree.full_encoded_name(category.into()).unwrap_or_default();
        output.push_str("/\n");
        self.format_children(tree, category, 1, &mut String::new(), &mut output);
        output
    }

    fn format_children<K: GroupKind>(
        &self,
        tree: &GroupTree<K>,
        category: CategoryId,
        depth: usize,
        indent: &mut String,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        let children: Vec<NodeRef> = tree
            .categories(category)
            .iter()
            .map(|&c| NodeRef::Category(c))
            .chain(tree.groups(category).iter().map(|&g| NodeRef::Group(g)))
            .collect();
        let (vertical, branch, last_branch) = self.options.style.parts();

        for (i, node) in children.iter().enumerate() {
            let is_last = i + 1 == children.len();
            output.push_str(indent);
            output.push_str(if is_last { last_branch } else { branch });
            output.push(' ');
            output.push_str(tree.name(*node).unwrap_or_default());

            match node {
                NodeRef::Category(id) => {
                    output.push_str("/\n");
                    let saved = indent.len();
                    indent.push_str(if is_last { " " } else { vertical });
                    indent.extend(std::iter::repeat_n(' ', self.options.indent_size));
                    self.format_children(tree, *id, depth + 1, indent, output);
                    indent.truncate(saved);
                }
                NodeRef::Group(id) => {
                    if self.options.show_counts {
                        let len = tree.group(*id).map_or(0, |g| g.len());
                        output.push_str(&format!(" [{len}]"));
                    }
                    output.push('\n');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::{KanjiGroups, WordGroups};

    fn ascii() -> GroupTreeDebug {
        GroupTreeDebug::with_options(TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::default()
        })
    }

    fn sample() -> WordGroups {
        let mut tree = WordGroups::new();
        let root = tree.root();
        tree.add_category(root, "JLPT").unwrap();
        let jlpt = tree.category_at(root, 0).unwrap();
        tree.add_group(jlpt, "N5").unwrap();
        tree.add_group(jlpt, "N4").unwrap();
        let n5 = tree.group_at(jlpt, 0).unwrap();
        tree.group_mut(n5).unwrap().add_many(&[1, 2, 3]);
        tree.add_group(root, "Food").unwrap();
        tree
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(ascii().format(&KanjiGroups::new()), "kanji\n");
    }

    #[test]
    fn test_format_hierarchy() {
        let text = ascii().format(&sample());
        assert_eq!(
            text,
            "words\n+-- JLPT/\n|   +-- N5 [3]\n|   `-- N4 [0]\n`-- Food [0]\n"
        );
    }

    #[test]
    fn test_format_minimal_with_depth_limit() {
        let debug = GroupTreeDebug::with_options(TreeFormatOptions {
            style: TreeStyle::Ascii,
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        });
        assert_eq!(debug.format(&sample()), "words\n+-- JLPT/\n`-- Food\n");
    }

    #[test]
    fn test_format_subtree() {
        let tree = sample();
        let jlpt = tree.category_at(tree.root(), 0).unwrap();
        let text =
            GroupTreeDebug::with_options(TreeFormatOptions::minimal()).format_subtree(&tree, jlpt);
        assert_eq!(text, "JLPT/\n\u{251c}\u{2500}\u{2500} N5\n\u{2514}\u{2500}\u{2500} N4\n");
    }
}
