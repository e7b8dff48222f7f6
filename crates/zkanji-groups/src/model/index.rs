//! Row addresses handed out by the tree models.

use std::fmt;
use std::sync::Arc;

/// Address of one row of a tree model: its row under the parent, the
/// parent's own address and the model's internal id of the cached item.
///
/// The default value is the invalid index. It stands for the invisible root
/// and for rows that do not exist.
///
/// An index is a snapshot. Once rows are inserted, removed or moved, an older
/// index may point at a different row or at none; its internal id keeps
/// naming the same cached item for as long as that item lives.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ModelIndex(Option<Arc<Position>>);

#[derive(PartialEq, Eq, Hash)]
struct Position {
    row: usize,
    internal_id: u64,
    parent: ModelIndex,
}

impl ModelIndex {
    pub const fn invalid() -> Self {
        Self(None)
    }

    /// A valid index. Only models create these.
    pub fn new(row: usize, parent: ModelIndex, internal_id: u64) -> Self {
        Self(Some(Arc::new(Position {
            row,
            internal_id,
            parent,
        })))
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Row under the parent; 0 when invalid.
    pub fn row(&self) -> usize {
        self.0.as_ref().map_or(0, |pos| pos.row)
    }

    /// Invalid for top-level rows.
    pub fn parent(&self) -> ModelIndex {
        self.0
            .as_ref()
            .map_or_else(ModelIndex::invalid, |pos| pos.parent.clone())
    }

    pub fn internal_id(&self) -> u64 {
        self.0.as_ref().map_or(0, |pos| pos.internal_id)
    }

    /// Number of valid ancestors.
    pub fn depth(&self) -> usize {
        let chain = std::iter::successors(self.0.as_deref(), |pos| pos.parent.0.as_deref());
        chain.count().saturating_sub(1)
    }

    /// Whether `ancestor` is a parent, grandparent and so on of this index.
    pub fn is_descendant_of(&self, ancestor: &ModelIndex) -> bool {
        if !ancestor.is_valid() {
            return false;
        }
        let mut current = self.parent();
        while current.is_valid() {
            if current == *ancestor {
                return true;
            }
            current = current.parent();
        }
        false
    }
}

impl fmt::Debug for ModelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("ModelIndex(root)"),
            Some(pos) => write!(
                f,
                "ModelIndex(row {} depth {} id {:#x})",
                pos.row,
                self.depth(),
                pos.internal_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_index() {
        let root = ModelIndex::default();
        assert!(!root.is_valid());
        assert_eq!(root, ModelIndex::invalid());
        assert_eq!((root.row(), root.internal_id()), (0, 0));
        assert!(!root.parent().is_valid());
        assert_eq!(format!("{root:?}"), "ModelIndex(root)");
    }

    #[test]
    fn test_nested_rows() {
        let food = ModelIndex::new(0, ModelIndex::invalid(), 1);
        let fruit = ModelIndex::new(2, food.clone(), 2);
        let apples = ModelIndex::new(1, fruit.clone(), 3);

        assert_eq!(food.depth(), 0);
        assert_eq!(apples.depth(), 2);
        assert_eq!(apples.parent(), fruit);
        assert_eq!(apples.parent().parent(), food);
        assert!(apples.is_descendant_of(&food));
        assert!(!food.is_descendant_of(&apples));
        assert!(!apples.is_descendant_of(&ModelIndex::invalid()));
    }

    #[test]
    fn test_same_row_different_item() {
        let a = ModelIndex::new(1, ModelIndex::invalid(), 10);
        let b = ModelIndex::new(1, ModelIndex::invalid(), 10);
        let c = ModelIndex::new(1, ModelIndex::invalid(), 11);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, ModelIndex::invalid());
    }
}
