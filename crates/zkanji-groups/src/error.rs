//! Error types for the group model.

use zkanji_core::RangeError;

/// Result type alias for group operations.
pub type Result<T> = std::result::Result<T, GroupError>;

/// Errors that can occur while editing, loading or saving groups.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    /// Empty or whitespace-only name.
    #[error("Category and group names cannot be empty")]
    InvalidName,

    /// A sibling already uses the name (compared case-insensitively).
    #[error("The name '{name}' is already taken")]
    NameTaken { name: String },

    /// The category id does not belong to this tree.
    #[error("No such category")]
    NoSuchCategory,

    /// The group id does not belong to this tree.
    #[error("No such group")]
    NoSuchGroup,

    /// Position outside of a list.
    #[error("Index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A category cannot be moved into itself or one of its descendants.
    #[error("A category cannot be moved below itself")]
    CircularMove,

    /// The root category cannot be renamed, moved or deleted.
    #[error("The root category cannot be changed")]
    RootImmutable,

    /// Batch moves require every item to share one parent.
    #[error("Items moved together must have the same parent")]
    MixedParents,

    /// Item not present in the group.
    #[error("Index is not in the group")]
    NotInGroup,

    /// Invalid range batch.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Reading or writing a group file failed.
    #[error("Group file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The group file is malformed.
    #[error("Invalid group data: {0}")]
    InvalidData(String),

    /// The group file was written by an unknown format version.
    #[error("Unsupported group file version {0}")]
    UnsupportedVersion(u32),

    /// Settings could not be read or written.
    #[error("Invalid group settings: {0}")]
    Config(String),
}

impl GroupError {
    /// Create a name-taken error.
    pub fn name_taken(name: impl Into<String>) -> Self {
        Self::NameTaken { name: name.into() }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create an invalid-data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }
}
