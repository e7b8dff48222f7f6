//! What a view can ask a group model about a row, and the answers.

/// The aspect of a row a view asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRole {
    /// Category or group name, or the placeholder text.
    Display,
    /// Starting text of an in-place rename. Empty for placeholders.
    Edit,
    /// Full encoded path of the row.
    ToolTip,
    /// Checkbox of a [`CheckedGroupTreeModel`](super::CheckedGroupTreeModel) row.
    CheckState,
}

/// Checkbox of a row.
///
/// Groups are either checked or not. A category is checked when every group
/// below it is, partially checked when only some are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckState {
    #[default]
    Unchecked,
    PartiallyChecked,
    Checked,
}

impl CheckState {
    /// Anything but [`Unchecked`](Self::Unchecked).
    pub fn is_checked(self) -> bool {
        self != CheckState::Unchecked
    }

    /// State after a click. Clicking a partial category clears it.
    pub fn toggle(self) -> CheckState {
        if self == CheckState::Unchecked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }
}

/// Answer to an [`ItemRole`] query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemData {
    /// The row does not answer the role.
    #[default]
    None,
    Text(String),
    Check(CheckState),
}

impl ItemData {
    pub fn is_none(&self) -> bool {
        *self == ItemData::None
    }

    pub fn as_string(&self) -> Option<&str> {
        if let ItemData::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    pub fn into_string(self) -> Option<String> {
        if let ItemData::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    pub fn as_check_state(&self) -> Option<CheckState> {
        if let ItemData::Check(state) = self {
            Some(*state)
        } else {
            None
        }
    }
}

impl From<String> for ItemData {
    fn from(text: String) -> Self {
        ItemData::Text(text)
    }
}

impl From<&str> for ItemData {
    fn from(text: &str) -> Self {
        ItemData::Text(text.to_owned())
    }
}

impl From<Option<String>> for ItemData {
    fn from(text: Option<String>) -> Self {
        text.map_or(ItemData::None, ItemData::Text)
    }
}

impl From<CheckState> for ItemData {
    fn from(state: CheckState) -> Self {
        ItemData::Check(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_category_clears_on_click() {
        assert_eq!(CheckState::Unchecked.toggle(), CheckState::Checked);
        assert_eq!(CheckState::Checked.toggle(), CheckState::Unchecked);
        assert_eq!(CheckState::PartiallyChecked.toggle(), CheckState::Unchecked);
        assert!(CheckState::PartiallyChecked.is_checked());
        assert!(!CheckState::default().is_checked());
    }

    #[test]
    fn test_answers_convert() {
        let name = ItemData::from("N5");
        assert_eq!(name.as_string(), Some("N5"));
        assert_eq!(name.as_check_state(), None);

        let path = ItemData::from(Some("JLPT/N5 (3)".to_string()));
        assert_eq!(path.into_string().as_deref(), Some("JLPT/N5 (3)"));
        assert!(ItemData::from(None::<String>).is_none());
        assert_eq!(
            ItemData::from(CheckState::Checked).as_check_state(),
            Some(CheckState::Checked)
        );
    }
}
