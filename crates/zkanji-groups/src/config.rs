//! User settings that affect the group trees and their tree models.
//!
//! Settings are stored as TOML. Missing keys take their defaults and unknown
//! keys are ignored, so older and newer settings files both load.
//!
//! ```
//! use zkanji_groups::GroupSettings;
//!
//! let settings = GroupSettings::from_toml_str("hide_empty_categories = true").unwrap();
//! assert!(settings.hide_empty_categories);
//! assert!(settings.remember_last);
//! ```

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GroupError, Result};
use crate::file::AtomicWriter;

/// Group-related user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    /// Remember the last group used as an "add to group" destination, and
    /// store it with the groups.
    pub remember_last: bool,
    /// Leave categories without any group in their subtree out of group
    /// tree models.
    pub hide_empty_categories: bool,
    /// Show "add new" placeholder rows in group tree models.
    pub show_placeholders: bool,
    /// Text of the placeholder row for a new category.
    pub placeholder_category_text: String,
    /// Text of the placeholder row for a new group.
    pub placeholder_group_text: String,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            remember_last: true,
            hide_empty_categories: false,
            show_placeholders: true,
            placeholder_category_text: "New category...".to_string(),
            placeholder_group_text: "New group...".to_string(),
        }
    }
}

impl GroupSettings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GroupError::Config(e.to_string()))
    }

    /// Renders the settings as TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GroupError::Config(e.to_string()))
    }

    /// Reads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "group settings loaded");
        Ok(settings)
    }

    /// Writes settings to a TOML file, replacing it atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = self.to_toml_string()?;
        AtomicWriter::write(path, |w| {
            w.write_all(text.as_bytes())?;
            Ok(())
        })
    }
}
