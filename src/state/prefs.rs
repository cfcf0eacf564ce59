/// Small persisted preferences: sticky category, theme, and the add-form draft

use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::data::{Category, Draft};
use super::library::{keys, KeyValueStore};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}', expected light or dark")),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Preferences<'s> {
    storage: &'s dyn KeyValueStore,
}

impl<'s> Preferences<'s> {
    pub fn new(storage: &'s dyn KeyValueStore) -> Self {
        Preferences { storage }
    }

    /// Category picked most recently, pre-selected on the next add
    pub fn last_category(&self) -> Option<Category> {
        let stored = self.storage.get(keys::LAST_CATEGORY).ok().flatten()?;
        let category = Category::from_name(&stored);
        (!category.is_blank()).then_some(category)
    }

    pub fn set_last_category(&self, category: &Category) -> Result<(), StoreError> {
        self.storage.set(keys::LAST_CATEGORY, category.as_str())?;
        Ok(())
    }

    /// Saved theme; `None` means follow the default
    pub fn theme(&self) -> Option<Theme> {
        self.storage
            .get(keys::THEME)
            .ok()
            .flatten()
            .and_then(|s| s.parse().ok())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.storage.set(keys::THEME, theme.as_str())?;
        Ok(())
    }

    /// The in-progress add, if one was saved and is still readable
    pub fn draft(&self) -> Option<Draft> {
        let json = self.storage.get(keys::DRAFT).ok().flatten()?;
        match serde_json::from_str::<Option<Draft>>(&json) {
            Ok(draft) => draft,
            Err(e) => {
                debug!("Ignoring unreadable draft: {}", e);
                None
            }
        }
    }

    pub fn save_draft(&self, draft: &Draft) -> Result<(), StoreError> {
        let json = serde_json::to_string(draft).map_err(|source| StoreError::Serialize {
            key: keys::DRAFT,
            source,
        })?;
        self.storage.set(keys::DRAFT, &json)?;
        Ok(())
    }

    pub fn clear_draft(&self) -> Result<(), StoreError> {
        self.storage.remove(keys::DRAFT)?;
        Ok(())
    }
}
