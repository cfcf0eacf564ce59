/// Staged imports
///
/// A decoded link or file is held here until the user picks what to do
/// with it. Replace adopts the incoming set verbatim; Merge unions by id and
/// never lets an incoming item overwrite one that already exists.

use std::collections::HashSet;
use std::fmt;

use crate::state::data::Item;

/// Where a staged import came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    Link,
    File,
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::Link => f.write_str("link"),
            ImportSource::File => f.write_str("file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Discard the current closet and adopt the incoming items
    Replace,
    /// Keep everything, add incoming items whose id is new
    Merge,
}

/// A validated but not yet applied import
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImport {
    /// Payload version, absent for bare-array payloads
    pub version: Option<u32>,
    pub items: Vec<Item>,
    /// Entries dropped by validation
    pub skipped: usize,
    pub source: ImportSource,
}

impl StagedImport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// "This link contains 3 items."
    pub fn summary(&self) -> String {
        let n = self.items.len();
        format!(
            "This {} contains {} item{}.",
            self.source,
            n,
            if n == 1 { "" } else { "s" }
        )
    }

    /// Captions of the first `limit` items
    pub fn preview(&self, limit: usize) -> Vec<String> {
        self.items.iter().take(limit).map(Item::caption).collect()
    }

    /// The closet that results from applying this import to `current`
    pub fn apply(&self, mode: ImportMode, current: &[Item]) -> Vec<Item> {
        match mode {
            ImportMode::Replace => self.items.clone(),
            ImportMode::Merge => merge_items(current, &self.items),
        }
    }
}

/// Union by id; the result never repeats an id. The first record seen
/// wins, existing before incoming. Order: existing, then new in incoming
/// order.
pub fn merge_items(current: &[Item], incoming: &[Item]) -> Vec<Item> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(current.len() + incoming.len());
    let mut merged = Vec::with_capacity(current.len() + incoming.len());
    for item in current.iter().chain(incoming) {
        if seen.insert(item.id.as_str()) {
            merged.push(item.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::Category;
    use pretty_assertions::assert_eq;

    fn item(id: &str, category: Category) -> Item {
        Item {
            id: id.to_string(),
            category,
            color_hex: None,
            color_name: None,
            image_data_url: Some(format!("data:image/jpeg;base64,{id}")),
            image_url: None,
            name: None,
        }
    }

    fn staged(items: Vec<Item>) -> StagedImport {
        StagedImport {
            version: Some(3),
            items,
            skipped: 0,
            source: ImportSource::Link,
        }
    }

    #[test]
    fn test_merge_keeps_existing_on_collision() {
        let current = vec![item("1", Category::Dress), item("2", Category::Skirts)];
        let incoming = staged(vec![item("2", Category::Hoodies), item("3", Category::Sweats)]);

        let merged = incoming.apply(ImportMode::Merge, &current);
        let ids: Vec<&str> = merged.iter().map(|it| it.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(merged[1].category, Category::Skirts);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let current = vec![item("1", Category::Dress)];
        let incoming = staged(vec![item("2", Category::Hoodies), item("2", Category::Sweats)]);

        let once = incoming.apply(ImportMode::Merge, &current);
        let twice = incoming.apply(ImportMode::Merge, &once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
        assert_eq!(once[1].category, Category::Hoodies);
    }

    #[test]
    fn test_merge_collapses_duplicate_ids_already_present() {
        let current = vec![
            item("1", Category::Dress),
            item("1", Category::Skirts),
            item("4", Category::Sweats),
        ];
        let incoming = staged(vec![item("1", Category::Hoodies), item("5", Category::TShirt)]);

        let merged = incoming.apply(ImportMode::Merge, &current);
        let ids: Vec<&str> = merged.iter().map(|it| it.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4", "5"]);
        assert_eq!(merged[0].category, Category::Dress);
    }

    #[test]
    fn test_replace_is_exact() {
        let current = vec![item("1", Category::Dress), item("9", Category::Skirts)];
        let incoming = staged(vec![item("2", Category::Hoodies)]);
        assert_eq!(incoming.apply(ImportMode::Replace, &current), incoming.items);
        assert_eq!(incoming.apply(ImportMode::Replace, &[]), incoming.items);
    }

    #[test]
    fn test_summary_and_preview() {
        let incoming = staged(vec![item("1", Category::Dress)]);
        assert_eq!(incoming.summary(), "This link contains 1 item.");
        assert_eq!(incoming.preview(12), vec!["Dress".to_string()]);
    }
}
