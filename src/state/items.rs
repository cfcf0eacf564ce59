/// Item Store
///
/// Owns the list of clothing items and mirrors it to the `closetItems` key.
/// Every mutation rewrites the whole list; when that write fails the
/// in-memory change is rolled back so memory and storage never disagree.

use tracing::{debug, warn};

use super::data::{Category, Color, ImageRef, Item};
use super::library::{keys, KeyValueStore};
use crate::error::StoreError;
use crate::photo::looks_like_url;

/// Input for a single add
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub category: Category,
    pub color: Option<Color>,
    pub image: ImageRef,
    pub name: Option<String>,
}

/// Edit of an existing item. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub category: Option<Category>,
    /// `Some(None)` clears the color
    pub color: Option<Option<Color>>,
    pub image: Option<ImageRef>,
}

impl ItemPatch {
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn color(mut self, color: Option<Color>) -> Self {
        self.color = Some(color);
        self
    }

    pub fn image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.color.is_none() && self.image.is_none()
    }
}

/// Browse filter; empty fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub category: Option<Category>,
    pub color_hex: Option<String>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        let category_ok = self
            .category
            .as_ref()
            .map_or(true, |c| &item.category == c);
        let color_ok = self.color_hex.as_deref().map_or(true, |hex| {
            item.color_hex
                .as_deref()
                .is_some_and(|h| h.eq_ignore_ascii_case(hex))
        });
        category_ok && color_ok
    }
}

/// First id of a new batch: the current time in epoch milliseconds,
/// bumped past the newest numeric id so ids stay unique and increasing
/// even when the clock has not moved since the last add.
pub fn next_id_base<'a>(
    existing_ids: impl IntoIterator<Item = &'a str>,
    now_ms: i64,
) -> Result<i64, StoreError> {
    let newest = existing_ids
        .into_iter()
        .filter_map(|id| id.parse::<i64>().ok())
        .max();
    match newest {
        Some(newest) if newest >= now_ms => newest
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted(newest)),
        _ => Ok(now_ms),
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn validate_image(image: &ImageRef) -> Result<(), StoreError> {
    match image {
        ImageRef::Data(data) if !data.starts_with("data:") => Err(StoreError::InvalidDataUrl),
        ImageRef::Url(url) if !looks_like_url(url) => Err(StoreError::InvalidUrl(url.clone())),
        _ => Ok(()),
    }
}

pub struct ItemStore<'s> {
    storage: &'s dyn KeyValueStore,
    items: Vec<Item>,
}

impl<'s> ItemStore<'s> {
    /// Load the item list; a missing key or unreadable JSON yields an empty closet
    pub fn load(storage: &'s dyn KeyValueStore) -> Self {
        let items = match storage.get(keys::ITEMS) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Stored items are unreadable, starting empty: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read stored items, starting empty: {}", e);
                Vec::new()
            }
        };
        debug!("Loaded {} items", items.len());
        ItemStore { storage, items }
    }

    pub fn list(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn filter(&self, filter: &ItemFilter) -> Vec<&Item> {
        self.items.iter().filter(|it| filter.matches(it)).collect()
    }

    fn next_base(&self) -> Result<i64, StoreError> {
        next_id_base(self.items.iter().map(|it| it.id.as_str()), now_ms())
    }

    /// Add one item from the add form
    pub fn add(&mut self, new: NewItem) -> Result<Item, StoreError> {
        if new.category.is_blank() {
            return Err(StoreError::MissingCategory);
        }
        validate_image(&new.image)?;

        let mut item = Item {
            id: self.next_base()?.to_string(),
            category: new.category,
            color_hex: None,
            color_name: None,
            image_data_url: None,
            image_url: None,
            name: new.name.filter(|n| !n.trim().is_empty()),
        };
        item.set_color(new.color);
        item.set_image(new.image);

        self.items.push(item.clone());
        if let Err(e) = self.save() {
            self.items.pop();
            return Err(e);
        }
        Ok(item)
    }

    /// Add one item per data URL, all sharing category and color.
    /// Ids are `base + offset`. Either every item lands or none does.
    pub fn add_batch(
        &mut self,
        category: &Category,
        color: Option<&Color>,
        data_urls: Vec<String>,
    ) -> Result<Vec<Item>, StoreError> {
        if category.is_blank() {
            return Err(StoreError::MissingCategory);
        }
        if let Some(bad) = data_urls.iter().find(|d| !d.starts_with("data:")) {
            debug!("Rejecting batch with non data URL of {} bytes", bad.len());
            return Err(StoreError::InvalidDataUrl);
        }

        let base = self.next_base()?;
        let last = i64::try_from(data_urls.len().saturating_sub(1))
            .ok()
            .and_then(|n| base.checked_add(n))
            .ok_or(StoreError::IdsExhausted(base))?;
        let added: Vec<Item> = (base..=last)
            .zip(data_urls)
            .map(|(id, data_url)| {
                let mut item = Item {
                    id: id.to_string(),
                    category: category.clone(),
                    color_hex: None,
                    color_name: None,
                    image_data_url: Some(data_url),
                    image_url: None,
                    name: None,
                };
                item.set_color(color.cloned());
                item
            })
            .collect();

        let previous_len = self.items.len();
        self.items.extend(added.iter().cloned());
        if let Err(e) = self.save() {
            self.items.truncate(previous_len);
            return Err(e);
        }
        Ok(added)
    }

    /// Edit category, color or picture of an item
    pub fn update(&mut self, id: &str, patch: ItemPatch) -> Result<&Item, StoreError> {
        if let Some(category) = &patch.category {
            if category.is_blank() {
                return Err(StoreError::MissingCategory);
            }
        }
        if let Some(image) = &patch.image {
            validate_image(image)?;
        }

        let index = self
            .items
            .iter()
            .position(|it| it.id == id)
            .ok_or_else(|| StoreError::ItemNotFound(id.to_string()))?;

        let original = self.items[index].clone();
        let item = &mut self.items[index];
        if let Some(category) = patch.category {
            item.category = category;
        }
        if let Some(color) = patch.color {
            item.set_color(color);
        }
        if let Some(image) = patch.image {
            item.set_image(image);
        }

        if let Err(e) = self.save() {
            self.items[index] = original;
            return Err(e);
        }
        Ok(&self.items[index])
    }

    /// Delete an item. Outfits keep their reference; it is filtered on display.
    pub fn remove(&mut self, id: &str) -> Result<Item, StoreError> {
        let index = self
            .items
            .iter()
            .position(|it| it.id == id)
            .ok_or_else(|| StoreError::ItemNotFound(id.to_string()))?;

        let removed = self.items.remove(index);
        if let Err(e) = self.save() {
            self.items.insert(index, removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Swap in a whole new list (import)
    pub fn replace_all(&mut self, items: Vec<Item>) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut self.items, items);
        if let Err(e) = self.save() {
            self.items = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Serialize the full list back to storage
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.items).map_err(|source| StoreError::Serialize {
            key: keys::ITEMS,
            source,
        })?;
        self.storage.set(keys::ITEMS, &json)?;
        Ok(())
    }
}
