/// Outfit Store
///
/// Outfits only reference items by id. Deleting an item never touches
/// an outfit; dangling ids are dropped when the outfit is resolved.

use tracing::{debug, warn};

use super::data::{Item, Outfit, Slot};
use super::items::{next_id_base, now_ms};
use super::library::{keys, KeyValueStore};
use crate::error::StoreError;

/// An outfit with its item references looked up and split by slot
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOutfit<'a> {
    pub outfit: &'a Outfit,
    pub tops: Vec<&'a Item>,
    pub bottoms: Vec<&'a Item>,
}

impl ResolvedOutfit<'_> {
    /// Items still present in the closet
    pub fn item_count(&self) -> usize {
        self.tops.len() + self.bottoms.len()
    }
}

/// Split items into tops and bottoms, keeping their order
pub fn split_by_slot<'a>(items: impl IntoIterator<Item = &'a Item>) -> (Vec<&'a Item>, Vec<&'a Item>) {
    items
        .into_iter()
        .partition(|it| it.category.slot() == Slot::Top)
}

/// Look up an outfit's items, skipping ids that no longer exist
pub fn resolve<'a>(outfit: &'a Outfit, items: &'a [Item]) -> ResolvedOutfit<'a> {
    let chosen = outfit
        .item_ids
        .iter()
        .filter_map(|id| items.iter().find(|it| &it.id == id));
    let (tops, bottoms) = split_by_slot(chosen);
    ResolvedOutfit { outfit, tops, bottoms }
}

pub struct OutfitStore<'s> {
    storage: &'s dyn KeyValueStore,
    outfits: Vec<Outfit>,
}

impl<'s> OutfitStore<'s> {
    pub fn load(storage: &'s dyn KeyValueStore) -> Self {
        let outfits = match storage.get(keys::OUTFITS) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Stored outfits are unreadable, starting empty: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read stored outfits, starting empty: {}", e);
                Vec::new()
            }
        };
        debug!("Loaded {} outfits", outfits.len());
        OutfitStore { storage, outfits }
    }

    /// Outfits in insertion order
    pub fn list(&self) -> &[Outfit] {
        &self.outfits
    }

    /// Newest first; records without `createdAt` sort as the oldest
    pub fn list_newest_first(&self) -> Vec<&Outfit> {
        let mut sorted: Vec<&Outfit> = self.outfits.iter().collect();
        sorted.sort_by_key(|o| std::cmp::Reverse(o.created_at.unwrap_or(0)));
        sorted
    }

    pub fn get(&self, id: &str) -> Option<&Outfit> {
        self.outfits.iter().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.outfits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outfits.is_empty()
    }

    /// Save a new outfit from the builder selection
    pub fn add(&mut self, name: &str, item_ids: Vec<String>) -> Result<Outfit, StoreError> {
        let mut unique: Vec<String> = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if unique.is_empty() {
            return Err(StoreError::EmptyOutfit);
        }

        let now = now_ms();
        let id = next_id_base(self.outfits.iter().map(|o| o.id.as_str()), now)?;
        let outfit = Outfit {
            id: id.to_string(),
            name: name.trim().to_string(),
            item_ids: unique,
            created_at: Some(now),
        };

        self.outfits.push(outfit.clone());
        if let Err(e) = self.save() {
            self.outfits.pop();
            return Err(e);
        }
        Ok(outfit)
    }

    pub fn remove(&mut self, id: &str) -> Result<Outfit, StoreError> {
        let index = self
            .outfits
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| StoreError::OutfitNotFound(id.to_string()))?;

        let removed = self.outfits.remove(index);
        if let Err(e) = self.save() {
            self.outfits.insert(index, removed);
            return Err(e);
        }
        Ok(removed)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.outfits).map_err(|source| StoreError::Serialize {
            key: keys::OUTFITS,
            source,
        })?;
        self.storage.set(keys::OUTFITS, &json)?;
        Ok(())
    }
}
