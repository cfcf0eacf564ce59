/// The application state object
///
/// Bundles the stores over one storage handle and carries the flows that
/// touch more than one of them (adding clears the draft and remembers the
/// category, imports replace or merge the item list, outfits resolve
/// against current items).

use tracing::info;

use super::data::{Category, Color, Draft, ImageRef, Item};
use super::items::{ItemStore, NewItem};
use super::library::KeyValueStore;
use super::outfits::{resolve, OutfitStore, ResolvedOutfit};
use super::prefs::Preferences;
use crate::error::StoreError;
use crate::share::{Collection, ImportMode, StagedImport};

pub struct Closet<'s> {
    pub items: ItemStore<'s>,
    pub outfits: OutfitStore<'s>,
    pub prefs: Preferences<'s>,
}

/// What an applied import changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub mode: ImportMode,
    pub before: usize,
    pub after: usize,
}

impl<'s> Closet<'s> {
    pub fn load(storage: &'s dyn KeyValueStore) -> Self {
        Closet {
            items: ItemStore::load(storage),
            outfits: OutfitStore::load(storage),
            prefs: Preferences::new(storage),
        }
    }

    /// Add from the form, falling back to the saved draft for anything
    /// not given. On success the category becomes sticky and the draft is
    /// cleared.
    pub fn add_item(
        &mut self,
        category: Option<Category>,
        color: Option<Color>,
        image: Option<ImageRef>,
    ) -> Result<Item, StoreError> {
        let draft = self.prefs.draft().unwrap_or_default();
        let category = category
            .or_else(|| draft.category())
            .ok_or(StoreError::MissingCategory)?;
        let image = image.or_else(|| draft.image()).ok_or(StoreError::MissingImage)?;

        let item = self.items.add(NewItem {
            category,
            color,
            image,
            name: None,
        })?;

        self.prefs.set_last_category(&item.category)?;
        self.prefs.clear_draft()?;
        Ok(item)
    }

    /// Update the draft with whatever changed on the form
    pub fn update_draft(&self, category: Option<&Category>, image: Option<&ImageRef>) -> Result<Draft, StoreError> {
        let mut draft = self.prefs.draft().unwrap_or_default();
        if let Some(category) = category {
            draft.category = category.as_str().to_string();
            self.prefs.set_last_category(category)?;
        }
        if let Some(image) = image {
            draft.thumb = image.as_str().to_string();
        }
        self.prefs.save_draft(&draft)?;
        Ok(draft)
    }

    /// Category to pre-select: the draft's, then the last used one
    pub fn suggested_category(&self) -> Option<Category> {
        self.prefs
            .draft()
            .and_then(|d| d.category())
            .or_else(|| self.prefs.last_category())
    }

    /// Outfits newest first, each resolved against the current items
    pub fn resolved_outfits(&self) -> Vec<ResolvedOutfit<'_>> {
        self.outfits
            .list_newest_first()
            .into_iter()
            .map(|outfit| resolve(outfit, self.items.list()))
            .collect()
    }

    /// Everything that gets shared or exported
    pub fn collection(&self) -> Collection {
        Collection::new(self.items.list().to_vec())
    }

    /// Apply a staged import the user has confirmed
    pub fn apply_import(&mut self, staged: &StagedImport, mode: ImportMode) -> Result<ImportOutcome, StoreError> {
        let before = self.items.len();
        let next = staged.apply(mode, self.items.list());
        self.items.replace_all(next)?;
        let after = self.items.len();
        info!("Imported from {} ({:?}): {} -> {} items", staged.source, mode, before, after);
        Ok(ImportOutcome { mode, before, after })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::{decode, encode, ImportSource};
    use crate::state::library::MemoryStore;

    const PIXEL: &str = "data:image/jpeg;base64,/9j/AA==";

    #[test]
    fn test_add_uses_draft_and_clears_it() {
        let storage = MemoryStore::new();
        let mut closet = Closet::load(&storage);

        closet
            .update_draft(Some(&Category::Skirts), Some(&ImageRef::Data(PIXEL.into())))
            .unwrap();
        assert_eq!(closet.suggested_category(), Some(Category::Skirts));

        let item = closet.add_item(None, Color::parse("pink"), None).unwrap();
        assert_eq!(item.category, Category::Skirts);
        assert_eq!(item.image_data_url.as_deref(), Some(PIXEL));
        assert_eq!(closet.prefs.draft(), None);
        assert_eq!(closet.prefs.last_category(), Some(Category::Skirts));
    }

    #[test]
    fn test_add_without_image_fails() {
        let storage = MemoryStore::new();
        let mut closet = Closet::load(&storage);
        let err = closet.add_item(Some(Category::Dress), None, None).unwrap_err();
        assert!(matches!(err, StoreError::MissingImage));
        let err = closet.add_item(None, None, Some(ImageRef::Data(PIXEL.into()))).unwrap_err();
        assert!(matches!(err, StoreError::MissingCategory));
    }

    #[test]
    fn test_replace_import_is_exact() {
        let storage = MemoryStore::new();
        let mut closet = Closet::load(&storage);
        closet
            .add_item(Some(Category::Dress), None, Some(ImageRef::Data(PIXEL.into())))
            .unwrap();

        let incoming = Collection::new(vec![Item {
            id: "42".into(),
            category: Category::Sweats,
            color_hex: None,
            color_name: None,
            image_data_url: None,
            image_url: Some("https://example.com/sweats.jpg".into()),
            name: None,
        }]);
        let staged = decode(&encode(&incoming).unwrap()).unwrap();
        assert_eq!(staged.source, ImportSource::Link);

        let outcome = closet.apply_import(&staged, ImportMode::Replace).unwrap();
        assert_eq!((outcome.before, outcome.after), (1, 1));
        assert_eq!(closet.items.list(), incoming.items.as_slice());
        assert_eq!(Closet::load(&storage).items.list(), incoming.items.as_slice());
    }

    fn linked(id: &str) -> Item {
        Item {
            id: id.to_string(),
            category: Category::Hoodies,
            color_hex: None,
            color_name: None,
            image_data_url: None,
            image_url: Some(format!("https://example.com/{id}.jpg")),
            name: None,
        }
    }

    #[test]
    fn test_merge_after_replace_leaves_unique_ids() {
        let storage = MemoryStore::new();
        let mut closet = Closet::load(&storage);

        let token = encode(&Collection::new(vec![linked("1"), linked("1")])).unwrap();
        let staged = decode(&token).unwrap();
        closet.apply_import(&staged, ImportMode::Replace).unwrap();
        assert_eq!(closet.items.len(), 2);

        let outcome = closet.apply_import(&staged, ImportMode::Merge).unwrap();
        assert_eq!((outcome.before, outcome.after), (2, 1));
        let ids: Vec<&str> = closet.items.list().iter().map(|it| it.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_imported_max_id_blocks_adds_without_panicking() {
        let storage = MemoryStore::new();
        let mut closet = Closet::load(&storage);

        let token = encode(&Collection::new(vec![linked(&i64::MAX.to_string())])).unwrap();
        closet
            .apply_import(&decode(&token).unwrap(), ImportMode::Merge)
            .unwrap();

        let err = closet
            .add_item(Some(Category::Dress), None, Some(ImageRef::Data(PIXEL.into())))
            .unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted(i64::MAX)));
        assert_eq!(closet.items.len(), 1);
    }
}
