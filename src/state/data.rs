/// Shared data structures for the closet
///
/// These structs represent the data model that flows between
/// the stores, the share codec and the command line.
/// Field names on the wire match what the stored JSON has always used
/// (`colorHex`, `imageDataURL`, `itemIds`, ...), so old collections load as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clothing category
///
/// Ten fixed categories plus `Other` for free-form text, which early
/// collections and foreign imports may carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Dress,
    ButtonUp,
    TShirt,
    CropTop,
    DressPants,
    KhakiShorts,
    BasketballShorts,
    Skirts,
    Hoodies,
    Sweats,
    Other(String),
}

/// Which half of an outfit a category fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Top,
    Bottom,
}

impl Category {
    /// The fixed categories in picker order
    pub const ALL: [Category; 10] = [
        Category::Dress,
        Category::ButtonUp,
        Category::TShirt,
        Category::CropTop,
        Category::DressPants,
        Category::KhakiShorts,
        Category::BasketballShorts,
        Category::Skirts,
        Category::Hoodies,
        Category::Sweats,
    ];

    /// Display name, which is also the stored form
    pub fn as_str(&self) -> &str {
        match self {
            Category::Dress => "Dress",
            Category::ButtonUp => "Button Up",
            Category::TShirt => "T-Shirt",
            Category::CropTop => "Crop-Top",
            Category::DressPants => "Dress Pants",
            Category::KhakiShorts => "Khaki Shorts",
            Category::BasketballShorts => "Basketball Shorts",
            Category::Skirts => "Skirts",
            Category::Hoodies => "Hoodies",
            Category::Sweats => "Sweats",
            Category::Other(name) => name.as_str(),
        }
    }

    /// Exact match on the display name; anything else is kept verbatim as `Other`
    pub fn from_name(name: &str) -> Category {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Category::Other(name.to_string()))
    }

    /// Lenient parse for typed input: trims and ignores case
    pub fn parse(input: &str) -> Category {
        let trimmed = input.trim();
        Self::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| Category::Other(trimmed.to_string()))
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }

    /// Tops/bottoms classification used when grouping an outfit.
    /// Categories outside both fixed sets fall into the tops bucket.
    pub fn slot(&self) -> Slot {
        match self {
            Category::DressPants
            | Category::KhakiShorts
            | Category::BasketballShorts
            | Category::Skirts
            | Category::Sweats => Slot::Bottom,
            Category::ButtonUp
            | Category::TShirt
            | Category::CropTop
            | Category::Hoodies
            | Category::Dress
            | Category::Other(_) => Slot::Top,
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Category::from_name(&name)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(name) => name,
            fixed => fixed.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub hex: &'static str,
}

/// The color picker palette
pub const COLORS: [PaletteColor; 18] = [
    PaletteColor { name: "Black", hex: "#000000" },
    PaletteColor { name: "White", hex: "#FFFFFF" },
    PaletteColor { name: "Gray", hex: "#808080" },
    PaletteColor { name: "Navy", hex: "#001f3f" },
    PaletteColor { name: "Blue", hex: "#1e90ff" },
    PaletteColor { name: "Light Blue", hex: "#87cefa" },
    PaletteColor { name: "Green", hex: "#2ecc40" },
    PaletteColor { name: "Olive", hex: "#556b2f" },
    PaletteColor { name: "Brown", hex: "#8B4513" },
    PaletteColor { name: "Tan", hex: "#D2B48C" },
    PaletteColor { name: "Beige", hex: "#F5F5DC" },
    PaletteColor { name: "Cream", hex: "#FFFDD0" },
    PaletteColor { name: "Yellow", hex: "#FFD700" },
    PaletteColor { name: "Orange", hex: "#FFA500" },
    PaletteColor { name: "Red", hex: "#FF4136" },
    PaletteColor { name: "Burgundy", hex: "#800020" },
    PaletteColor { name: "Pink", hex: "#FFC0CB" },
    PaletteColor { name: "Purple", hex: "#800080" },
];

/// Palette name for a hex value, if it is one of ours
pub fn color_name_from_hex(hex: &str) -> Option<&'static str> {
    COLORS
        .iter()
        .find(|c| c.hex.eq_ignore_ascii_case(hex))
        .map(|c| c.name)
}

/// A chosen item color: hex plus the palette name when known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Color {
    pub hex: String,
    pub name: Option<String>,
}

impl Color {
    /// Build from a hex value, deriving the name from the palette
    pub fn from_hex(hex: &str) -> Self {
        Color {
            hex: hex.to_string(),
            name: color_name_from_hex(hex).map(str::to_string),
        }
    }

    /// Accepts a palette name ("light blue") or a `#RRGGBB` hex value
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if let Some(entry) = COLORS.iter().find(|c| c.name.eq_ignore_ascii_case(trimmed)) {
            return Some(Color::from_hex(entry.hex));
        }

        let digits = trimmed.strip_prefix('#')?;
        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            // Keep the palette's spelling when the hex is one of ours
            let hex = COLORS
                .iter()
                .find(|c| c.hex.eq_ignore_ascii_case(trimmed))
                .map(|c| c.hex.to_string())
                .unwrap_or_else(|| trimmed.to_string());
            Some(Color::from_hex(&hex))
        } else {
            None
        }
    }
}

/// Where an item's picture comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Normalized JPEG embedded as a data URL (works offline)
    Data(String),
    /// Remote http(s) image
    Url(String),
}

impl ImageRef {
    /// Classify a stored thumbnail string
    pub fn from_thumb(thumb: &str) -> Option<Self> {
        if thumb.is_empty() {
            None
        } else if thumb.starts_with("data:") {
            Some(ImageRef::Data(thumb.to_string()))
        } else {
            Some(ImageRef::Url(thumb.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Data(s) | ImageRef::Url(s) => s.as_str(),
        }
    }
}

/// Represents a single clothing item in the closet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Time-derived unique id (epoch milliseconds as text)
    pub id: String,
    pub category: Category,
    #[serde(rename = "colorHex", default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(rename = "colorName", default, skip_serializing_if = "Option::is_none")]
    pub color_name: Option<String>,
    /// Embedded JPEG; preferred over `image_url` for display
    #[serde(rename = "imageDataURL", default, skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Item {
    /// The picture to show: data URL first, remote URL as fallback
    pub fn image_src(&self) -> Option<&str> {
        self.image_data_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.image_url.as_deref().filter(|s| !s.is_empty()))
    }

    pub fn set_image(&mut self, image: ImageRef) {
        match image {
            ImageRef::Data(data) => {
                self.image_data_url = Some(data);
                self.image_url = None;
            }
            ImageRef::Url(url) => {
                self.image_url = Some(url);
                self.image_data_url = None;
            }
        }
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        match color {
            Some(color) => {
                self.color_hex = Some(color.hex);
                self.color_name = color.name;
            }
            None => {
                self.color_hex = None;
                self.color_name = None;
            }
        }
    }

    /// Color label for display: name, then hex
    pub fn color_label(&self) -> Option<&str> {
        self.color_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.color_hex.as_deref().filter(|s| !s.is_empty()))
    }

    /// "Hoodies • Black" style caption
    pub fn caption(&self) -> String {
        match self.color_label() {
            Some(color) => format!("{} • {}", self.category, color),
            None => self.category.to_string(),
        }
    }
}

/// A saved grouping of item references
///
/// Item ids are weak references: items may be deleted later and
/// are filtered out when the outfit is resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outfit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "itemIds", default)]
    pub item_ids: Vec<String>,
    /// Epoch milliseconds; missing on very old records
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Outfit {
    pub fn title(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Outfit ({} items)", self.item_ids.len())
        } else {
            self.name.clone()
        }
    }
}

/// The in-progress add form, persisted so it survives a restart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub category: String,
    /// Data URL or remote URL, whichever was picked last
    #[serde(default)]
    pub thumb: String,
}

impl Draft {
    pub fn image(&self) -> Option<ImageRef> {
        ImageRef::from_thumb(&self.thumb)
    }

    pub fn category(&self) -> Option<Category> {
        let category = Category::from_name(&self.category);
        (!category.is_blank()).then_some(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL.iter() {
            assert_eq!(&Category::from_name(category.as_str()), category);
        }
        assert_eq!(
            Category::from_name("Chaussettes"),
            Category::Other("Chaussettes".to_string())
        );
    }

    #[test]
    fn test_category_parse_is_lenient() {
        assert_eq!(Category::parse("  t-shirt "), Category::TShirt);
        assert_eq!(Category::parse("basketball shorts"), Category::BasketballShorts);
        assert!(Category::parse("   ").is_blank());
    }

    #[test]
    fn test_slot_classification() {
        assert_eq!(Category::Dress.slot(), Slot::Top);
        assert_eq!(Category::Hoodies.slot(), Slot::Top);
        assert_eq!(Category::Skirts.slot(), Slot::Bottom);
        assert_eq!(Category::Sweats.slot(), Slot::Bottom);
        assert_eq!(Category::Other("Scarves".into()).slot(), Slot::Top);
    }

    #[test]
    fn test_color_parse() {
        let navy = Color::parse("navy").unwrap();
        assert_eq!(navy.hex, "#001f3f");
        assert_eq!(navy.name.as_deref(), Some("Navy"));

        let brown = Color::parse("#8b4513").unwrap();
        assert_eq!(brown.hex, "#8B4513");
        assert_eq!(brown.name.as_deref(), Some("Brown"));

        let custom = Color::parse("#123456").unwrap();
        assert_eq!(custom.name, None);

        assert!(Color::parse("mauve").is_none());
        assert!(Color::parse("#12345").is_none());
    }

    #[test]
    fn test_item_wire_names() {
        let item = Item {
            id: "1700000000000".into(),
            category: Category::Hoodies,
            color_hex: Some("#000000".into()),
            color_name: Some("Black".into()),
            image_data_url: Some("data:image/jpeg;base64,AAAA".into()),
            image_url: None,
            name: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["category"], "Hoodies");
        assert_eq!(json["colorHex"], "#000000");
        assert_eq!(json["imageDataURL"], "data:image/jpeg;base64,AAAA");
        assert!(json.get("imageURL").is_none());
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_image_src_prefers_data_url() {
        let mut item: Item = serde_json::from_str(
            r#"{"id":"1","category":"Skirts","imageDataURL":"data:x","imageURL":"https://a/b.jpg"}"#,
        )
        .unwrap();
        assert_eq!(item.image_src(), Some("data:x"));

        item.image_data_url = Some(String::new());
        assert_eq!(item.image_src(), Some("https://a/b.jpg"));

        item.set_image(ImageRef::Data("data:y".into()));
        assert_eq!(item.image_url, None);
        assert_eq!(item.image_src(), Some("data:y"));
    }

    #[test]
    fn test_outfit_title_falls_back_to_count() {
        let outfit: Outfit = serde_json::from_str(r#"{"id":"5","itemIds":["1","2"]}"#).unwrap();
        assert_eq!(outfit.title(), "Outfit (2 items)");
        assert_eq!(outfit.created_at, None);
    }

    #[test]
    fn test_draft_thumb_kind() {
        let draft = Draft { category: "Dress".into(), thumb: "data:image/jpeg;base64,AA".into() };
        assert!(matches!(draft.image(), Some(ImageRef::Data(_))));
        assert_eq!(draft.category(), Some(Category::Dress));

        let draft = Draft { category: String::new(), thumb: "https://x/y.png".into() };
        assert!(matches!(draft.image(), Some(ImageRef::Url(_))));
        assert_eq!(draft.category(), None);
    }
}
