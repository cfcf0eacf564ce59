/// JSON file export and import
///
/// Same `{version, items}` shape as the share link, pretty-printed, with
/// the same validation on the way back in.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

use super::codec::{parse_payload, Collection};
use super::staging::{ImportSource, StagedImport};
use crate::error::ShareError;

/// `closet-export-2026-10-16.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("closet-export-{}.json", date.format("%Y-%m-%d"))
}

pub fn export_json(collection: &Collection) -> Result<String, ShareError> {
    Ok(serde_json::to_string_pretty(collection)?)
}

pub fn import_json(text: &str) -> Result<StagedImport, ShareError> {
    parse_payload(text, ImportSource::File)
}

/// Write the export into `dir` and return the file path
pub fn write_export(dir: &Path, collection: &Collection, date: NaiveDate) -> Result<PathBuf, ShareError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(date));
    std::fs::write(&path, export_json(collection)?)?;
    info!("Exported {} items to {}", collection.items.len(), path.display());
    Ok(path)
}

pub fn read_import(path: &Path) -> Result<StagedImport, ShareError> {
    let text = std::fs::read_to_string(path)?;
    import_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::codec::{decode, encode};
    use crate::state::data::{Category, Item};

    fn collection() -> Collection {
        Collection::new(vec![Item {
            id: "1700000000000".into(),
            category: Category::Other("Écharpes".into()),
            color_hex: Some("#800020".into()),
            color_name: Some("Burgundy".into()),
            image_data_url: None,
            image_url: Some("https://example.com/scarf.jpg".into()),
            name: None,
        }])
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "closet-export-2026-03-07.json");
    }

    #[test]
    fn test_export_is_pretty_and_matches_link_payload() {
        let text = export_json(&collection()).unwrap();
        assert!(text.contains("\n  \"version\": 3"));

        let from_file = import_json(&text).unwrap();
        let from_link = decode(&encode(&collection()).unwrap()).unwrap();
        assert_eq!(from_file.items, from_link.items);
        assert_eq!(from_file.source, ImportSource::File);
    }

    #[test]
    fn test_write_and_read_export() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let path = write_export(dir.path(), &collection(), date).unwrap();
        assert!(path.ends_with("closet-export-2026-10-16.json"));

        let staged = read_import(&path).unwrap();
        assert_eq!(staged.items, collection().items);
    }

    #[test]
    fn test_import_rejects_empty_file_payload() {
        assert!(matches!(import_json(r#"{"version":3,"items":[]}"#), Err(ShareError::NoValidItems)));
        assert!(matches!(import_json(""), Err(ShareError::Json(_))));
    }
}
