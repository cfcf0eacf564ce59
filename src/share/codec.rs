/// Share link codec
///
/// A collection travels as `base64(JSON {version, items})` in the `import`
/// query parameter. Rust strings are UTF-8, so base64 over the JSON bytes is
/// byte-for-byte what browsers produce with the
/// `btoa(unescape(encodeURIComponent(json)))` dance; non-ASCII category and
/// color names survive in both directions.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::staging::{ImportSource, StagedImport};
use crate::error::ShareError;
use crate::state::data::Item;

/// Payload version written by this crate
pub const SHARE_VERSION: u32 = 3;

/// Query parameter carrying the token
pub const IMPORT_PARAM: &str = "import";

/// Links above this length get truncated by common browsers and servers
pub const DEFAULT_MAX_LINK_LEN: usize = 8000;

/// What gets shared or exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub version: u32,
    pub items: Vec<Item>,
}

impl Collection {
    pub fn new(items: Vec<Item>) -> Self {
        Collection {
            version: SHARE_VERSION,
            items,
        }
    }
}

/// Collection to token
pub fn encode(collection: &Collection) -> Result<String, ShareError> {
    let json = serde_json::to_string(collection)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Token to staged import. Nothing is applied until the caller picks
/// Replace or Merge.
pub fn decode(token: &str) -> Result<StagedImport, ShareError> {
    let bytes = decode_base64(token)?;
    let json = String::from_utf8(bytes)?;
    parse_payload(&json, ImportSource::Link)
}

/// Lenient base64: tolerates percent-escaping, line wrapping, `+` turned
/// into spaces by form decoding, and the URL-safe or unpadded alphabets.
fn decode_base64(token: &str) -> Result<Vec<u8>, ShareError> {
    let trimmed = token.trim();
    let unescaped = if trimmed.contains('%') {
        urlencoding::decode(trimmed)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| trimmed.to_string())
    } else {
        trimmed.to_string()
    };
    let cleaned: String = unescaped
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();

    match STANDARD.decode(&cleaned) {
        Ok(bytes) => Ok(bytes),
        Err(first) => [STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
            .iter()
            .find_map(|engine| engine.decode(&cleaned).ok())
            .ok_or(ShareError::Base64(first)),
    }
}

/// The import-validity rule: string `id`, string `category`, and a string
/// `imageDataURL` or `imageURL`
pub fn is_import_valid(entry: &Value) -> bool {
    let is_str = |field: &str| entry.get(field).is_some_and(Value::is_string);
    entry.is_object()
        && is_str("id")
        && is_str("category")
        && (is_str("imageDataURL") || is_str("imageURL"))
}

/// Parse and validate a JSON payload. Accepts `{items: [...]}` or a bare array.
pub(crate) fn parse_payload(json: &str, source: ImportSource) -> Result<StagedImport, ShareError> {
    let value: Value = serde_json::from_str(json)?;
    let entries = match &value {
        Value::Object(map) => map.get("items").and_then(Value::as_array),
        Value::Array(entries) => Some(entries),
        _ => None,
    }
    .ok_or(ShareError::InvalidFormat)?;
    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok());

    let mut items = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for entry in entries {
        if !is_import_valid(entry) {
            skipped += 1;
            continue;
        }
        match serde_json::from_value::<Item>(entry.clone()) {
            Ok(item) => items.push(item),
            Err(e) => {
                debug!("Skipping malformed item: {}", e);
                skipped += 1;
            }
        }
    }

    if items.is_empty() {
        return Err(ShareError::NoValidItems);
    }

    debug!("Staged {} items ({} skipped)", items.len(), skipped);
    Ok(StagedImport {
        version,
        items,
        skipped,
        source,
    })
}

/// Full share link `base?import=<token>`. Over-long links are an error to
/// report, since the receiving end would see a truncated token.
pub fn share_link(base_url: &str, collection: &Collection, max_len: usize) -> Result<String, ShareError> {
    let token = encode(collection)?;
    let mut url = Url::parse(base_url)?;
    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut().append_pair(IMPORT_PARAM, &token);

    let link = String::from(url);
    if link.len() > max_len {
        return Err(ShareError::TooLong {
            len: link.len(),
            max: max_len,
        });
    }
    Ok(link)
}

/// Pull the token out of a pasted link; a bare token is returned as-is
pub fn token_from_link(input: &str) -> Result<String, ShareError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ShareError::MissingToken);
    }

    match Url::parse(trimmed) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == IMPORT_PARAM)
            .map(|(_, value)| value.into_owned())
            .ok_or(ShareError::MissingToken),
        Err(_) => Ok(trimmed.to_string()),
    }
}

/// The link with the `import` parameter removed, once the import is handled
pub fn without_import_param(link: &str) -> Result<String, ShareError> {
    let mut url = Url::parse(link.trim())?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != IMPORT_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::Category;
    use pretty_assertions::assert_eq;

    fn item(id: &str, category: &str, color: Option<&str>) -> Item {
        Item {
            id: id.to_string(),
            category: Category::from_name(category),
            color_hex: color.map(|_| "#123456".to_string()),
            color_name: color.map(str::to_string),
            image_data_url: None,
            image_url: Some(format!("https://example.com/{id}.jpg")),
            name: None,
        }
    }

    #[test]
    fn test_round_trip_with_non_ascii_names() {
        let collection = Collection::new(vec![
            item("1", "Hoodies", Some("Noir profond")),
            item("2", "Röcke", Some("Grün")),
            item("3", "スカート", None),
        ]);

        let token = encode(&collection).unwrap();
        assert!(token.is_ascii());

        let staged = decode(&token).unwrap();
        assert_eq!(staged.version, Some(SHARE_VERSION));
        assert_eq!(staged.skipped, 0);
        assert_eq!(Collection::new(staged.items), collection);
    }

    #[test]
    fn test_token_matches_browser_encoding() {
        // btoa(unescape(encodeURIComponent('{"é":1}')))
        let token = STANDARD.encode(r#"{"é":1}"#.as_bytes());
        assert_eq!(token, "eyLDqSI6MX0=");
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let json = r##"{"version":3,"items":[
            {"id":"1","category":"Dress","imageURL":"https://a/1.jpg"},
            {"id":"2","category":"Skirts","colorHex":"#000000"},
            {"id":"3","category":"Sweats","imageDataURL":"data:image/jpeg;base64,AA=="}
        ]}"##;
        let staged = decode(&STANDARD.encode(json)).unwrap();
        let ids: Vec<&str> = staged.items.iter().map(|it| it.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(staged.skipped, 1);
    }

    #[test]
    fn test_no_valid_items_is_an_error() {
        let json = r#"{"version":3,"items":[{"id":"2","category":"Skirts"},{"id":7,"category":"Dress","imageURL":"x"}]}"#;
        assert!(matches!(decode(&STANDARD.encode(json)), Err(ShareError::NoValidItems)));

        let empty = r#"{"version":3,"items":[]}"#;
        assert!(matches!(decode(&STANDARD.encode(empty)), Err(ShareError::NoValidItems)));
    }

    #[test]
    fn test_bare_array_payload() {
        let json = r#"[{"id":"1","category":"Dress","imageURL":"https://a/1.jpg"}]"#;
        let staged = decode(&STANDARD.encode(json)).unwrap();
        assert_eq!(staged.version, None);
        assert_eq!(staged.items.len(), 1);
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(decode("!!!not base64!!!"), Err(ShareError::Base64(_))));
        assert!(matches!(decode(&STANDARD.encode([0xff, 0xfe])), Err(ShareError::Utf8(_))));
        assert!(matches!(decode(&STANDARD.encode("{\"items\":[")), Err(ShareError::Json(_))));
        assert!(matches!(decode(&STANDARD.encode("{\"items\":5}")), Err(ShareError::InvalidFormat)));
        assert!(matches!(decode(&STANDARD.encode("\"hello\"")), Err(ShareError::InvalidFormat)));
    }

    #[test]
    fn test_truncated_token_fails() {
        let collection = Collection::new(vec![item("1", "Dress", Some("Black"))]);
        let token = encode(&collection).unwrap();
        let truncated = &token[..token.len() / 2];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn test_share_link_round_trip() {
        let collection = Collection::new(vec![item("1", "Hoodies", Some("Schwarz"))]);
        let link = share_link("https://closet.example/app/?old=1#top", &collection, DEFAULT_MAX_LINK_LEN).unwrap();
        assert!(link.starts_with("https://closet.example/app/?import="));
        assert!(!link.contains('+'));

        let token = token_from_link(&link).unwrap();
        assert_eq!(token, encode(&collection).unwrap());
        assert_eq!(decode(&token).unwrap().items, collection.items);

        // Percent-escaped tokens pasted on their own decode too
        let escaped = link.split_once("import=").unwrap().1;
        assert_eq!(decode(escaped).unwrap().items, collection.items);
    }

    #[test]
    fn test_share_link_too_long() {
        let items = (0..200)
            .map(|i| item(&i.to_string(), "T-Shirt", Some("Burgundy")))
            .collect();
        let err = share_link("https://closet.example/", &Collection::new(items), 2000).unwrap_err();
        assert!(matches!(err, ShareError::TooLong { max: 2000, .. }));
    }

    #[test]
    fn test_token_from_link() {
        assert!(matches!(token_from_link("https://x.example/?a=1"), Err(ShareError::MissingToken)));
        assert!(matches!(token_from_link("   "), Err(ShareError::MissingToken)));
        assert_eq!(token_from_link(" eyJhIjoxfQ== ").unwrap(), "eyJhIjoxfQ==");
    }

    #[test]
    fn test_without_import_param() {
        assert_eq!(
            without_import_param("https://x.example/app?import=abc").unwrap(),
            "https://x.example/app"
        );
        assert_eq!(
            without_import_param("https://x.example/app?theme=dark&import=abc").unwrap(),
            "https://x.example/app?theme=dark"
        );
    }
}
