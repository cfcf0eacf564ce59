/// Collection sharing
///
/// - `codec`: base64 share tokens and links
/// - `file`: pretty JSON export/import
/// - `staging`: decoded imports waiting for Replace or Merge

pub mod codec;
pub mod file;
pub mod staging;

pub use codec::{decode, encode, share_link, token_from_link, Collection, DEFAULT_MAX_LINK_LEN};
pub use staging::{merge_items, ImportMode, ImportSource, StagedImport};
