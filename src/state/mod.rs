/// State management module
///
/// This module handles all application state, including:
/// - Key/value persistence over SQLite (library.rs)
/// - Shared data structures (data.rs)
/// - Item and outfit stores (items.rs, outfits.rs)
/// - Sticky preferences and the add-form draft (prefs.rs)
/// - The state object tying them together (closet.rs)

pub mod closet;
pub mod data;
pub mod items;
pub mod library;
pub mod outfits;
pub mod prefs;

pub use closet::Closet;
pub use library::{KeyValueStore, Library, MemoryStore};
