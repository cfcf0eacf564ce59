//! Closet tracker
//!
//! Clothing photos tagged by category and color, outfits built from tops
//! and bottoms, and collections shared as a link or JSON file. Everything
//! is stored locally in one SQLite key/value database.
//!
//! - `photo` - photo files and camera frames to bounded JPEG data URLs
//! - `state` - persistence, item/outfit stores, preferences
//! - `share` - share tokens, JSON export, staged Replace/Merge imports
//! - `speed` - Speed-Add burst capture sessions

pub mod config;
pub mod error;
pub mod photo;
pub mod share;
pub mod speed;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::data::{Category, Color, Draft, ImageRef, Item, Outfit, Slot};
pub use state::{Closet, KeyValueStore, Library, MemoryStore};
