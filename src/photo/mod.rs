/// Photo intake module
///
/// This module handles:
/// - Decoding photo files and camera frames
/// - Downscaling to the stored size
/// - Encoding to JPEG data URLs
/// - Batch loading with per-file fault isolation

pub mod loader;
pub mod normalize;

pub use loader::{normalize_batch, normalize_file, BatchReport};
pub use normalize::{
    decode_data_url, is_image_file, looks_like_url, normalize, ImageSource, NormalizeOptions,
    NormalizedImage, RawFrame,
};
