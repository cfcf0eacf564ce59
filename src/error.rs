//! Error types for the closet tracker
//!
//! Each concern gets its own enum so callers can match on the failure
//! class (decode, validation, device, persistence) and report it once.

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the key/value persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite operation error (wraps rusqlite::Error)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Write rejected because it would exceed the store's quota
    #[error("Storage quota exceeded writing '{key}': need {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// I/O error while preparing the data directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while turning a raw image source into a JPEG data URL
#[derive(Error, Debug)]
pub enum PhotoError {
    /// Caller handed over something that is not an image
    #[error("Not an image file: {0}")]
    NotAnImage(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Neither decode path could make sense of the bytes
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),

    /// Video frame has no pixels yet (camera still warming up)
    #[error("Frame is empty")]
    EmptyFrame,

    #[error("Frame buffer does not match {width}x{height} RGBA")]
    BadFrame { width: u32, height: u32 },

    #[error("Malformed data URL")]
    DataUrl,

    #[error("Task join error: {0}")]
    Join(String),
}

/// Failures of the item and outfit stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Pick a category.")]
    MissingCategory,

    #[error("Add a photo or URL first.")]
    MissingImage,

    #[error("Please paste a valid http(s) image URL: {0}")]
    InvalidUrl(String),

    #[error("Image data must be a data: URL")]
    InvalidDataUrl,

    #[error("No item with id {0}")]
    ItemNotFound(String),

    #[error("No outfit with id {0}")]
    OutfitNotFound(String),

    #[error("Select at least one item for the outfit")]
    EmptyOutfit,

    #[error("No ids left after {0}")]
    IdsExhausted(i64),

    #[error("Failed to serialize '{key}': {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the share link and JSON file codec
#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Import token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Import token is not UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Import payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parsed but has neither an `items` array nor a bare array
    #[error("Invalid format: expected {{\"version\", \"items\": [...]}}")]
    InvalidFormat,

    #[error("No valid items")]
    NoValidItems,

    #[error("Link has no 'import' parameter")]
    MissingToken,

    /// Link would be truncated by browsers and servers
    #[error("Share link is {len} characters, over the {max} character limit; export a file instead")]
    TooLong { len: usize, max: usize },

    #[error("Invalid share base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a Speed-Add capture session
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No usable capture device (missing folder, nothing to capture)
    #[error("Could not open camera: {0}")]
    Unavailable(String),

    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("No capture session is open")]
    NotCapturing,

    #[error("A capture session is already open")]
    AlreadyCapturing,

    #[error("Camera has no frame to capture")]
    NoFrame,

    #[error("Nothing captured yet")]
    EmptyQueue,

    #[error("Choose a category first.")]
    MissingCategory,

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level error gathering every concern
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
