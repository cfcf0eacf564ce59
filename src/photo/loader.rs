/// Async loading of photo files
///
/// Decoding and JPEG encoding are CPU-bound, so they run on the blocking
/// pool. Batches walk their files one at a time and yield to the runtime
/// every few files; one unreadable file never aborts the rest.

use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::normalize::{is_image_file, normalize, ImageSource, NormalizeOptions, NormalizedImage, RawFrame};
use crate::error::PhotoError;

/// Files per cooperative yield when batch-adding from the add form
pub const BATCH_YIELD_EVERY: usize = 3;

/// Files per cooperative yield when adding gallery shots to a Speed-Add queue
pub const GALLERY_YIELD_EVERY: usize = 2;

/// Outcome of a multi-file normalization
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successfully normalized files, in input order
    pub images: Vec<(PathBuf, NormalizedImage)>,
    /// Files that could not be used, with the reason
    pub failures: Vec<(PathBuf, PhotoError)>,
}

impl BatchReport {
    pub fn data_urls(&self) -> Vec<String> {
        self.images.iter().map(|(_, img)| img.data_url.clone()).collect()
    }

    pub fn total(&self) -> usize {
        self.images.len() + self.failures.len()
    }
}

/// Normalize one photo file off the async thread
pub async fn normalize_file(path: PathBuf, opts: NormalizeOptions) -> Result<NormalizedImage, PhotoError> {
    if !is_image_file(&path) {
        return Err(PhotoError::NotAnImage(path.display().to_string()));
    }

    let bytes = tokio::fs::read(&path).await.map_err(|source| PhotoError::Read {
        path: path.display().to_string(),
        source,
    })?;

    task::spawn_blocking(move || normalize(&ImageSource::Encoded(bytes), &opts))
        .await
        .map_err(|e| PhotoError::Join(e.to_string()))?
}

/// Normalize one camera frame off the async thread
pub async fn normalize_frame(frame: RawFrame, opts: NormalizeOptions) -> Result<NormalizedImage, PhotoError> {
    task::spawn_blocking(move || normalize(&ImageSource::Frame(frame), &opts))
        .await
        .map_err(|e| PhotoError::Join(e.to_string()))?
}

/// Normalize many files in order, best-effort per file
pub async fn normalize_batch(paths: Vec<PathBuf>, opts: NormalizeOptions, yield_every: usize) -> BatchReport {
    let mut report = BatchReport::default();
    let total = paths.len();

    for (i, path) in paths.into_iter().enumerate() {
        if yield_every > 0 && i % yield_every == 0 {
            task::yield_now().await;
        }

        match normalize_file(path.clone(), opts).await {
            Ok(image) => {
                debug!("[{}/{}] {}", i + 1, total, path.display());
                report.images.push((path, image));
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.failures.push((path, e));
            }
        }
    }

    info!(
        "Batch complete: {} normalized, {} failed",
        report.images.len(),
        report.failures.len()
    );
    report
}

/// Expand files and folders into a sorted list of image files.
/// Folders are walked recursively; plain files are kept even when they
/// don't look like images so the batch can report them.
pub fn collect_image_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_image_file(p))
                .collect();
            found.sort();
            debug!("Found {} images under {}", found.len(), input.display());
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// Read a whole folder of images, used by the folder camera
pub fn images_in_folder(folder: &Path) -> Vec<PathBuf> {
    collect_image_files(&[folder.to_path_buf()])
}
