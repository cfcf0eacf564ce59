/// Speed-Add capture session
///
/// Idle -> Capturing on `open`; push/undo/shutter loop while Capturing;
/// back to Idle on `commit` or `discard`. The queue lives only in memory
/// and the camera is released on every path out of Capturing.

use std::path::PathBuf;
use tracing::{info, warn};

use super::camera::Camera;
use crate::error::{CaptureError, PhotoError};
use crate::photo::loader::{normalize_batch, GALLERY_YIELD_EVERY};
use crate::photo::{normalize, NormalizeOptions};
use crate::state::data::{Category, Color, Item};
use crate::state::items::{now_ms, ItemStore};

/// One captured, already-normalized picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub data_url: String,
    pub ts: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
}

/// Result of adding gallery files to the queue
#[derive(Debug, Default)]
pub struct GalleryReport {
    pub added: usize,
    pub failures: Vec<(PathBuf, PhotoError)>,
}

pub struct SpeedAdd {
    camera: Option<Box<dyn Camera>>,
    queue: Vec<QueueEntry>,
    options: NormalizeOptions,
}

impl SpeedAdd {
    pub fn new(options: NormalizeOptions) -> Self {
        SpeedAdd {
            camera: None,
            queue: Vec::new(),
            options,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.camera.is_some() {
            SessionState::Capturing
        } else {
            SessionState::Idle
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.queue
    }

    /// Acquire the camera and start an empty queue.
    /// A failed acquisition leaves the session Idle with nothing held.
    pub fn open(&mut self, mut camera: Box<dyn Camera>) -> Result<(), CaptureError> {
        if self.camera.is_some() {
            return Err(CaptureError::AlreadyCapturing);
        }
        if let Err(e) = camera.start() {
            camera.stop();
            warn!("Camera acquisition failed: {}", e);
            return Err(e);
        }
        self.queue.clear();
        self.camera = Some(camera);
        Ok(())
    }

    /// Append an already-normalized picture; returns the new queue length
    pub fn push(&mut self, data_url: String) -> Result<usize, CaptureError> {
        if self.camera.is_none() {
            return Err(CaptureError::NotCapturing);
        }
        self.queue.push(QueueEntry {
            data_url,
            ts: now_ms(),
        });
        Ok(self.queue.len())
    }

    /// Grab the current camera frame, normalize it and queue it
    pub fn shutter(&mut self) -> Result<usize, CaptureError> {
        let camera = self.camera.as_mut().ok_or(CaptureError::NotCapturing)?;
        let frame = camera.grab()?;
        let image = match normalize(&frame, &self.options) {
            Ok(image) => image,
            Err(PhotoError::EmptyFrame) => return Err(CaptureError::NoFrame),
            Err(e) => return Err(e.into()),
        };
        self.push(image.data_url)
    }

    /// Queue photos picked from the gallery. Non-images and unreadable
    /// files are reported and skipped; the rest are queued in order.
    pub async fn add_from_gallery(&mut self, paths: Vec<PathBuf>) -> Result<GalleryReport, CaptureError> {
        if self.camera.is_none() {
            return Err(CaptureError::NotCapturing);
        }

        let report = normalize_batch(paths, self.options, GALLERY_YIELD_EVERY).await;
        let added = report.images.len();
        for (_, image) in report.images {
            self.push(image.data_url)?;
        }
        Ok(GalleryReport {
            added,
            failures: report.failures,
        })
    }

    /// Drop the most recent capture. No-op on an empty queue.
    pub fn undo(&mut self) -> Option<QueueEntry> {
        self.queue.pop()
    }

    /// Turn every queued picture into an item, then close the session.
    /// On error nothing is committed and the session stays open.
    pub fn commit(
        &mut self,
        category: &Category,
        color: Option<&Color>,
        store: &mut ItemStore<'_>,
    ) -> Result<Vec<Item>, CaptureError> {
        if self.camera.is_none() {
            return Err(CaptureError::NotCapturing);
        }
        if category.is_blank() {
            return Err(CaptureError::MissingCategory);
        }
        if self.queue.is_empty() {
            return Err(CaptureError::EmptyQueue);
        }

        let data_urls = self.queue.iter().map(|q| q.data_url.clone()).collect();
        let items = store.add_batch(category, color, data_urls)?;
        info!("Saved {} items to {}", items.len(), category);
        self.close();
        Ok(items)
    }

    /// Throw the queue away and close the session
    pub fn discard(&mut self) {
        if !self.queue.is_empty() {
            info!("Discarding {} captured photos", self.queue.len());
        }
        self.close();
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.stop();
        }
        self.queue.clear();
    }
}

impl Drop for SpeedAdd {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SpeedAdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeedAdd")
            .field("state", &self.state())
            .field("queued", &self.queue.len())
            .finish()
    }
}
