/// Capture devices for Speed-Add
///
/// A `Camera` is acquired when a session opens and must be released when
/// it ends, whichever way it ends.

use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{CaptureError, PhotoError};
use crate::photo::loader::images_in_folder;
use crate::photo::ImageSource;

pub trait Camera {
    /// Acquire the device. On error the device must hold nothing.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Grab the current frame
    fn grab(&mut self) -> Result<ImageSource, CaptureError>;

    /// Release the device. Safe to call more than once.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

/// A "camera" fed by a folder of photos, e.g. a tethered-shooting or phone
/// sync folder. Each shutter press consumes the next image in name order.
#[derive(Debug)]
pub struct FolderCamera {
    folder: PathBuf,
    frames: VecDeque<PathBuf>,
    live: bool,
}

impl FolderCamera {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        FolderCamera {
            folder: folder.into(),
            frames: VecDeque::new(),
            live: false,
        }
    }

    /// Frames not yet captured
    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Camera for FolderCamera {
    fn start(&mut self) -> Result<(), CaptureError> {
        if !self.folder.is_dir() {
            return Err(CaptureError::Unavailable(format!(
                "no capture folder at {}",
                self.folder.display()
            )));
        }

        // Probe readability so a locked folder reports as a permission problem
        if let Err(e) = std::fs::read_dir(&self.folder) {
            return Err(if e.kind() == std::io::ErrorKind::PermissionDenied {
                CaptureError::PermissionDenied(self.folder.display().to_string())
            } else {
                CaptureError::Unavailable(e.to_string())
            });
        }

        let frames: VecDeque<PathBuf> = images_in_folder(&self.folder).into();
        if frames.is_empty() {
            return Err(CaptureError::Unavailable(format!(
                "no photos in {}",
                self.folder.display()
            )));
        }

        info!("Camera folder {} opened with {} frames", self.folder.display(), frames.len());
        self.frames = frames;
        self.live = true;
        Ok(())
    }

    fn grab(&mut self) -> Result<ImageSource, CaptureError> {
        if !self.live {
            return Err(CaptureError::NotCapturing);
        }
        let path = self.frames.pop_front().ok_or(CaptureError::NoFrame)?;
        debug!("Grabbing frame {}", path.display());
        let bytes = std::fs::read(&path).map_err(|source| {
            CaptureError::Photo(PhotoError::Read {
                path: path.display().to_string(),
                source,
            })
        })?;
        Ok(ImageSource::Encoded(bytes))
    }

    fn stop(&mut self) {
        if self.live {
            debug!("Camera folder {} released", self.folder.display());
        }
        self.live = false;
        self.frames.clear();
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
