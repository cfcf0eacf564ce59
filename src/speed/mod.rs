/// Speed-Add: rapid multi-photo capture committed as items in bulk
///
/// - `camera.rs` - capture devices and their acquire/release contract
/// - `session.rs` - the capture queue and its Idle/Capturing state machine

pub mod camera;
pub mod session;

pub use camera::{Camera, FolderCamera};
pub use session::{GalleryReport, QueueEntry, SessionState, SpeedAdd};
