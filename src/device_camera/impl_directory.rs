use crate::device_camera::interface::{CapturedImage, DeviceCamera, PermissionState};
use crate::error::PipelineError;
use crate::library::logger::interface::Logger;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

const PHOTO_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Camera backed by a folder of photos. Each capture returns the next photo,
/// wrapping around at the end. There is no permission to ask for.
pub struct DeviceCameraDirectory {
    logger: Arc<dyn Logger + Send + Sync>,
    photo_dir: PathBuf,
    next: AtomicUsize,
}

impl DeviceCameraDirectory {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, photo_dir: PathBuf) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("directory"),
            photo_dir,
            next: AtomicUsize::new(0),
        }
    }

    fn list_photos(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let entries = std::fs::read_dir(&self.photo_dir).map_err(|e| {
            PipelineError::Capture(format!("{}: {}", self.photo_dir.display(), e))
        })?;

        let mut photos: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_photo(path))
            .collect();
        photos.sort();
        Ok(photos)
    }
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PHOTO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

impl DeviceCamera for DeviceCameraDirectory {
    fn permission_events(&self) -> Receiver<PermissionState> {
        let (tx, rx) = channel();
        let _ = tx.send(PermissionState::Granted);
        rx
    }

    fn request_permission(&self) -> Result<PermissionState, PipelineError> {
        Ok(PermissionState::Granted)
    }

    fn capture(&self) -> Result<CapturedImage, PipelineError> {
        let photos = self.list_photos()?;
        if photos.is_empty() {
            return Err(PipelineError::Capture(format!(
                "no photos in {}",
                self.photo_dir.display()
            )));
        }

        let index = self.next.fetch_add(1, Ordering::SeqCst) % photos.len();
        let image = CapturedImage::from_path(&photos[index]);
        let _ = self.logger.info(&format!("Picked {}", image.uri));
        Ok(image)
    }
}
