use crate::device_camera::interface::{CapturedImage, DeviceCamera, PermissionState};
use crate::error::PipelineError;
use crate::library::logger::interface::Logger;
use image::RgbImage;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PERMISSION_PROMPT_DELAY: Duration = Duration::from_millis(300);
const CAPTURE_DELAY: Duration = Duration::from_millis(200);
const CAPTURE_SIZE: u32 = 224;
/// Captures rotate through this many file names in `capture_dir`.
const CAPTURE_SLOTS: u64 = 8;

/// Camera that asks for permission like a phone would and "captures" random
/// noise written to a JPEG in `capture_dir`.
pub struct DeviceCameraFake {
    logger: Arc<dyn Logger + Send + Sync>,
    capture_dir: PathBuf,
    resolved_permission: PermissionState,
    requested_permission: PermissionState,
    permission: Arc<Mutex<PermissionState>>,
    subscribers: Arc<Mutex<Vec<Sender<PermissionState>>>>,
    capture_count: AtomicU64,
}

impl DeviceCameraFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, capture_dir: PathBuf) -> Self {
        Self {
            logger: logger.with_namespace("camera").with_namespace("fake"),
            capture_dir,
            resolved_permission: PermissionState::Denied,
            requested_permission: PermissionState::Granted,
            permission: Arc::new(Mutex::new(PermissionState::Unknown)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            capture_count: AtomicU64::new(0),
        }
    }

    /// State the platform settles on before any prompt, and the user's answer
    /// to the prompt.
    #[allow(dead_code)]
    pub fn with_permission_answers(
        mut self,
        resolved: PermissionState,
        requested: PermissionState,
    ) -> Self {
        self.resolved_permission = resolved;
        self.requested_permission = requested;
        self
    }

    fn set_permission(&self, state: PermissionState) {
        *self
            .permission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|subscriber| subscriber.send(state).is_ok());
    }

    fn permission(&self) -> PermissionState {
        *self
            .permission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_noise(&self, path: &Path) -> Result<(), PipelineError> {
        let mut rng = rand::rng();
        let image = RgbImage::from_fn(CAPTURE_SIZE, CAPTURE_SIZE, |_, _| {
            image::Rgb([rng.random(), rng.random(), rng.random()])
        });

        std::fs::create_dir_all(&self.capture_dir)
            .map_err(|e| PipelineError::Capture(e.to_string()))?;
        image
            .save(path)
            .map_err(|e| PipelineError::Capture(e.to_string()))
    }
}

impl DeviceCamera for DeviceCameraFake {
    fn permission_events(&self) -> Receiver<PermissionState> {
        let (tx, rx) = channel();
        let _ = tx.send(self.permission());

        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);

        if self.permission() == PermissionState::Unknown {
            let resolved = self.resolved_permission;
            let permission = self.permission.clone();
            let subscribers = self.subscribers.clone();
            std::thread::spawn(move || {
                std::thread::sleep(PERMISSION_PROMPT_DELAY);
                *permission
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = resolved;
                subscribers
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .retain(|subscriber| subscriber.send(resolved).is_ok());
            });
        }

        rx
    }

    fn request_permission(&self) -> Result<PermissionState, PipelineError> {
        let _ = self.logger.info("Prompting for camera permission...");
        std::thread::sleep(PERMISSION_PROMPT_DELAY);
        self.set_permission(self.requested_permission);
        let _ = self
            .logger
            .info(&format!("Permission answer: {:?}", self.requested_permission));
        Ok(self.requested_permission)
    }

    fn capture(&self) -> Result<CapturedImage, PipelineError> {
        if self.permission() != PermissionState::Granted {
            return Err(PipelineError::PermissionDenied);
        }

        let _ = self.logger.info("Capturing photo...");
        std::thread::sleep(CAPTURE_DELAY);

        let n = self.capture_count.fetch_add(1, Ordering::SeqCst);
        let path = self
            .capture_dir
            .join(format!("capture-{}.jpg", n % CAPTURE_SLOTS));
        self.write_noise(&path)?;

        let image = CapturedImage::from_path(&path);
        let _ = self.logger.info(&format!("Picture saved: {}", image.uri));
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_memory::LoggerMemory;

    fn camera(dir: &tempfile::TempDir) -> DeviceCameraFake {
        DeviceCameraFake::new(Arc::new(LoggerMemory::new()), dir.path().to_path_buf())
    }

    #[test]
    fn test_permission_resolves_then_follows_request() {
        let dir = tempfile::tempdir().unwrap();
        let camera = camera(&dir);

        let events = camera.permission_events();
        assert_eq!(events.recv().unwrap(), PermissionState::Unknown);
        assert_eq!(events.recv().unwrap(), PermissionState::Denied);

        assert_eq!(camera.request_permission(), Ok(PermissionState::Granted));
        assert_eq!(events.recv().unwrap(), PermissionState::Granted);
    }

    #[test]
    fn test_refused_prompt_keeps_capture_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let camera = camera(&dir)
            .with_permission_answers(PermissionState::Denied, PermissionState::Denied);

        assert_eq!(camera.request_permission(), Ok(PermissionState::Denied));
        assert_eq!(camera.capture(), Err(PipelineError::PermissionDenied));
    }

    #[test]
    fn test_capture_refused_without_permission() {
        let dir = tempfile::tempdir().unwrap();
        let camera = camera(&dir);

        assert_eq!(camera.capture(), Err(PipelineError::PermissionDenied));
    }

    #[test]
    fn test_capture_writes_decodable_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let camera = camera(&dir);
        camera.request_permission().unwrap();

        let first = camera.capture().unwrap();
        let second = camera.capture().unwrap();

        assert_ne!(first, second);
        let decoded = image::open(first.path()).unwrap();
        assert_eq!(decoded.width(), CAPTURE_SIZE);
    }

    #[test]
    fn test_captures_reuse_a_bounded_set_of_files() {
        let dir = tempfile::tempdir().unwrap();
        let camera = camera(&dir);
        camera.request_permission().unwrap();

        let captures: Vec<CapturedImage> = (0..CAPTURE_SLOTS + 1)
            .map(|_| camera.capture().unwrap())
            .collect();

        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files as u64, CAPTURE_SLOTS);
        assert_eq!(captures[0], captures[CAPTURE_SLOTS as usize]);
        assert_ne!(captures[0], captures[1]);
    }
}
