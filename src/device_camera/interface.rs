use crate::error::PipelineError;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// The platform has not answered yet.
    Unknown,
    Denied,
    Granted,
}

/// Locator of a photo produced by a capture. The bytes behind it belong to
/// the camera; the pipeline only holds the reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapturedImage {
    pub uri: String,
}

impl CapturedImage {
    pub fn from_path(path: &Path) -> Self {
        Self {
            uri: format!("file://{}", path.display()),
        }
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }
}

pub trait DeviceCamera {
    /// Current permission state on subscribe, then every change.
    fn permission_events(&self) -> Receiver<PermissionState>;
    fn request_permission(&self) -> Result<PermissionState, PipelineError>;
    fn capture(&self) -> Result<CapturedImage, PipelineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_round_trips_through_path() {
        let image = CapturedImage::from_path(Path::new("/tmp/capture-1.jpg"));

        assert_eq!(image.uri, "file:///tmp/capture-1.jpg");
        assert_eq!(image.path(), PathBuf::from("/tmp/capture-1.jpg"));
    }

    #[test]
    fn test_plain_path_uri() {
        let image = CapturedImage {
            uri: "photos/cat.png".to_string(),
        };

        assert_eq!(image.path(), PathBuf::from("photos/cat.png"));
    }
}
