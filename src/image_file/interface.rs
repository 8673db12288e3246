use crate::device_camera::interface::CapturedImage;
use crate::error::PipelineError;

/// Access to the encoded bytes behind a capture.
pub trait ImageFiles {
    fn read_bytes(&self, image: &CapturedImage) -> Result<Vec<u8>, PipelineError>;
}
