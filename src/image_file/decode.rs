use crate::error::PipelineError;
use image::{DynamicImage, GenericImageView};
use std::fmt;

/// Pixels of one capture, alive for a single classification.
#[derive(Clone, PartialEq)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecodedImage({}x{})", self.width, self.height)
    }
}

impl From<DynamicImage> for DecodedImage {
    fn from(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            width,
            height,
        }
    }
}

/// Decodes any format the `image` crate recognizes from its magic bytes.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::Decode("empty image data".to_string()));
    }

    image::load_from_memory(bytes)
        .map(DecodedImage::from)
        .map_err(|e| PipelineError::Decode(e.to_string()))
}
