use crate::error::PipelineError;
use crate::image_file::decode::DecodedImage;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

pub trait ImageClassifier {
    /// Prepares the model. Calling it again after success is a no-op.
    fn load(&self) -> Result<(), PipelineError>;

    /// Predictions ordered by descending confidence.
    fn classify(&self, image: &DecodedImage) -> Result<Vec<Classification>, PipelineError>;
}
