use thiserror::Error;

/// Failures reported by the collaborators of a capture cycle.
///
/// Messages are kept as strings so the error can live inside the reducer's
/// state and be cloned along with it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Failed to read {uri}: {message}")]
    Io { uri: String, message: String },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    /// Short stage name used in log lines and the retry affordance.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::PermissionDenied => "permission",
            PipelineError::Capture(_) => "capture",
            PipelineError::Io { .. } => "read",
            PipelineError::Decode(_) => "decode",
            PipelineError::ModelLoad(_) => "model load",
            PipelineError::Inference(_) => "inference",
        }
    }
}
