use crate::capture_classifier::render::ViewModel;
use std::error::Error;

/// Presentation layer. Receives a fresh view model after every transition.
pub trait Display {
    fn show(&self, view: &ViewModel) -> Result<(), Box<dyn Error + Send + Sync>>;
}
