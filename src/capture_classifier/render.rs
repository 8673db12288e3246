use super::core::{Cycle, Model, ModelStatus};
use crate::device_camera::interface::{CapturedImage, PermissionState};
use crate::display::interface::Display;
use std::sync::Arc;

pub const STATUS_LOADING_MODEL: &str = "Loading model…";
pub const STATUS_CLASSIFYING: &str = "Classifying…";
pub const STATUS_READY: &str = "Ready to capture";

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Waiting for the platform to report the permission state.
    PermissionLoading,
    PermissionRequest { requesting: bool },
    Camera,
}

/// What the presentation layer gets to see of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub screen: Screen,
    pub model_ready: bool,
    pub thumbnail: Option<CapturedImage>,
    pub status_text: String,
    pub error: Option<String>,
    pub busy: bool,
}

impl ViewModel {
    pub fn can_retry(&self) -> bool {
        self.error.is_some()
    }

    /// A new capture supersedes one still in flight.
    pub fn can_capture(&self) -> bool {
        self.screen == Screen::Camera
    }
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            screen: Screen::PermissionLoading,
            model_ready: false,
            thumbnail: None,
            status_text: STATUS_LOADING_MODEL.to_string(),
            error: None,
            busy: false,
        }
    }
}

pub fn view_model(model: &Model) -> ViewModel {
    let screen = match model.permission {
        PermissionState::Unknown => Screen::PermissionLoading,
        PermissionState::Denied => Screen::PermissionRequest {
            requesting: model.permission_requested,
        },
        PermissionState::Granted => Screen::Camera,
    };

    let status_text = match (&model.current_result, model.model_ready()) {
        (Some(result), _) => result.clone(),
        (None, false) => STATUS_LOADING_MODEL.to_string(),
        (None, true) if model.current_image.is_none() && model.cycle == Cycle::Idle => {
            STATUS_READY.to_string()
        }
        (None, true) => STATUS_CLASSIFYING.to_string(),
    };

    let error = match (&model.cycle, &model.model_status) {
        (Cycle::Failed(error), _) | (_, ModelStatus::Failed(error)) => Some(error.to_string()),
        _ => None,
    };

    let busy = matches!(
        model.cycle,
        Cycle::Capturing
            | Cycle::Decoding { .. }
            | Cycle::AwaitingModel { .. }
            | Cycle::Classifying
    );

    ViewModel {
        screen,
        model_ready: model.model_ready(),
        thumbnail: model.current_image.clone(),
        status_text,
        error,
        busy,
    }
}

#[derive(Clone)]
pub struct Render {
    display: Arc<dyn Display + Send + Sync>,
}

impl Render {
    pub fn new(display: Arc<dyn Display + Send + Sync>) -> Self {
        Self { display }
    }

    pub fn render(&self, model: &Model) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.display.show(&view_model(model))
    }
}
