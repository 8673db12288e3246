use crate::device_camera::interface::{CapturedImage, PermissionState};
use crate::error::PipelineError;
use crate::image_classifier::interface::Classification;
use crate::image_file::decode::DecodedImage;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Loading,
    Ready,
    Failed(PipelineError),
}

/// Where the current capture cycle is. `Idle` doubles as "displaying": the
/// last published result lives in `Model::current_result`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cycle {
    Idle,
    Capturing,
    Decoding { image: CapturedImage },
    AwaitingModel { decoded: Arc<DecodedImage> },
    Classifying,
    Failed(PipelineError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub permission: PermissionState,
    pub permission_requested: bool,
    pub model_status: ModelStatus,
    /// Bumped by every capture or retry. Completions from older generations
    /// are dropped.
    pub generation: u64,
    pub current_image: Option<CapturedImage>,
    pub current_result: Option<String>,
    pub cycle: Cycle,
}

impl Model {
    pub fn model_ready(&self) -> bool {
        self.model_status == ModelStatus::Ready
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

#[derive(Debug)]
pub enum Event {
    PermissionChanged(PermissionState),
    RequestPermissionPressed,
    PermissionRequestDone(Result<PermissionState, PipelineError>),
    ModelLoadDone(Result<(), PipelineError>),
    CapturePressed,
    RetryPressed,
    CaptureDone {
        generation: u64,
        result: Result<CapturedImage, PipelineError>,
    },
    DecodeDone {
        generation: u64,
        result: Result<Arc<DecodedImage>, PipelineError>,
    },
    ClassifyDone {
        generation: u64,
        result: Result<Vec<Classification>, PipelineError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SubscribeToPermission,
    RequestPermission,
    LoadModel,
    Capture {
        generation: u64,
    },
    /// Read the bytes behind the capture and decode them.
    Decode {
        generation: u64,
        image: CapturedImage,
    },
    Classify {
        generation: u64,
        decoded: Arc<DecodedImage>,
    },
}

pub fn init() -> (Model, Vec<Effect>) {
    (
        Model {
            permission: PermissionState::Unknown,
            permission_requested: false,
            model_status: ModelStatus::Loading,
            generation: 0,
            current_image: None,
            current_result: None,
            cycle: Cycle::Idle,
        },
        vec![Effect::SubscribeToPermission, Effect::LoadModel],
    )
}

/// `"<label> (<confidence to 3 decimals>)"`
pub fn format_prediction(prediction: &Classification) -> String {
    format!(
        "{} ({:.3})",
        prediction.label,
        prediction.confidence.clamp(0.0, 1.0)
    )
}

pub fn transition(mut model: Model, event: Event) -> (Model, Vec<Effect>) {
    match event {
        // Permission
        Event::PermissionChanged(permission) => {
            model.permission = permission;
            (model, vec![])
        }
        Event::RequestPermissionPressed => {
            if model.permission == PermissionState::Denied && !model.permission_requested {
                model.permission_requested = true;
                (model, vec![Effect::RequestPermission])
            } else {
                (model, vec![])
            }
        }
        Event::PermissionRequestDone(result) => {
            model.permission_requested = false;
            if let Ok(permission) = result {
                model.permission = permission;
            }
            (model, vec![])
        }

        // Model
        Event::ModelLoadDone(Ok(())) => {
            model.model_status = ModelStatus::Ready;
            match model.cycle.clone() {
                Cycle::AwaitingModel { decoded } => {
                    model.cycle = Cycle::Classifying;
                    let generation = model.generation;
                    (model, vec![Effect::Classify { generation, decoded }])
                }
                _ => (model, vec![]),
            }
        }
        Event::ModelLoadDone(Err(error)) => {
            if matches!(model.cycle, Cycle::AwaitingModel { .. }) {
                model.cycle = Cycle::Failed(error.clone());
            }
            model.model_status = ModelStatus::Failed(error);
            (model, vec![])
        }

        // Capture cycle
        Event::CapturePressed => {
            if model.permission != PermissionState::Granted {
                return (model, vec![]);
            }
            let generation = model.next_generation();
            model.cycle = Cycle::Capturing;
            (model, vec![Effect::Capture { generation }])
        }
        Event::CaptureDone { generation, .. }
        | Event::DecodeDone { generation, .. }
        | Event::ClassifyDone { generation, .. }
            if generation != model.generation =>
        {
            (model, vec![])
        }
        Event::CaptureDone { generation, result } => match result {
            Ok(image) => {
                model.current_image = Some(image.clone());
                model.cycle = Cycle::Decoding {
                    image: image.clone(),
                };
                (model, vec![Effect::Decode { generation, image }])
            }
            Err(error) => {
                model.cycle = Cycle::Failed(error);
                (model, vec![])
            }
        },
        Event::DecodeDone { generation, result } => match result {
            Ok(decoded) => match model.model_status.clone() {
                ModelStatus::Ready => {
                    model.cycle = Cycle::Classifying;
                    (model, vec![Effect::Classify { generation, decoded }])
                }
                ModelStatus::Loading => {
                    model.cycle = Cycle::AwaitingModel { decoded };
                    (model, vec![])
                }
                ModelStatus::Failed(error) => {
                    model.cycle = Cycle::Failed(error);
                    (model, vec![])
                }
            },
            Err(error) => {
                model.cycle = Cycle::Failed(error);
                (model, vec![])
            }
        },
        Event::ClassifyDone { result, .. } => match result {
            Ok(predictions) => match predictions.first() {
                Some(top) if !top.confidence.is_finite() => {
                    model.cycle = Cycle::Failed(PipelineError::Inference(format!(
                        "non-finite confidence for {}",
                        top.label
                    )));
                    (model, vec![])
                }
                top => {
                    if let Some(top) = top {
                        model.current_result = Some(format_prediction(top));
                    }
                    model.cycle = Cycle::Idle;
                    (model, vec![])
                }
            },
            Err(error) => {
                model.cycle = Cycle::Failed(error);
                (model, vec![])
            }
        },

        Event::RetryPressed => retry(model),
    }
}

fn retry(mut model: Model) -> (Model, Vec<Effect>) {
    let mut effects = vec![];

    if matches!(model.model_status, ModelStatus::Failed(_)) {
        model.model_status = ModelStatus::Loading;
        effects.push(Effect::LoadModel);
    }

    if let Cycle::Failed(error) = model.cycle.clone() {
        let recapture = matches!(
            error,
            PipelineError::Capture(_) | PipelineError::PermissionDenied
        );

        match model.current_image.clone() {
            _ if recapture && model.permission == PermissionState::Granted => {
                let generation = model.next_generation();
                model.cycle = Cycle::Capturing;
                effects.push(Effect::Capture { generation });
            }
            Some(image) if !recapture => {
                let generation = model.next_generation();
                model.cycle = Cycle::Decoding {
                    image: image.clone(),
                };
                effects.push(Effect::Decode { generation, image });
            }
            _ => {
                model.cycle = Cycle::Idle;
            }
        }
    }

    (model, effects)
}
