use super::fixture::{cycle, decoded, granted_ready, photo};
use crate::capture_classifier::core::{init, transition, Cycle, Event, ModelStatus};
use crate::capture_classifier::render::{
    view_model, Screen, STATUS_CLASSIFYING, STATUS_LOADING_MODEL, STATUS_READY,
};
use crate::device_camera::interface::PermissionState;
use crate::error::PipelineError;

#[test]
fn test_screen_follows_permission() {
    let (model, _) = init();
    assert_eq!(view_model(&model).screen, Screen::PermissionLoading);

    let (model, _) = transition(model, Event::PermissionChanged(PermissionState::Denied));
    assert_eq!(
        view_model(&model).screen,
        Screen::PermissionRequest { requesting: false }
    );

    let (model, _) = transition(model, Event::RequestPermissionPressed);
    assert_eq!(
        view_model(&model).screen,
        Screen::PermissionRequest { requesting: true }
    );

    let (model, _) = transition(
        model,
        Event::PermissionRequestDone(Ok(PermissionState::Granted)),
    );
    assert_eq!(view_model(&model).screen, Screen::Camera);
}

#[test]
fn test_status_text_choices() {
    let (mut model, _) = init();
    model.permission = PermissionState::Granted;
    assert_eq!(view_model(&model).status_text, STATUS_LOADING_MODEL);
    assert!(!view_model(&model).model_ready);

    model.model_status = ModelStatus::Ready;
    assert_eq!(view_model(&model).status_text, STATUS_READY);

    model.current_image = Some(photo("a.jpg"));
    model.cycle = Cycle::Classifying;
    let view = view_model(&model);
    assert_eq!(view.status_text, STATUS_CLASSIFYING);
    assert!(view.busy);
    assert_eq!(view.thumbnail, Some(photo("a.jpg")));

    model.current_result = Some("tabby cat (0.842)".to_string());
    model.cycle = Cycle::Idle;
    let view = view_model(&model);
    assert_eq!(view.status_text, "tabby cat (0.842)");
    assert!(!view.busy);
}

#[test]
fn test_waiting_for_model_is_busy() {
    let (mut model, _) = init();
    model.permission = PermissionState::Granted;
    model.current_image = Some(photo("a.jpg"));
    model.cycle = Cycle::AwaitingModel { decoded: decoded() };

    let view = view_model(&model);

    assert!(view.busy);
    assert_eq!(view.status_text, STATUS_LOADING_MODEL);
}

#[test]
fn test_failure_surfaces_error_but_keeps_status_text() {
    let (mut model, _) = init();
    model.permission = PermissionState::Granted;
    model.model_status = ModelStatus::Ready;
    model.current_image = Some(photo("a.jpg"));
    model.cycle = Cycle::Failed(PipelineError::Inference("boom".to_string()));

    let view = view_model(&model);

    assert_eq!(view.status_text, STATUS_CLASSIFYING);
    assert_eq!(view.error.as_deref(), Some("Inference failed: boom"));
    assert!(view.can_retry());
    assert!(!view.busy);
}

#[test]
fn test_model_load_failure_surfaces_error() {
    let (mut model, _) = init();
    model.model_status = ModelStatus::Failed(PipelineError::ModelLoad("no file".to_string()));

    let view = view_model(&model);

    assert_eq!(view.error.as_deref(), Some("Failed to load model: no file"));
    assert!(!view.model_ready);
}

#[test]
fn test_empty_result_leaves_classifying_status() {
    let model = cycle(granted_ready(), "a.jpg", Ok(vec![]));

    let view = view_model(&model);

    assert_eq!(model.cycle, Cycle::Idle);
    assert_eq!(view.status_text, STATUS_CLASSIFYING);
    assert!(!view.busy);
    assert_eq!(view.error, None);
}

#[test]
fn test_capture_stays_available_while_busy() {
    let (model, _) = transition(granted_ready(), Event::CapturePressed);

    let view = view_model(&model);

    assert!(view.busy);
    assert!(view.can_capture());

    let (mut model, _) = init();
    model.permission = PermissionState::Denied;
    assert!(!view_model(&model).can_capture());
}
