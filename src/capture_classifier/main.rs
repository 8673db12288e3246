use super::core::{init, transition, Effect, Event, Model};
use super::render::Render;
use super::run_effect::RunEffect;
use crate::device_camera::interface::DeviceCamera;
use crate::display::interface::Display;
use crate::image_classifier::interface::ImageClassifier;
use crate::image_file::interface::ImageFiles;
use crate::library::logger::interface::Logger;
use crate::library::state_machine::StateMachine;
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Wires the reducer to its collaborators.
pub struct CaptureClassifier {
    logger: Arc<dyn Logger + Send + Sync>,
    run_effect: RunEffect,
    render: Render,
}

impl CaptureClassifier {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        device_camera: Arc<dyn DeviceCamera + Send + Sync>,
        image_files: Arc<dyn ImageFiles + Send + Sync>,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
        display: Arc<dyn Display + Send + Sync>,
    ) -> Self {
        let logger = logger.with_namespace("capture_classifier");
        Self {
            run_effect: RunEffect::new(
                logger.clone(),
                device_camera,
                image_files,
                image_classifier,
            ),
            render: Render::new(display),
            logger,
        }
    }

    pub fn into_state_machine(
        self,
    ) -> StateMachine<
        Model,
        Event,
        Effect,
        impl Fn(Model, Event) -> (Model, Vec<Effect>),
        impl Fn(&Model),
        impl Fn(Effect, Sender<Event>) + Send + Sync + 'static,
    > {
        let transition_logger = self.logger.clone();
        let render_logger = self.logger.clone();
        let render = self.render;
        let run_effect = self.run_effect;

        StateMachine::new(
            init(),
            move |model: Model, event: Event| {
                let _ = transition_logger.info(&format!(
                    "\nold model:\n\t{:?}\n\nevent:\n\t{:?}",
                    model, event,
                ));
                let (new_model, effects) = transition(model, event);
                let _ = transition_logger.info(&format!(
                    "\nnew model:\n\t{:?}\n\neffects:\n\t{:?}",
                    new_model, effects
                ));
                (new_model, effects)
            },
            move |model: &Model| {
                if let Err(e) = render.render(model) {
                    let _ = render_logger.error(&format!("Render failed: {}", e));
                }
            },
            move |effect: Effect, event_sender: Sender<Event>| {
                run_effect.run_effect(effect, event_sender)
            },
        )
    }
}
