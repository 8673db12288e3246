use super::core::{Effect, Event};
use crate::device_camera::interface::DeviceCamera;
use crate::error::PipelineError;
use crate::image_classifier::interface::{Classification, ImageClassifier};
use crate::image_file::decode::{decode_image, DecodedImage};
use crate::image_file::interface::ImageFiles;
use crate::library::logger::interface::Logger;
use std::sync::mpsc::Sender;
use std::sync::Arc;

#[derive(Clone)]
pub struct RunEffect {
    logger: Arc<dyn Logger + Send + Sync>,
    device_camera: Arc<dyn DeviceCamera + Send + Sync>,
    image_files: Arc<dyn ImageFiles + Send + Sync>,
    image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
}

impl RunEffect {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        device_camera: Arc<dyn DeviceCamera + Send + Sync>,
        image_files: Arc<dyn ImageFiles + Send + Sync>,
        image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
    ) -> Self {
        Self {
            logger: logger.with_namespace("effect"),
            device_camera,
            image_files,
            image_classifier,
        }
    }

    pub fn run_effect(&self, effect: Effect, event_sender: Sender<Event>) {
        let _ = self.logger.info(&format!("Running effect: {:?}", effect));

        match effect {
            Effect::SubscribeToPermission => {
                let events = self.device_camera.permission_events();
                for permission in events.iter() {
                    if event_sender
                        .send(Event::PermissionChanged(permission))
                        .is_err()
                    {
                        break;
                    }
                }
            }
            Effect::RequestPermission => {
                let result = self.device_camera.request_permission();
                self.log_failure(&result);
                let _ = event_sender.send(Event::PermissionRequestDone(result));
            }
            Effect::LoadModel => {
                let result = self.image_classifier.load();
                self.log_failure(&result);
                let _ = event_sender.send(Event::ModelLoadDone(result));
            }
            Effect::Capture { generation } => {
                let result = self.device_camera.capture();
                self.log_failure(&result);
                let _ = event_sender.send(Event::CaptureDone { generation, result });
            }
            Effect::Decode { generation, image } => {
                let result = self
                    .image_files
                    .read_bytes(&image)
                    .and_then(|bytes| decode_image(&bytes))
                    .map(Arc::new);
                self.log_failure(&result);
                let _ = event_sender.send(Event::DecodeDone { generation, result });
            }
            Effect::Classify {
                generation,
                decoded,
            } => {
                let result = self.classify(&decoded);
                self.log_failure(&result);
                let _ = event_sender.send(Event::ClassifyDone { generation, result });
            }
        }
    }

    fn classify(&self, decoded: &DecodedImage) -> Result<Vec<Classification>, PipelineError> {
        let predictions = self.image_classifier.classify(decoded)?;
        match predictions.first() {
            Some(top) => {
                let _ = self.logger.info(&format!(
                    "Top prediction: {} ({:.3})",
                    top.label, top.confidence
                ));
            }
            None => {
                let _ = self.logger.warn("Model returned no predictions");
            }
        }
        Ok(predictions)
    }

    fn log_failure<T>(&self, result: &Result<T, PipelineError>) {
        if let Err(error) = result {
            let _ = self
                .logger
                .error(&format!("{} failed: {}", error.stage(), error));
        }
    }
}
