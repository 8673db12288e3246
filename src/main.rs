use capture_classifier::main::CaptureClassifier;
use capture_classifier::render::ViewModel;
use config::{CameraConfig, ClassifierConfig, Config, DisplayConfig};
use device_camera::{
    impl_directory::DeviceCameraDirectory, impl_fake::DeviceCameraFake, interface::DeviceCamera,
};
use display::{
    impl_console::{spawn_command_reader, DisplayConsole},
    impl_gui::{CaptureWindow, DisplayGui},
    interface::Display,
};
use image_classifier::{
    impl_fake::ImageClassifierFake,
    impl_tract::{ImageClassifierTract, TractModelConfig},
    interface::ImageClassifier,
};
use image_file::impl_fs::ImageFilesFs;
use library::logger::{impl_console::LoggerConsole, interface::Logger};
use std::sync::{Arc, Mutex};

mod capture_classifier;
mod config;
mod device_camera;
mod display;
mod error;
mod image_classifier;
mod image_file;
mod library;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env();

    let logger: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerConsole::new(config.logger_timezone));

    let device_camera: Arc<dyn DeviceCamera + Send + Sync> = match &config.camera {
        CameraConfig::Fake { capture_dir } => Arc::new(DeviceCameraFake::new(
            logger.clone(),
            capture_dir.clone(),
        )),
        CameraConfig::Directory { photo_dir } => Arc::new(DeviceCameraDirectory::new(
            logger.clone(),
            photo_dir.clone(),
        )),
    };

    let image_classifier: Arc<dyn ImageClassifier + Send + Sync> = match &config.classifier {
        ClassifierConfig::Fake => Arc::new(ImageClassifierFake::new(logger.clone(), config.top_k)),
        ClassifierConfig::TractOnnx {
            onnx_model_path,
            labels_path,
            input_shape,
        } => Arc::new(ImageClassifierTract::new(
            logger.clone(),
            TractModelConfig {
                onnx_model_path: onnx_model_path.clone(),
                labels_path: labels_path.clone(),
                input_shape: *input_shape,
            },
            config.top_k,
        )),
    };

    let _ = logger.info(&format!("Starting with {:?}", config));

    match config.display {
        DisplayConfig::Gui => {
            let view = Arc::new(Mutex::new(ViewModel::default()));
            let display: Arc<dyn Display + Send + Sync> = Arc::new(DisplayGui::new(view.clone()));

            let machine = CaptureClassifier::new(
                logger.clone(),
                device_camera,
                Arc::new(ImageFilesFs),
                image_classifier,
                display,
            )
            .into_state_machine();
            let event_sender = machine.sender();

            let machine_logger = logger.clone();
            std::thread::spawn(move || {
                if let Err(e) = machine.run() {
                    let _ = machine_logger.error(&format!("Pipeline stopped: {}", e));
                }
            });

            CaptureWindow::new(view, event_sender, logger, config.thumbnail_size).run()
        }
        DisplayConfig::Console => {
            let display: Arc<dyn Display + Send + Sync> = Arc::new(DisplayConsole::new());

            let machine = CaptureClassifier::new(
                logger,
                device_camera,
                Arc::new(ImageFilesFs),
                image_classifier,
                display,
            )
            .into_state_machine();

            spawn_command_reader(machine.sender());

            machine.run()
        }
    }
}
