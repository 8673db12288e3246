use chrono::Offset;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierConfig {
    Fake,
    TractOnnx {
        onnx_model_path: PathBuf,
        labels_path: PathBuf,
        input_shape: (u32, u32),
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraConfig {
    Fake { capture_dir: PathBuf },
    Directory { photo_dir: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayConfig {
    Gui,
    Console,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub logger_timezone: chrono::FixedOffset,
    pub classifier: ClassifierConfig,
    pub camera: CameraConfig,
    pub display: DisplayConfig,
    pub top_k: usize,
    pub thumbnail_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logger_timezone: utc(),
            classifier: ClassifierConfig::Fake,
            camera: CameraConfig::Fake {
                capture_dir: std::env::temp_dir().join("capture-classifier"),
            },
            display: DisplayConfig::Gui,
            top_k: 5,
            thumbnail_size: 100,
        }
    }
}

impl Config {
    /// Defaults with `CAPTURE_CLASSIFIER_*` overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(display) = var("CAPTURE_CLASSIFIER_DISPLAY") {
            if display.eq_ignore_ascii_case("console") {
                self.display = DisplayConfig::Console;
            }
        }

        if let Some(photo_dir) = var("CAPTURE_CLASSIFIER_PHOTO_DIR") {
            self.camera = CameraConfig::Directory {
                photo_dir: PathBuf::from(photo_dir),
            };
        }

        if let Some(model_path) = var("CAPTURE_CLASSIFIER_MODEL_PATH") {
            let model_path = PathBuf::from(model_path);
            let labels_path = var("CAPTURE_CLASSIFIER_LABELS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| model_path.with_extension("labels.txt"));
            self.classifier = ClassifierConfig::TractOnnx {
                onnx_model_path: model_path,
                labels_path,
                input_shape: (224, 224),
            };
        }

        self
    }
}

fn utc() -> chrono::FixedOffset {
    chrono::Utc.fix()
}
