use crate::error::PipelineError;
use crate::image_classifier::interface::{Classification, ImageClassifier};
use crate::image_file::decode::DecodedImage;
use crate::library::logger::interface::Logger;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tract_onnx::prelude::*;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

// ImageNet statistics used by the MobileNet family.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, PartialEq)]
pub struct TractModelConfig {
    pub onnx_model_path: PathBuf,
    pub labels_path: PathBuf,
    /// (height, width)
    pub input_shape: (u32, u32),
}

struct LoadedModel {
    plan: Plan,
    labels: Vec<String>,
}

/// ONNX image classifier (e.g. MobileNetV2) run with tract. The model is
/// parsed and optimized on the first `load` and shared afterwards.
pub struct ImageClassifierTract {
    logger: Arc<dyn Logger + Send + Sync>,
    config: TractModelConfig,
    top_k: usize,
    model: Mutex<Option<Arc<LoadedModel>>>,
}

impl ImageClassifierTract {
    pub fn new(
        logger: Arc<dyn Logger + Send + Sync>,
        config: TractModelConfig,
        top_k: usize,
    ) -> Self {
        Self {
            logger: logger
                .with_namespace("image_classifier")
                .with_namespace("tract"),
            config,
            top_k: top_k.max(1),
            model: Mutex::new(None),
        }
    }

    fn loaded(&self) -> Option<Arc<LoadedModel>> {
        self.model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn preprocess(&self, image: &DynamicImage) -> Tensor {
        let (height, width) = self.config.input_shape;
        let resized = image.resize_exact(width, height, image::imageops::FilterType::Triangle);
        let rgb = resized.to_rgb8();

        tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width as usize),
            |(_, c, y, x)| {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c]
            },
        )
        .into_tensor()
    }
}

fn load_plan(path: &Path, (height, width): (u32, u32)) -> TractResult<Plan> {
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(
            0,
            f32::fact([1, 3, height as usize, width as usize]).into(),
        )?
        .into_optimized()?
        .into_runnable()
}

/// One label per line. Blank lines are skipped.
pub fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Softmax over raw logits. Scores that already form a distribution are
/// returned unchanged. NaN or infinite scores are an inference error.
pub fn to_probabilities(scores: &[f32]) -> Result<Vec<f32>, PipelineError> {
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(PipelineError::Inference(format!(
            "non-finite score {} at output {}",
            scores[index], index
        )));
    }

    let sum: f32 = scores.iter().sum();
    let is_distribution =
        scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    if is_distribution {
        return Ok(scores.to_vec());
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    Ok(exps.into_iter().map(|e| e / total).collect())
}

/// Highest `k` scores as labelled classifications, best first. Models with a
/// leading background class (1001 outputs for 1000 labels) are realigned.
pub fn top_k(probabilities: &[f32], labels: &[String], k: usize) -> Vec<Classification> {
    let offset = if probabilities.len() == labels.len() + 1 {
        1
    } else {
        0
    };

    let mut ranked: Vec<(usize, f32)> = probabilities
        .iter()
        .copied()
        .enumerate()
        .skip(offset)
        .map(|(i, p)| (i - offset, p))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);

    ranked
        .into_iter()
        .map(|(index, confidence)| Classification {
            label: labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("class {}", index)),
            confidence,
        })
        .collect()
}

impl ImageClassifier for ImageClassifierTract {
    fn load(&self) -> Result<(), PipelineError> {
        let mut model = self
            .model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if model.is_some() {
            return Ok(());
        }

        let _ = self.logger.info(&format!(
            "Loading {}...",
            self.config.onnx_model_path.display()
        ));

        let labels_text = std::fs::read_to_string(&self.config.labels_path).map_err(|e| {
            PipelineError::ModelLoad(format!("{}: {}", self.config.labels_path.display(), e))
        })?;
        let labels = parse_labels(&labels_text);

        let plan = load_plan(&self.config.onnx_model_path, self.config.input_shape)
            .map_err(|e| PipelineError::ModelLoad(e.to_string()))?;

        let _ = self
            .logger
            .info(&format!("Model loaded with {} labels", labels.len()));
        *model = Some(Arc::new(LoadedModel { plan, labels }));
        Ok(())
    }

    fn classify(&self, image: &DecodedImage) -> Result<Vec<Classification>, PipelineError> {
        let model = self
            .loaded()
            .ok_or_else(|| PipelineError::Inference("model not loaded".to_string()))?;

        let input = self.preprocess(&image.image);
        let outputs = model
            .plan
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| PipelineError::Inference(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| PipelineError::Inference("model produced no output".to_string()))?;
        let scores: Vec<f32> = output
            .to_array_view::<f32>()
            .map_err(|e| PipelineError::Inference(e.to_string()))?
            .iter()
            .copied()
            .collect();

        Ok(top_k(&to_probabilities(&scores)?, &model.labels, self.top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::logger::impl_memory::LoggerMemory;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_parse_labels_skips_blank_lines() {
        assert_eq!(
            parse_labels("tench\n\n  goldfish \ntabby cat\n"),
            labels(&["tench", "goldfish", "tabby cat"])
        );
    }

    #[test]
    fn test_softmax_of_logits_sums_to_one() {
        let probabilities = to_probabilities(&[2.0, 1.0, 0.1]).unwrap();

        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probabilities[0] > probabilities[1] && probabilities[1] > probabilities[2]);
    }

    #[test]
    fn test_existing_distribution_is_kept() {
        assert_eq!(to_probabilities(&[0.25, 0.75]).unwrap(), vec![0.25, 0.75]);
    }

    #[test]
    fn test_non_finite_scores_are_inference_errors() {
        assert!(matches!(
            to_probabilities(&[f32::INFINITY, 1.0, 0.0]),
            Err(PipelineError::Inference(_))
        ));
        assert!(matches!(
            to_probabilities(&[0.2, f32::NAN, 0.8]),
            Err(PipelineError::Inference(_))
        ));
    }

    #[test]
    fn test_top_k_orders_and_truncates() {
        let result = top_k(
            &[0.1, 0.6, 0.3],
            &labels(&["tench", "tabby cat", "goldfish"]),
            2,
        );

        assert_eq!(
            result,
            vec![
                Classification {
                    label: "tabby cat".to_string(),
                    confidence: 0.6
                },
                Classification {
                    label: "goldfish".to_string(),
                    confidence: 0.3
                },
            ]
        );
    }

    #[test]
    fn test_top_k_skips_background_class() {
        let result = top_k(&[0.7, 0.1, 0.2], &labels(&["tench", "goldfish"]), 1);

        assert_eq!(result[0].label, "goldfish");
    }

    #[test]
    fn test_missing_labels_file_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = ImageClassifierTract::new(
            Arc::new(LoggerMemory::new()),
            TractModelConfig {
                onnx_model_path: dir.path().join("mobilenetv2-7.onnx"),
                labels_path: dir.path().join("labels.txt"),
                input_shape: (224, 224),
            },
            5,
        );

        assert!(matches!(classifier.load(), Err(PipelineError::ModelLoad(_))));
    }
}
