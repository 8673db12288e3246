use crate::error::PipelineError;
use crate::image_classifier::interface::{Classification, ImageClassifier};
use crate::image_file::decode::DecodedImage;
use crate::library::logger::interface::Logger;
use rand::distr::{Distribution, Uniform};
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const LABELS: [&str; 18] = [
    "tabby cat",
    "golden retriever",
    "espresso",
    "laptop",
    "coffee mug",
    "mountain bike",
    "park bench",
    "daisy",
    "sports car",
    "teddy bear",
    "acoustic guitar",
    "banana",
    "desk lamp",
    "backpack",
    "water bottle",
    "computer keyboard",
    "potted plant",
    "wall clock",
];

const LOAD_DELAY: Duration = Duration::from_millis(500);

/// Classifier that guesses random labels. Loading takes a moment and builds
/// exactly one model instance no matter how often it is requested.
pub struct ImageClassifierFake {
    logger: Arc<dyn Logger + Send + Sync>,
    top_k: usize,
    loaded: Mutex<bool>,
    instances: AtomicUsize,
}

impl ImageClassifierFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>, top_k: usize) -> Self {
        Self {
            logger: logger.with_namespace("image_classifier").with_namespace("fake"),
            top_k: top_k.clamp(1, LABELS.len()),
            loaded: Mutex::new(false),
            instances: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn instances(&self) -> usize {
        self.instances.load(Ordering::SeqCst)
    }

    fn is_loaded(&self) -> bool {
        *self.loaded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ImageClassifier for ImageClassifierFake {
    fn load(&self) -> Result<(), PipelineError> {
        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *loaded {
            return Ok(());
        }

        let _ = self.logger.info("Loading model...");
        std::thread::sleep(LOAD_DELAY);
        self.instances.fetch_add(1, Ordering::SeqCst);
        *loaded = true;
        let _ = self.logger.info("Model loaded");
        Ok(())
    }

    fn classify(&self, image: &DecodedImage) -> Result<Vec<Classification>, PipelineError> {
        if !self.is_loaded() {
            return Err(PipelineError::Inference("model not loaded".to_string()));
        }

        let _ = self
            .logger
            .info(&format!("Classifying {:?} with fake classifier...", image));

        let mut rng = rand::rng();
        let confidence_dist =
            Uniform::new(0.0f32, 1.0).map_err(|e| PipelineError::Inference(e.to_string()))?;

        let mut labels = LABELS.to_vec();
        labels.shuffle(&mut rng);

        let mut scores: Vec<f32> = (0..self.top_k)
            .map(|_| confidence_dist.sample(&mut rng))
            .collect();
        let total: f32 = scores.iter().sum::<f32>().max(1.0);
        scores.iter_mut().for_each(|s| *s /= total);
        scores.sort_by(|a, b| b.total_cmp(a));

        Ok(labels
            .into_iter()
            .zip(scores)
            .map(|(label, confidence)| Classification {
                label: label.to_string(),
                confidence,
            })
            .collect())
    }
}
