//! Shared fixtures for HTTP-level tests

use anyhow::Result;
use inference_service::{
    ArtifactLoader, AppState, Classifier, FeatureVector, MetricsRegistry, ModelHolder,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Iris-like stub: setosa for short petals, versicolor otherwise.
pub struct StubClassifier {
    probabilities: bool,
    calls: Arc<AtomicUsize>,
}

impl StubClassifier {
    fn distribution(features: &FeatureVector) -> Vec<f64> {
        if features.values()[2] < 2.5 {
            vec![0.96, 0.03, 0.01]
        } else {
            vec![0.02, 0.81, 0.17]
        }
    }
}

impl Classifier for StubClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let distribution = Self::distribution(features);
        let label = distribution
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i as i64)
            .unwrap_or(0);
        Ok(label)
    }

    fn supports_probability(&self) -> bool {
        self.probabilities
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::distribution(features))
    }
}

pub struct StubLoader {
    pub probabilities: bool,
    pub calls: Arc<AtomicUsize>,
}

impl StubLoader {
    pub fn new(probabilities: bool) -> Self {
        Self {
            probabilities,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn model_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArtifactLoader for StubLoader {
    fn load(&self, _path: &Path) -> Result<Box<dyn Classifier>> {
        Ok(Box::new(StubClassifier {
            probabilities: self.probabilities,
            calls: self.calls.clone(),
        }))
    }
}

/// App state with a loaded stub model.
pub fn loaded_state(loader: &StubLoader) -> AppState {
    let mut holder = ModelHolder::new("1.0.0");
    holder.load_with(loader, "iris.onnx").unwrap();
    AppState::new(holder, Arc::new(MetricsRegistry::new().unwrap()))
}

/// App state whose model failed to load.
pub fn unloaded_state() -> AppState {
    let mut holder = ModelHolder::new("1.0.0");
    assert!(holder.load("does/not/exist.onnx").is_err());
    AppState::new(holder, Arc::new(MetricsRegistry::new().unwrap()))
}
