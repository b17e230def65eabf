//! Owner of the single model served by the process

use crate::error::ServiceError;
use crate::models::classifier::{ArtifactLoader, Classification, Classifier, Probabilities};
use crate::models::loader::ModelLoader;
use crate::types::features::FeatureVector;
use std::path::Path;
use tracing::{error, info};

/// Holds the loaded classifier and its version tag.
///
/// `load` takes `&mut self`, so the holder is fully initialised before it is
/// wrapped in an `Arc` and shared with handlers. After that it is read-only.
pub struct ModelHolder {
    model: Option<Box<dyn Classifier>>,
    version: String,
    onnx_threads: usize,
}

impl ModelHolder {
    /// Create an unloaded holder that will report `version` once loaded.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            model: None,
            version: version.into(),
            onnx_threads: 1,
        }
    }

    /// Set the ONNX Runtime intra-op thread count used by [`ModelHolder::load`].
    pub fn with_onnx_threads(mut self, onnx_threads: usize) -> Self {
        self.onnx_threads = onnx_threads.max(1);
        self
    }

    /// Load an ONNX artifact from `path`.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ServiceError> {
        let path = path.as_ref();
        let loader = ModelLoader::with_threads(self.onnx_threads).map_err(|source| {
            ServiceError::Load {
                path: path.display().to_string(),
                source,
            }
        })?;
        self.load_with(&loader, path)
    }

    /// Load an artifact through a custom loader.
    ///
    /// On failure the holder keeps its previous state.
    pub fn load_with<L, P>(&mut self, loader: &L, path: P) -> Result<(), ServiceError>
    where
        L: ArtifactLoader + ?Sized,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        match loader.load(path) {
            Ok(model) => {
                info!(
                    version = %self.version,
                    path = %path.display(),
                    probabilities = model.supports_probability(),
                    "Model loaded"
                );
                self.model = Some(model);
                Ok(())
            }
            Err(source) => {
                error!(path = %path.display(), error = %source, "Failed to load model");
                Err(ServiceError::Load {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn model(&self) -> Result<&dyn Classifier, ServiceError> {
        self.model.as_deref().ok_or(ServiceError::NotLoaded)
    }

    /// Predict the class label for one feature vector.
    pub fn predict(&self, features: &FeatureVector) -> Result<i64, ServiceError> {
        self.model()?
            .predict(features)
            .map_err(ServiceError::Inference)
    }

    /// Per-class probabilities, or `Unsupported` when the model has none.
    pub fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<Probabilities, ServiceError> {
        let model = self.model()?;
        if !model.supports_probability() {
            return Ok(Probabilities::Unsupported);
        }
        model
            .predict_proba(features)
            .map(Probabilities::Supported)
            .map_err(ServiceError::Inference)
    }

    /// Label plus probabilities (or `Unsupported`) in one model pass.
    pub fn classify(&self, features: &FeatureVector) -> Result<Classification, ServiceError> {
        self.model()?
            .classify(features)
            .map_err(ServiceError::Inference)
    }
}
