//! Classifier abstraction over a loaded model artifact

use crate::types::features::FeatureVector;
use anyhow::Result;
use std::path::Path;

/// Outcome of a probability request.
///
/// `Unsupported` is an expected branch, not a failure: models without a
/// probability output still serve label predictions.
#[derive(Debug, Clone, PartialEq)]
pub enum Probabilities {
    /// Per-class probabilities ordered by class label
    Supported(Vec<f64>),
    Unsupported,
}

impl Probabilities {
    /// Confidence for a prediction: the largest class probability, clamped
    /// to [0, 1]. Models without probabilities report a fixed 1.0.
    pub fn confidence(&self) -> f64 {
        match self {
            Probabilities::Supported(distribution) => distribution
                .iter()
                .copied()
                .filter(|p| p.is_finite())
                .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.max(p))))
                .map(|p| p.clamp(0.0, 1.0))
                .unwrap_or(1.0),
            Probabilities::Unsupported => 1.0,
        }
    }
}

/// Label and class probabilities from one scoring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: i64,
    pub probabilities: Probabilities,
}

/// A trained model able to score one feature vector at a time.
pub trait Classifier: Send + Sync {
    /// Predict the class label for a single feature vector.
    fn predict(&self, features: &FeatureVector) -> Result<i64>;

    /// Whether [`Classifier::predict_proba`] is backed by the model.
    fn supports_probability(&self) -> bool {
        false
    }

    /// Per-class probabilities for a single feature vector, ordered by class.
    ///
    /// Only called when [`Classifier::supports_probability`] is true.
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>> {
        anyhow::bail!("model does not expose class probabilities")
    }

    /// Label and probabilities together. Backends that produce both from a
    /// single run should override this.
    fn classify(&self, features: &FeatureVector) -> Result<Classification> {
        let label = self.predict(features)?;
        let probabilities = if self.supports_probability() {
            Probabilities::Supported(self.predict_proba(features)?)
        } else {
            Probabilities::Unsupported
        };
        Ok(Classification {
            label,
            probabilities,
        })
    }
}

/// Reads a model artifact from disk.
pub trait ArtifactLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>>;
}
