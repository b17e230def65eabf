//! Feature vector fed to the classifier

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 4;

/// A validated, fixed-size feature vector.
///
/// Only [`crate::validator::RequestValidator`] builds these from client
/// input, so every value is finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub(crate) fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Single-precision copy for runtimes that take `f32` input tensors.
    pub fn to_f32(&self) -> Vec<f32> {
        self.0.iter().map(|&v| v as f32).collect()
    }
}
