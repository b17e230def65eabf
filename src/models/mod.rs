//! ML model components

pub mod classifier;
pub mod holder;
pub mod loader;
pub mod onnx;

pub use classifier::{ArtifactLoader, Classification, Classifier, Probabilities};
pub use holder::ModelHolder;
pub use loader::ModelLoader;
pub use onnx::OnnxClassifier;
