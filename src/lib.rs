//! ML Inference Service Library
//!
//! Serves a single pre-trained ONNX classifier over HTTP with readiness
//! gating and Prometheus metrics.

pub mod config;
pub mod error;
pub mod health;
pub mod inference;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;
pub mod validator;

pub use config::AppConfig;
pub use error::{ServiceError, ValidationError};
pub use health::HealthReporter;
pub use inference::{InferenceHandler, PredictionResult};
pub use metrics::MetricsRegistry;
pub use models::{ArtifactLoader, Classification, Classifier, ModelHolder, Probabilities};
pub use server::{router, AppState};
pub use types::{FeatureVector, PredictionRequest, PredictionResponse};
pub use validator::RequestValidator;
