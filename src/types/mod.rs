//! Type definitions for the inference service

pub mod features;
pub mod request;
pub mod response;

pub use features::{FeatureVector, FEATURE_COUNT};
pub use request::PredictionRequest;
pub use response::{HealthResponse, PredictionResponse, ServiceDescriptor};
